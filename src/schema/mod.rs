//! Type metadata for entity types
//!
//! Relations are declared once per entity type at registration time and
//! stored in plain maps, so every later lookup is a map read rather than
//! runtime introspection. The registry is the single source of truth the
//! relation resolver consults; it is immutable after startup.

use crate::core::entity::Entity;
use crate::core::field::FieldValue;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::Arc;

/// Relation categories.
///
/// `DECLARED` lists the categories a type can declare, in resolution
/// priority order: to-one kinds before to-many kinds, morph kinds last.
/// The tree kinds are synthetic only — they come from the nested-tree flag,
/// never from declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    AttachOne,
    BelongsToMany,
    HasMany,
    AttachMany,
    MorphTo,
    MorphOne,
    MorphMany,
    TreeParent,
    TreeChildren,
}

impl RelationKind {
    /// Declarable categories in resolution priority order
    pub const DECLARED: [RelationKind; 9] = [
        RelationKind::BelongsTo,
        RelationKind::HasOne,
        RelationKind::AttachOne,
        RelationKind::BelongsToMany,
        RelationKind::HasMany,
        RelationKind::AttachMany,
        RelationKind::MorphTo,
        RelationKind::MorphOne,
        RelationKind::MorphMany,
    ];

    /// Whether the relation points at a single record
    pub fn is_singular(self) -> bool {
        matches!(
            self,
            RelationKind::BelongsTo
                | RelationKind::HasOne
                | RelationKind::AttachOne
                | RelationKind::MorphTo
                | RelationKind::MorphOne
                | RelationKind::TreeParent
        )
    }

    /// Whether the related type is determined per instance
    pub fn is_polymorphic(self) -> bool {
        matches!(
            self,
            RelationKind::MorphTo | RelationKind::MorphOne | RelationKind::MorphMany
        )
    }

    /// Morph relations contained by the owning type (the identity side of a
    /// polymorphic pair)
    pub fn is_morph_contain(self) -> bool {
        matches!(self, RelationKind::MorphOne | RelationKind::MorphMany)
    }
}

/// A relation as declared at type-registration time
#[derive(Debug, Clone, Default)]
pub struct RelationDefinition {
    /// Fully-qualified related type. None for MorphTo, where the concrete
    /// type is read from the instance's `{field}_type` attribute.
    pub related_type: Option<String>,

    /// Foreign key column, when it differs from the convention
    pub foreign_key: Option<String>,

    /// Render the precomputed count instead of expanding
    pub count: bool,

    /// Junction-record fields exposed through the `pivot` pseudo-field
    pub pivot_fields: Option<Vec<String>>,

    /// Explicit junction table name
    pub join_table: Option<String>,

    /// Identity name shared by the two sides of a morph pair
    pub morph_name: Option<String>,
}

impl RelationDefinition {
    /// A relation to a concrete type
    pub fn to(related_type: impl Into<String>) -> Self {
        Self {
            related_type: Some(related_type.into()),
            ..Self::default()
        }
    }

    /// A polymorphic relation with no static related type
    pub fn morph() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    pub fn counted(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn with_pivot<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pivot_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.join_table = Some(table.into());
        self
    }

    pub fn named(mut self, morph_name: impl Into<String>) -> Self {
        self.morph_name = Some(morph_name.into());
        self
    }
}

/// A computed accessor: a virtual attribute derived from the entity
pub type Accessor = Arc<dyn Fn(&Entity) -> FieldValue + Send + Sync>;

/// Declared metadata for one entity type
#[derive(Clone)]
pub struct EntityType {
    name: String,
    attributes: IndexSet<String>,
    accessors: HashMap<String, Accessor>,
    relations: HashMap<RelationKind, IndexMap<String, RelationDefinition>>,
    user_stamp_fields: Vec<String>,
    nested_tree: bool,
}

impl EntityType {
    /// Start declaring a type by its fully-qualified name
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder {
            inner: EntityType {
                name: name.into(),
                attributes: IndexSet::new(),
                accessors: HashMap::new(),
                relations: HashMap::new(),
                user_stamp_fields: Vec::new(),
                nested_tree: false,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_attribute(&self, field: &str) -> bool {
        self.attributes.contains(field)
    }

    pub fn has_accessor(&self, field: &str) -> bool {
        self.accessors.contains_key(field)
    }

    pub fn accessor(&self, field: &str) -> Option<&Accessor> {
        self.accessors.get(field)
    }

    /// Declared relations of one category, in declaration order
    pub fn relations(&self, kind: RelationKind) -> Option<&IndexMap<String, RelationDefinition>> {
        self.relations.get(&kind)
    }

    /// Relation names exposed as synthetic BelongsTo audit relations
    pub fn user_stamp_fields(&self) -> &[String] {
        &self.user_stamp_fields
    }

    pub fn tracks_user_stamps(&self) -> bool {
        !self.user_stamp_fields.is_empty()
    }

    /// Whether the type is a hierarchical self-reference
    pub fn is_nested_tree(&self) -> bool {
        self.nested_tree
    }
}

/// Builder for [`EntityType`], used at registration time
pub struct EntityTypeBuilder {
    inner: EntityType,
}

impl EntityTypeBuilder {
    /// Declare a persisted attribute (stored snake_case)
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.inner.attributes.insert(name.into());
        self
    }

    /// Declare several persisted attributes at once
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.inner.attributes.insert(name.into());
        }
        self
    }

    /// Declare a computed accessor (a virtual attribute)
    pub fn accessor<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Entity) -> FieldValue + Send + Sync + 'static,
    {
        self.inner.accessors.insert(name.into(), Arc::new(f));
        self
    }

    /// Declare a relation under one of the declarable categories
    pub fn relation(
        mut self,
        kind: RelationKind,
        field: impl Into<String>,
        definition: RelationDefinition,
    ) -> Self {
        self.inner
            .relations
            .entry(kind)
            .or_default()
            .insert(field.into(), definition);
        self
    }

    /// Expose synthetic BelongsTo relations for audit-user fields
    /// (e.g. `createdUser`, `updatedUser`, `deletedUser`)
    pub fn user_stamps<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.user_stamp_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the type as a hierarchical self-reference, exposing synthetic
    /// `children` and `parent` relations
    pub fn nested_tree(mut self) -> Self {
        self.inner.nested_tree = true;
        self
    }

    pub fn build(self) -> EntityType {
        self.inner
    }
}

/// Registry of declared entity types: the metadata provider consulted by
/// the relation resolver.
///
/// Built once at startup; all queries are resolvable from type-level
/// metadata alone, no instance required.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, Arc<EntityType>>,
    user_type: Option<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The type targeted by synthetic audit-user relations
    pub fn with_user_type(mut self, type_name: impl Into<String>) -> Self {
        self.user_type = Some(type_name.into());
        self
    }

    /// Register a declared type
    pub fn register(&mut self, entity_type: EntityType) {
        self.types
            .insert(entity_type.name().to_string(), Arc::new(entity_type));
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<EntityType>> {
        self.types.get(type_name)
    }

    /// Declared relations of one category for a type
    pub fn declared_relations(
        &self,
        type_name: &str,
        kind: RelationKind,
    ) -> Option<&IndexMap<String, RelationDefinition>> {
        self.types.get(type_name).and_then(|t| t.relations(kind))
    }

    pub fn has_attribute(&self, type_name: &str, field: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|t| t.has_attribute(field))
    }

    pub fn has_computed_accessor(&self, type_name: &str, field: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|t| t.has_accessor(field))
    }

    pub fn accessor(&self, type_name: &str, field: &str) -> Option<Accessor> {
        self.types
            .get(type_name)
            .and_then(|t| t.accessor(field))
            .cloned()
    }

    pub fn user_type(&self) -> Option<&str> {
        self.user_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> SchemaRegistry {
        let mut schema = SchemaRegistry::new().with_user_type("users::models::User");
        schema.register(
            EntityType::builder("shop::models::Order")
                .attributes(["number", "total", "created_at"])
                .accessor("display_number", |e| {
                    let number = e.attribute("number").and_then(|v| v.as_str()).unwrap_or("");
                    FieldValue::String(format!("#{number}"))
                })
                .relation(
                    RelationKind::BelongsTo,
                    "customer",
                    RelationDefinition::to("crm::models::Customer"),
                )
                .relation(
                    RelationKind::HasMany,
                    "items",
                    RelationDefinition::to("shop::models::OrderItem"),
                )
                .build(),
        );
        schema
    }

    #[test]
    fn test_declared_relations_by_kind() {
        let schema = sample_schema();

        let belongs_to = schema
            .declared_relations("shop::models::Order", RelationKind::BelongsTo)
            .unwrap();
        assert!(belongs_to.contains_key("customer"));

        assert!(
            schema
                .declared_relations("shop::models::Order", RelationKind::MorphTo)
                .is_none()
        );
    }

    #[test]
    fn test_attribute_and_accessor_introspection() {
        let schema = sample_schema();

        assert!(schema.has_attribute("shop::models::Order", "number"));
        assert!(!schema.has_attribute("shop::models::Order", "nope"));
        assert!(schema.has_computed_accessor("shop::models::Order", "display_number"));
        assert!(!schema.has_computed_accessor("shop::models::Order", "number"));
    }

    #[test]
    fn test_accessor_computes_from_entity() {
        let schema = sample_schema();
        let entity = Entity::new("shop::models::Order", uuid::Uuid::new_v4())
            .with_attribute("number", "A-7");

        let accessor = schema.accessor("shop::models::Order", "display_number").unwrap();
        assert_eq!(accessor.as_ref()(&entity), FieldValue::String("#A-7".to_string()));
    }

    #[test]
    fn test_kind_classification() {
        assert!(RelationKind::BelongsTo.is_singular());
        assert!(!RelationKind::HasMany.is_singular());
        assert!(RelationKind::MorphTo.is_polymorphic());
        assert!(RelationKind::MorphMany.is_morph_contain());
        assert!(!RelationKind::MorphTo.is_morph_contain());
    }

    #[test]
    fn test_unknown_type_queries_are_negative() {
        let schema = sample_schema();
        assert!(schema.get("nope::models::Missing").is_none());
        assert!(!schema.has_attribute("nope::models::Missing", "id"));
    }
}
