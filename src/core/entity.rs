//! Entities and the graph provider boundary
//!
//! The engine never owns entities: they are loaded by an external store and
//! handed in fully materialized. An [`Entity`] is a dynamic record — a
//! fully-qualified type name, a primary key, and an ordered attribute map.
//! Related records are reached through the [`EntityGraph`] collaborator.

use crate::core::field::FieldValue;
use indexmap::IndexMap;
use uuid::Uuid;

/// One instance of a domain type.
///
/// Identity is `(type_name, key)`. Attribute names are stored snake_case,
/// matching the persisted column names; callers asking with a camelCase
/// spelling are expected to snake-case first.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    type_name: String,
    key: Uuid,
    attributes: IndexMap<String, FieldValue>,
    pivot: Option<IndexMap<String, FieldValue>>,
}

impl Entity {
    /// Create an entity of the given fully-qualified type
    /// (e.g. `"shop::models::Order"`)
    pub fn new(type_name: impl Into<String>, key: Uuid) -> Self {
        Self {
            type_name: type_name.into(),
            key,
            attributes: IndexMap::new(),
            pivot: None,
        }
    }

    /// Add an attribute, builder style
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Attach the junction record this entity was materialized through.
    ///
    /// Set by the graph provider when loading the children of a
    /// many-to-many relation; absent everywhere else.
    pub fn with_pivot(mut self, pivot: IndexMap<String, FieldValue>) -> Self {
        self.pivot = Some(pivot);
        self
    }

    /// Fully-qualified type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Primary key
    pub fn key(&self) -> Uuid {
        self.key
    }

    /// Look up an attribute by its stored (snake_case) name
    pub fn attribute(&self, name: &str) -> Option<&FieldValue> {
        self.attributes.get(name)
    }

    /// All attributes in insertion order
    pub fn attributes(&self) -> &IndexMap<String, FieldValue> {
        &self.attributes
    }

    /// The junction record, when this entity came out of a many-to-many
    /// relation
    pub fn pivot(&self) -> Option<&IndexMap<String, FieldValue>> {
        self.pivot.as_ref()
    }
}

/// The loaded value of a relation field
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    /// A to-one relation: present or null
    One(Option<Entity>),
    /// A to-many relation: ordered related records
    Many(Vec<Entity>),
}

impl RelationValue {
    /// Whether there is nothing to expand (a null to-one value).
    ///
    /// An empty to-many collection is not absent; it renders as an empty
    /// array.
    pub fn is_absent(&self) -> bool {
        matches!(self, RelationValue::One(None))
    }
}

/// Boundary to the external entity store.
///
/// Given an entity and a relation field name, returns the related record or
/// records. The call may block on storage; the engine issues these loads
/// one at a time during traversal and imposes no batching or ordering of
/// its own.
///
/// Returning `None` means the relation value is absent (unloaded or null),
/// which the engine renders as an explicit null resource.
pub trait EntityGraph: Send + Sync {
    /// Fetch the loaded value of `field` for `entity`
    fn related(&self, entity: &Entity, field: &str) -> Option<RelationValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_identity_and_attributes() {
        let id = Uuid::new_v4();
        let entity = Entity::new("shop::models::Order", id)
            .with_attribute("number", "A-100")
            .with_attribute("total", 250i64);

        assert_eq!(entity.type_name(), "shop::models::Order");
        assert_eq!(entity.key(), id);
        assert_eq!(entity.attribute("number"), Some(&FieldValue::String("A-100".into())));
        assert_eq!(entity.attribute("missing"), None);
    }

    #[test]
    fn test_pivot_is_absent_by_default() {
        let entity = Entity::new("shop::models::Product", Uuid::new_v4());
        assert!(entity.pivot().is_none());
    }

    #[test]
    fn test_relation_value_absence() {
        assert!(RelationValue::One(None).is_absent());
        assert!(!RelationValue::Many(vec![]).is_absent());

        let related = Entity::new("shop::models::Product", Uuid::new_v4());
        assert!(!RelationValue::One(Some(related)).is_absent());
    }
}
