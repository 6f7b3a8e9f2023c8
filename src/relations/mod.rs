//! Relation resolution
//!
//! Determines, from type-level metadata alone, whether a field names a
//! relation, what kind it is, and what type it points at. Results are
//! memoized per `(type, field)` for the process lifetime; callers that
//! mutate the schema at runtime must call [`RelationResolver::invalidate`].

use crate::core::error::{ProjectionError, ProjectionResult};
use crate::core::scope::{TREE_CHILDREN, TREE_PARENT};
use crate::core::strcase::Caser;
use crate::schema::{RelationKind, SchemaRegistry};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Resolved view of one relation of one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDescriptor {
    pub kind: RelationKind,

    /// Fully-qualified related type. None for MorphTo, where the engine
    /// reads the concrete type from the instance's `{field}_type`
    /// attribute.
    pub related_type: Option<String>,

    pub is_singular: bool,
    pub is_polymorphic: bool,
    pub foreign_key: Option<String>,
    pub count: bool,
    pub pivot_fields: Option<Vec<String>>,
    pub join_table: Option<String>,
    pub morph_name: Option<String>,
}

/// Resolves relation fields against the schema registry
pub struct RelationResolver {
    schema: Arc<SchemaRegistry>,
    memo: RwLock<HashMap<(String, String), Option<RelationDescriptor>>>,
}

impl RelationResolver {
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self {
            schema,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve `field` on `type_name` to a descriptor, or None when the
    /// field is not a relation.
    ///
    /// Pure given a fixed schema: repeated calls return identical
    /// descriptors.
    pub fn relation_of(&self, type_name: &str, field: &str) -> Option<RelationDescriptor> {
        let key = (type_name.to_string(), field.to_string());

        if let Ok(memo) = self.memo.read() {
            if let Some(hit) = memo.get(&key) {
                return hit.clone();
            }
        }

        let descriptor = self.compute(type_name, field);

        if let Ok(mut memo) = self.memo.write() {
            memo.insert(key, descriptor.clone());
        }

        descriptor
    }

    /// Whether `field` names a relation on `type_name`
    pub fn has_relation(&self, type_name: &str, field: &str) -> bool {
        self.relation_of(type_name, field).is_some()
    }

    /// Whether the relation renders as a precomputed count
    pub fn is_count_relation(&self, type_name: &str, field: &str) -> ProjectionResult<bool> {
        Ok(self.require(type_name, field)?.count)
    }

    /// Whether the relation declares junction-record fields
    pub fn has_pivot_fields(&self, type_name: &str, field: &str) -> ProjectionResult<bool> {
        Ok(self.require(type_name, field)?.pivot_fields.is_some())
    }

    /// The declared junction-record field subset.
    ///
    /// Fails with [`ProjectionError::PivotNotDeclared`] when the relation
    /// exists but declares no pivot fields.
    pub fn pivot_fields_of(&self, type_name: &str, field: &str) -> ProjectionResult<Vec<String>> {
        let descriptor = self.require(type_name, field)?;

        descriptor
            .pivot_fields
            .ok_or_else(|| ProjectionError::PivotNotDeclared {
                entity_type: type_name.to_string(),
                relation: field.to_string(),
            })
    }

    /// The junction table backing the relation.
    ///
    /// Falls back to the deterministic default: snake-cased base names of
    /// both related types, sorted, joined with `_`.
    pub fn pivot_table_of(&self, type_name: &str, field: &str) -> ProjectionResult<String> {
        let descriptor = self.require(type_name, field)?;

        if let Some(table) = descriptor.join_table {
            return Ok(table);
        }

        let mut names = vec![Caser::snake(Caser::base_name(type_name))];
        if let Some(related) = &descriptor.related_type {
            names.push(Caser::snake(Caser::base_name(related)));
        }
        names.sort();

        Ok(names.join("_"))
    }

    /// Whether `identifier` names the identity of a declared morph-contain
    /// relation of `type_name`. Used to bypass strict-include validation
    /// inside a polymorphic expansion.
    pub fn morph_identity_matches(&self, type_name: &str, identifier: &str) -> bool {
        [RelationKind::MorphOne, RelationKind::MorphMany]
            .into_iter()
            .filter_map(|kind| self.schema.declared_relations(type_name, kind))
            .flat_map(|defs| defs.values())
            .any(|def| def.morph_name.as_deref() == Some(identifier))
    }

    /// Drop every memoized descriptor. For callers that change the schema
    /// after startup.
    pub fn invalidate(&self) {
        if let Ok(mut memo) = self.memo.write() {
            memo.clear();
        }
    }

    fn require(&self, type_name: &str, field: &str) -> ProjectionResult<RelationDescriptor> {
        self.relation_of(type_name, field)
            .ok_or_else(|| ProjectionError::RelationNotFound {
                entity_type: type_name.to_string(),
                field: field.to_string(),
            })
    }

    fn compute(&self, type_name: &str, field: &str) -> Option<RelationDescriptor> {
        let entity_type = self.schema.get(type_name)?;

        // Synthetic audit relations take precedence over declared metadata.
        if entity_type.tracks_user_stamps()
            && entity_type.user_stamp_fields().iter().any(|f| f == field)
        {
            return Some(RelationDescriptor {
                kind: RelationKind::BelongsTo,
                related_type: self.schema.user_type().map(str::to_string),
                is_singular: true,
                is_polymorphic: false,
                foreign_key: Some(format!("{}_id", Caser::snake(field))),
                count: false,
                pivot_fields: None,
                join_table: None,
                morph_name: None,
            });
        }

        if entity_type.is_nested_tree() {
            match field {
                TREE_CHILDREN => {
                    return Some(Self::tree_descriptor(
                        RelationKind::TreeChildren,
                        type_name,
                        Some("parent_id"),
                    ));
                }
                TREE_PARENT => {
                    return Some(Self::tree_descriptor(RelationKind::TreeParent, type_name, None));
                }
                _ => {}
            }
        }

        for kind in RelationKind::DECLARED {
            if let Some(definitions) = entity_type.relations(kind) {
                if let Some(definition) = definitions.get(field) {
                    return Some(RelationDescriptor {
                        kind,
                        related_type: definition.related_type.clone(),
                        is_singular: kind.is_singular(),
                        is_polymorphic: kind.is_polymorphic(),
                        foreign_key: definition.foreign_key.clone(),
                        count: definition.count,
                        pivot_fields: definition.pivot_fields.clone(),
                        join_table: definition.join_table.clone(),
                        morph_name: definition.morph_name.clone(),
                    });
                }
            }
        }

        None
    }

    fn tree_descriptor(
        kind: RelationKind,
        type_name: &str,
        foreign_key: Option<&str>,
    ) -> RelationDescriptor {
        RelationDescriptor {
            kind,
            related_type: Some(type_name.to_string()),
            is_singular: kind.is_singular(),
            is_polymorphic: false,
            foreign_key: foreign_key.map(str::to_string),
            count: false,
            pivot_fields: None,
            join_table: None,
            morph_name: None,
        }
    }
}
