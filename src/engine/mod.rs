//! The recursive projection core
//!
//! For a root entity and a directive set, produces the nested projected
//! value tree. Per-field decisions are delegated to the relation resolver
//! (is this field a relation, of what kind) and the projector resolver
//! (who renders the related type). The engine is read-only: it never
//! mutates the entity graph and has nothing to roll back on failure.

use crate::config::EngineConfig;
use crate::core::entity::{Entity, EntityGraph, RelationValue};
use crate::core::error::{ProjectionError, ProjectionResult};
use crate::core::field::FieldValue;
use crate::core::scope::{Scope, TREE_CHILDREN};
use crate::core::strcase::Caser;
use crate::directives::{split_params, DirectiveSet, NotationParser};
use crate::projector::{Projector, ProjectorRegistry, ProjectorResolver};
use crate::relations::RelationResolver;
use crate::schema::SchemaRegistry;
use indexmap::IndexSet;
use serde_json::Value;
use std::sync::Arc;

/// The junction pseudo-field exposing many-to-many extra columns
const PIVOT_FIELD: &str = "pivot";

/// The identifier field ignored by strict-include validation
const IDENTIFIER_FIELD: &str = "id";

/// The relation through which the current entity was reached. Needed for
/// pivot extraction, which is declared on the owning side.
struct Origin<'a> {
    parent_type: &'a str,
    relation: &'a str,
}

/// Recursive projection engine
pub struct ProjectionEngine {
    schema: Arc<SchemaRegistry>,
    relations: RelationResolver,
    projectors: ProjectorResolver,
    graph: Arc<dyn EntityGraph>,
    config: Arc<EngineConfig>,
}

impl ProjectionEngine {
    pub fn new(
        schema: Arc<SchemaRegistry>,
        registry: Arc<ProjectorRegistry>,
        graph: Arc<dyn EntityGraph>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            relations: RelationResolver::new(Arc::clone(&schema)),
            projectors: ProjectorResolver::new(registry, Arc::clone(&config)),
            schema,
            graph,
            config,
        }
    }

    /// The relation resolver, shared with callers that plan eager loads
    pub fn relations(&self) -> &RelationResolver {
        &self.relations
    }

    /// Project a single root entity
    pub fn project(
        &self,
        entity: &Entity,
        projector: &dyn Projector,
        directives: &DirectiveSet,
    ) -> ProjectionResult<Value> {
        let normalized = Self::normalize_at_root(directives);
        let directives = normalized.as_ref().unwrap_or(directives);

        self.project_entity(entity, projector, directives, &Scope::root(), None, None)
    }

    /// Project an ordered collection of root entities into an array
    pub fn project_collection(
        &self,
        entities: &[Entity],
        projector: &dyn Projector,
        directives: &DirectiveSet,
    ) -> ProjectionResult<Value> {
        let normalized = Self::normalize_at_root(directives);
        let directives = normalized.as_ref().unwrap_or(directives);

        let mut items = Vec::with_capacity(entities.len());
        for entity in entities {
            items.push(self.project_entity(
                entity,
                projector,
                directives,
                &Scope::root(),
                None,
                None,
            )?);
        }

        Ok(Value::Array(items))
    }

    /// Safety net for callers that bypass the input pipeline: if bracket
    /// notation survived into the directive set, convert it here before
    /// traversal starts.
    fn normalize_at_root(directives: &DirectiveSet) -> Option<DirectiveSet> {
        let include: Vec<String> = directives.include_paths().map(str::to_string).collect();
        let joined = include.join(",");

        if !NotationParser::contains_bracket_notation(&joined) {
            return None;
        }

        tracing::debug!("bracket notation reached the engine root, converting to dotted paths");
        let exclude: Vec<String> = directives.exclude_paths().map(str::to_string).collect();
        Some(DirectiveSet::new(include, exclude))
    }

    fn project_entity(
        &self,
        entity: &Entity,
        projector: &dyn Projector,
        directives: &DirectiveSet,
        scope: &Scope,
        origin: Option<&Origin<'_>>,
        tree_defaults: Option<&Arc<Vec<String>>>,
    ) -> ProjectionResult<Value> {
        let requested = directives.local_includes_under(scope);

        if self.config.use_strict_includes && !self.morph_satisfies_scope(entity, scope) {
            self.validate_includes(&requested, projector)?;
        }

        let mut map = projector.data(entity);

        // Defaults first, then requested names not already present; the
        // combined order drives deterministic output for array results.
        let mut expand: IndexSet<String> = match tree_defaults {
            Some(fixed) => fixed.iter().cloned().collect(),
            None => projector.default_includes().iter().cloned().collect(),
        };
        expand.extend(requested);

        for token in &expand {
            let (field, _params) = split_params(token);
            if field.is_empty() {
                continue;
            }

            let value = self.render_field(
                entity,
                projector,
                field,
                directives,
                scope,
                origin,
                tree_defaults,
            )?;
            map.insert(field.to_string(), value);
        }

        Ok(Value::Object(map))
    }

    /// Strict mode: every requested name must be declared available,
    /// except the identifier field.
    fn validate_includes(
        &self,
        requested: &IndexSet<String>,
        projector: &dyn Projector,
    ) -> ProjectionResult<()> {
        let available = projector.available_includes();

        let offending: Vec<String> = requested
            .iter()
            .map(|token| split_params(token).0)
            .filter(|field| *field != IDENTIFIER_FIELD)
            .filter(|field| !available.iter().any(|a| a == field))
            .map(str::to_string)
            .collect();

        if offending.is_empty() {
            Ok(())
        } else {
            Err(ProjectionError::UnknownInclude {
                fields: offending,
                projector: projector.name().to_string(),
            })
        }
    }

    /// Whether the scope identifier names a declared morph-contain
    /// identity of the entity's type, which exempts the scope from strict
    /// validation.
    fn morph_satisfies_scope(&self, entity: &Entity, scope: &Scope) -> bool {
        scope
            .identifier()
            .is_some_and(|id| self.relations.morph_identity_matches(entity.type_name(), id))
    }

    #[allow(clippy::too_many_arguments)]
    fn render_field(
        &self,
        entity: &Entity,
        projector: &dyn Projector,
        field: &str,
        directives: &DirectiveSet,
        scope: &Scope,
        origin: Option<&Origin<'_>>,
        tree_defaults: Option<&Arc<Vec<String>>>,
    ) -> ProjectionResult<Value> {
        if field == PIVOT_FIELD {
            return self.render_pivot(entity, origin);
        }

        let snake = Caser::snake(field);

        if let Some(accessor) = self.schema.accessor(entity.type_name(), field) {
            return Self::render_primitive(accessor.as_ref()(entity), field, &snake, projector);
        }

        if self.schema.has_attribute(entity.type_name(), &snake)
            || entity.attribute(&snake).is_some()
        {
            let value = entity.attribute(&snake).cloned().unwrap_or(FieldValue::Null);
            return Self::render_primitive(value, field, &snake, projector);
        }

        let Some(descriptor) = self.relations.relation_of(entity.type_name(), field) else {
            return Err(ProjectionError::RelationNotFound {
                entity_type: entity.type_name().to_string(),
                field: field.to_string(),
            });
        };

        if descriptor.count {
            return Ok(Value::from(self.relation_count(entity, field)));
        }

        let Some(value) = self.graph.related(entity, field) else {
            // Absent relation value: an explicit null, never a missing key.
            return Ok(Value::Null);
        };
        if value.is_absent() {
            return Ok(Value::Null);
        }

        let related_type = match &descriptor.related_type {
            Some(related) => related.clone(),
            // MorphTo: the concrete type lives on the instance.
            None => match entity
                .attribute(&format!("{}_type", snake))
                .and_then(FieldValue::as_str)
            {
                Some(related) => related.to_string(),
                None => {
                    return Err(ProjectionError::ProjectorNotFound {
                        entity_type: entity.type_name().to_string(),
                        field: field.to_string(),
                    });
                }
            },
        };

        let Some(related_projector) = self.projectors.resolve(&related_type) else {
            return Err(ProjectionError::ProjectorNotFound {
                entity_type: entity.type_name().to_string(),
                field: field.to_string(),
            });
        };

        // The default-include list for a tree expansion is fixed at the
        // topmost children level and reused unchanged at every depth.
        let fixed_tree_defaults = if field == TREE_CHILDREN {
            Some(match tree_defaults {
                Some(fixed) => Arc::clone(fixed),
                None => Arc::new(
                    directives
                        .local_includes_under(scope)
                        .into_iter()
                        .collect::<Vec<String>>(),
                ),
            })
        } else {
            None
        };

        let child_scope = scope.child(field);
        let child_origin = Origin {
            parent_type: entity.type_name(),
            relation: field,
        };

        match value {
            RelationValue::One(Some(related)) => self.project_entity(
                &related,
                related_projector.as_ref(),
                directives,
                &child_scope,
                Some(&child_origin),
                fixed_tree_defaults.as_ref(),
            ),
            RelationValue::One(None) => Ok(Value::Null),
            RelationValue::Many(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for related in &items {
                    rendered.push(self.project_entity(
                        related,
                        related_projector.as_ref(),
                        directives,
                        &child_scope,
                        Some(&child_origin),
                        fixed_tree_defaults.as_ref(),
                    )?);
                }
                Ok(Value::Array(rendered))
            }
        }
    }

    /// Extract the declared pivot-field subset from the junction record
    fn render_pivot(&self, entity: &Entity, origin: Option<&Origin<'_>>) -> ProjectionResult<Value> {
        let Some(origin) = origin else {
            return Err(ProjectionError::PivotNotDeclared {
                entity_type: entity.type_name().to_string(),
                relation: PIVOT_FIELD.to_string(),
            });
        };

        let fields = self
            .relations
            .pivot_fields_of(origin.parent_type, origin.relation)?;

        let mut map = serde_json::Map::new();
        if let Some(record) = entity.pivot() {
            for field in &fields {
                if let Some(value) = record.get(field) {
                    map.insert(field.clone(), value.to_json());
                }
            }
        }

        Ok(Value::Object(map))
    }

    /// Precomputed count carried by the first related record, 0 if absent
    fn relation_count(&self, entity: &Entity, field: &str) -> i64 {
        match self.graph.related(entity, field) {
            Some(RelationValue::Many(items)) => items
                .first()
                .and_then(|e| e.attribute("count"))
                .and_then(FieldValue::as_integer)
                .unwrap_or(0),
            Some(RelationValue::One(Some(related))) => related
                .attribute("count")
                .and_then(FieldValue::as_integer)
                .unwrap_or(0),
            _ => 0,
        }
    }

    fn render_primitive(
        value: FieldValue,
        field: &str,
        snake: &str,
        projector: &dyn Projector,
    ) -> ProjectionResult<Value> {
        // Temporal values are normalized, never casted.
        if matches!(value, FieldValue::DateTime(_)) {
            return Ok(value.to_json());
        }

        let casts = projector.casts();
        match casts.get(field).or_else(|| casts.get(snake)) {
            Some(cast) => value.cast(cast, field),
            None => Ok(value.to_json()),
        }
    }
}
