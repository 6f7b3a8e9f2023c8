//! Projectors: the polymorphic units that turn one entity into a flat
//! field map
//!
//! A projector declares which relations it always expands
//! (`default_includes`), which it is willing to expose
//! (`available_includes`), and an optional cast table. Relation expansion
//! itself stays with the engine; projectors only shape the flat data of
//! their own entity type.

pub mod resolver;

pub use resolver::ProjectorResolver;

use crate::core::entity::Entity;
use crate::core::strcase::Caser;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

fn empty_casts() -> &'static HashMap<String, String> {
    static EMPTY: OnceLock<HashMap<String, String>> = OnceLock::new();
    EMPTY.get_or_init(HashMap::new)
}

/// Transforms one entity type family into flat field maps
pub trait Projector: Send + Sync {
    /// Name used in error messages (e.g. `OrderProjector`)
    fn name(&self) -> &str;

    /// The flat field map for one entity.
    ///
    /// Only this type's own data; relation keys are merged in by the
    /// engine afterwards.
    fn data(&self, entity: &Entity) -> Map<String, Value>;

    /// Relation names expanded even when the client requested nothing
    fn default_includes(&self) -> &[String];

    /// The full set of relation names this projector is willing to expose.
    /// Strict-include validation diffs requested names against this list.
    fn available_includes(&self) -> &[String];

    /// Cast table applied to included attribute fields, keyed by the
    /// original or snake_cased field name. Values are cast names
    /// (`"int"`, `"float"`, ...).
    fn casts(&self) -> &HashMap<String, String> {
        empty_casts()
    }
}

/// A computed field merged over the data map
pub type ComputedField = Arc<dyn Fn(&Entity) -> Value + Send + Sync>;

/// Declarative [`Projector`] built at construction time.
///
/// Covers the common case: copy a fixed list of attributes, merge computed
/// fields over them, and declare include lists and casts up front.
#[derive(Clone, Default)]
pub struct MapProjector {
    name: String,
    fields: Vec<String>,
    computed: Vec<(String, ComputedField)>,
    default_includes: Vec<String>,
    available_includes: Vec<String>,
    casts: HashMap<String, String>,
}

impl MapProjector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Copy an attribute into the data map. The declared spelling becomes
    /// the output key; the attribute is read by its snake_case name.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Copy several attributes at once
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Merge a computed field over the data map
    pub fn computed<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Entity) -> Value + Send + Sync + 'static,
    {
        self.computed.push((key.into(), Arc::new(f)));
        self
    }

    /// Declare a relation as available for expansion
    pub fn include(mut self, name: impl Into<String>) -> Self {
        self.available_includes.push(name.into());
        self
    }

    /// Declare a relation as available and always expanded
    pub fn default_include(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.available_includes.push(name.clone());
        self.default_includes.push(name);
        self
    }

    /// Declare a cast for an included attribute field
    pub fn cast(mut self, field: impl Into<String>, cast: impl Into<String>) -> Self {
        self.casts.insert(field.into(), cast.into());
        self
    }
}

impl Projector for MapProjector {
    fn name(&self) -> &str {
        &self.name
    }

    fn data(&self, entity: &Entity) -> Map<String, Value> {
        let mut map = Map::new();

        for field in &self.fields {
            let value = entity
                .attribute(&Caser::snake(field))
                .map(|v| v.to_json())
                .unwrap_or(Value::Null);
            map.insert(field.clone(), value);
        }

        for (key, compute) in &self.computed {
            map.insert(key.clone(), compute.as_ref()(entity));
        }

        map
    }

    fn default_includes(&self) -> &[String] {
        &self.default_includes
    }

    fn available_includes(&self) -> &[String] {
        &self.available_includes
    }

    fn casts(&self) -> &HashMap<String, String> {
        &self.casts
    }
}

/// Registry of projectors keyed by fully-qualified name.
///
/// This is the type registry the resolver searches: registration happens
/// once at startup, lookups never mutate.
#[derive(Clone, Default)]
pub struct ProjectorRegistry {
    projectors: HashMap<String, Arc<dyn Projector>>,
}

impl ProjectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a projector under its fully-qualified name
    /// (e.g. `shop::projectors::OrderProjector`)
    pub fn register(&mut self, name: impl Into<String>, projector: Arc<dyn Projector>) {
        self.projectors.insert(name.into(), projector);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.projectors.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Projector>> {
        self.projectors.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_map_projector_copies_declared_fields() {
        let projector = MapProjector::new("OrderProjector").fields(["number", "total"]);
        let entity = Entity::new("shop::models::Order", Uuid::new_v4())
            .with_attribute("number", "A-1")
            .with_attribute("total", 99i64)
            .with_attribute("secret", "hidden");

        let data = projector.data(&entity);
        assert_eq!(data.get("number"), Some(&json!("A-1")));
        assert_eq!(data.get("total"), Some(&json!(99)));
        assert!(!data.contains_key("secret"));
    }

    #[test]
    fn test_camel_spelling_reads_snake_attribute() {
        let projector = MapProjector::new("OrderProjector").field("createdAt");
        let entity = Entity::new("shop::models::Order", Uuid::new_v4())
            .with_attribute("created_at", "2024-01-01");

        let data = projector.data(&entity);
        assert_eq!(data.get("createdAt"), Some(&json!("2024-01-01")));
    }

    #[test]
    fn test_missing_attribute_renders_null() {
        let projector = MapProjector::new("OrderProjector").field("number");
        let entity = Entity::new("shop::models::Order", Uuid::new_v4());

        let data = projector.data(&entity);
        assert_eq!(data.get("number"), Some(&Value::Null));
    }

    #[test]
    fn test_computed_fields_merge_over_data() {
        let projector = MapProjector::new("OrderProjector")
            .field("number")
            .computed("number", |_| json!("overridden"))
            .computed("extra", |e| {
                json!(e.attribute("total").and_then(FieldValue::as_integer).unwrap_or(0) * 2)
            });

        let entity = Entity::new("shop::models::Order", Uuid::new_v4())
            .with_attribute("number", "A-1")
            .with_attribute("total", 10i64);

        let data = projector.data(&entity);
        assert_eq!(data.get("number"), Some(&json!("overridden")));
        assert_eq!(data.get("extra"), Some(&json!(20)));
    }

    #[test]
    fn test_default_include_is_also_available() {
        let projector = MapProjector::new("OrderProjector")
            .include("customer")
            .default_include("items");

        assert_eq!(projector.available_includes(), ["customer", "items"]);
        assert_eq!(projector.default_includes(), ["items"]);
    }

    #[test]
    fn test_registry_round_trip() {
        let mut registry = ProjectorRegistry::new();
        registry.register(
            "shop::projectors::OrderProjector",
            Arc::new(MapProjector::new("OrderProjector")),
        );

        assert!(registry.contains("shop::projectors::OrderProjector"));
        assert!(!registry.contains("shop::projectors::MissingProjector"));
        assert_eq!(
            registry.get("shop::projectors::OrderProjector").unwrap().name(),
            "OrderProjector"
        );
    }
}
