//! # Facet
//!
//! A selective projection engine for typed entity graphs: given a loaded
//! graph and a client-supplied include/exclude directive string, compute a
//! nested, field-filtered representation of one or more root entities.
//!
//! ## Features
//!
//! - **Directive micro-syntax**: dotted (`type.id,type.code`) and bracketed
//!   (`type(id,code)`) notation, with parameter tokens preserved verbatim
//! - **Declared relation metadata**: per-type descriptor tables built at
//!   registration, covering to-one, to-many, attachment, polymorphic and
//!   tree relation kinds
//! - **Projector resolution**: conventional naming plus configured family
//!   defaults and alternate namespace roots
//! - **Recursive projection**: per-field casts, date normalization, pivot
//!   extraction, count relations, explicit null resources
//! - **Strict includes**: optional validation rejecting undeclared fields
//! - **Result caching**: semantic keys, TTL, tag-based bulk invalidation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use facet::prelude::*;
//!
//! // Declare types once at startup
//! let mut schema = SchemaRegistry::new();
//! schema.register(
//!     EntityType::builder("shop::models::Order")
//!         .attributes(["number", "total"])
//!         .relation(RelationKind::HasMany, "tags", RelationDefinition::to("shop::models::Tag"))
//!         .build(),
//! );
//!
//! let mut projectors = ProjectorRegistry::new();
//! projectors.register(
//!     "shop::projectors::OrderProjector",
//!     Arc::new(MapProjector::new("OrderProjector").fields(["number", "total"])),
//! );
//!
//! // Per request
//! let directives = DirectiveSet::new("tags(label)", "");
//! let engine = ProjectionEngine::new(schema.into(), projectors.into(), graph, config);
//! let tree = engine.project(&order, &*root_projector, &directives)?;
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod directives;
pub mod engine;
pub mod projector;
pub mod relations;
pub mod schema;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        entity::{Entity, EntityGraph, RelationValue},
        error::{ProjectionError, ProjectionResult},
        field::FieldValue,
        scope::Scope,
    };

    // === Directives ===
    pub use crate::directives::{DirectivePath, DirectiveSet, NotationParser};

    // === Schema ===
    pub use crate::schema::{EntityType, RelationDefinition, RelationKind, SchemaRegistry};

    // === Relations ===
    pub use crate::relations::{RelationDescriptor, RelationResolver};

    // === Projectors ===
    pub use crate::projector::{MapProjector, Projector, ProjectorRegistry, ProjectorResolver};

    // === Engine ===
    pub use crate::engine::ProjectionEngine;

    // === Cache ===
    pub use crate::cache::{CacheKey, CacheStore, ResultCache, DEFAULT_TTL};

    // === Storage ===
    pub use crate::storage::{InMemoryCacheStore, InMemoryEntityGraph};

    // === Config ===
    pub use crate::config::EngineConfig;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::Value;
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
