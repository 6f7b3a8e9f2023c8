//! Core module containing the fundamental types of the projection engine

pub mod entity;
pub mod error;
pub mod field;
pub mod scope;
pub mod strcase;

pub use entity::{Entity, EntityGraph, RelationValue};
pub use error::{ProjectionError, ProjectionResult};
pub use field::{FieldValue, ZERO_DATE};
pub use scope::{Scope, TREE_CHILDREN, TREE_PARENT};
pub use strcase::Caser;
