//! Storage-facing implementations of the engine's collaborator traits

pub mod in_memory;

pub use in_memory::{InMemoryCacheStore, InMemoryEntityGraph};
