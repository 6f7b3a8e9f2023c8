//! Typed error handling for the projection engine
//!
//! Every variant is request-scoped and non-fatal to the process: the engine
//! never retries and has no write side-effects to roll back. The boundary
//! layer owning the request maps these onto its own error envelope.

use std::fmt;

/// Errors raised while projecting an entity graph
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// A referenced field has no relation or attribute definition.
    /// Caused by the client requesting an unknown field.
    RelationNotFound {
        entity_type: String,
        field: String,
    },

    /// Pivot extraction was requested on a relation that declares no pivot
    /// fields.
    PivotNotDeclared {
        entity_type: String,
        relation: String,
    },

    /// An expandable relation has no resolvable projector. This is a
    /// configuration mistake: the author forgot to register one under the
    /// conventional name or an alternate namespace.
    ProjectorNotFound {
        entity_type: String,
        field: String,
    },

    /// A declared cast names a type outside the supported primitive casts.
    UnknownCastType {
        cast: String,
        field: String,
    },

    /// Strict-include validation rejected requested fields the projector
    /// does not declare.
    UnknownInclude {
        fields: Vec<String>,
        projector: String,
    },
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::RelationNotFound { entity_type, field } => {
                write!(
                    f,
                    "Unable to find a relation or attribute definition for {}.{}",
                    entity_type, field
                )
            }
            ProjectionError::PivotNotDeclared {
                entity_type,
                relation,
            } => {
                write!(
                    f,
                    "Unable to find pivot definition for {} in {}",
                    relation, entity_type
                )
            }
            ProjectionError::ProjectorNotFound { entity_type, field } => {
                write!(
                    f,
                    "Unable to find a projector for {} of {}",
                    field, entity_type
                )
            }
            ProjectionError::UnknownCastType { cast, field } => {
                write!(f, "Unexpected cast type {} for field {}", cast, field)
            }
            ProjectionError::UnknownInclude { fields, projector } => {
                write!(
                    f,
                    "The requested includes {} are not available in {}",
                    fields.join(", "),
                    projector
                )
            }
        }
    }
}

impl std::error::Error for ProjectionError {}

impl ProjectionError {
    /// Stable code for programmatic handling by the boundary layer
    pub fn error_code(&self) -> &'static str {
        match self {
            ProjectionError::RelationNotFound { .. } => "RELATION_NOT_FOUND",
            ProjectionError::PivotNotDeclared { .. } => "PIVOT_NOT_DECLARED",
            ProjectionError::ProjectorNotFound { .. } => "PROJECTOR_NOT_FOUND",
            ProjectionError::UnknownCastType { .. } => "UNKNOWN_CAST_TYPE",
            ProjectionError::UnknownInclude { .. } => "UNKNOWN_INCLUDE",
        }
    }

    /// Whether the fault lies with the request rather than the deployment.
    ///
    /// Client faults come from the directive string; the rest point at a
    /// misconfigured projector or cast table.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProjectionError::RelationNotFound { .. }
                | ProjectionError::PivotNotDeclared { .. }
                | ProjectionError::UnknownInclude { .. }
        )
    }
}

/// A specialized Result type for projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;
