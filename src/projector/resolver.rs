//! Projector lookup for related types
//!
//! Resolution order: family defaults (file/media, user), then the
//! conventional name derived from the related type, then the configured
//! alternate namespace roots. Everything resolves against the registry
//! built at startup; the result is memoized per related type.

use crate::config::EngineConfig;
use crate::projector::{Projector, ProjectorRegistry};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The path segment naming the model namespace of a type
const MODELS_SEGMENT: &str = "models";

/// The path segment naming the projector namespace
const PROJECTORS_SEGMENT: &str = "projectors";

/// Suffix appended to the related type's base name
const PROJECTOR_SUFFIX: &str = "Projector";

/// Locates the projector responsible for a related type
pub struct ProjectorResolver {
    registry: Arc<ProjectorRegistry>,
    config: Arc<EngineConfig>,
    memo: RwLock<HashMap<String, Option<Arc<dyn Projector>>>>,
}

impl ProjectorResolver {
    pub fn new(registry: Arc<ProjectorRegistry>, config: Arc<EngineConfig>) -> Self {
        Self {
            registry,
            config,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Find the projector for a related type, or None when nothing
    /// resolves. Callers treat None as "relation has no renderer".
    pub fn resolve(&self, related_type: &str) -> Option<Arc<dyn Projector>> {
        if let Ok(memo) = self.memo.read() {
            if let Some(hit) = memo.get(related_type) {
                return hit.clone();
            }
        }

        let projector = self.lookup(related_type);

        if let Ok(mut memo) = self.memo.write() {
            memo.insert(related_type.to_string(), projector.clone());
        }

        projector
    }

    fn lookup(&self, related_type: &str) -> Option<Arc<dyn Projector>> {
        if related_type.contains("File") {
            return self
                .config
                .default_file_projector
                .as_deref()
                .and_then(|name| self.registry.get(name));
        }

        if related_type.contains("User") {
            return self
                .config
                .default_user_projector
                .as_deref()
                .and_then(|name| self.registry.get(name));
        }

        let conventional = Self::conventional_name(related_type);

        if let Some(projector) = self.registry.get(&conventional) {
            return Some(projector);
        }

        let own_root = Self::namespace_root(related_type);
        let rest = match conventional.find(&format!("::{}::", PROJECTORS_SEGMENT)) {
            Some(idx) => &conventional[idx..],
            // No namespace to substitute, nothing more to try.
            None => return None,
        };

        for alternate in &self.config.alternate_projector_namespaces {
            if Some(alternate.as_str()) == own_root {
                continue;
            }

            let candidate = format!("{}{}", alternate, rest);
            if let Some(projector) = self.registry.get(&candidate) {
                return Some(projector);
            }
        }

        None
    }

    /// Derive the conventional projector name:
    /// `shop::models::Product` → `shop::projectors::ProductProjector`
    fn conventional_name(related_type: &str) -> String {
        let renamed: Vec<&str> = related_type
            .split("::")
            .map(|segment| {
                if segment == MODELS_SEGMENT {
                    PROJECTORS_SEGMENT
                } else {
                    segment
                }
            })
            .collect();

        format!("{}{}", renamed.join("::"), PROJECTOR_SUFFIX)
    }

    /// The namespace root preceding the models segment, if any
    fn namespace_root(related_type: &str) -> Option<&str> {
        related_type
            .find(&format!("::{}::", MODELS_SEGMENT))
            .map(|idx| &related_type[..idx])
    }
}
