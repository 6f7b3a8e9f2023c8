//! Scope tracking for recursive projection
//!
//! A scope is the dotted identifier path from the projection root to the
//! relation currently being expanded (e.g. `orders.items`). Scopes are
//! values, not shared state: recursion builds child scopes and never
//! mutates a parent.

use std::fmt;

/// Reserved relation name for hierarchical child expansion. Include paths
/// under this identifier keep their flattened form across recursion levels.
pub const TREE_CHILDREN: &str = "children";

/// Reserved relation name for the hierarchical parent relation.
pub const TREE_PARENT: &str = "parent";

/// Dotted path from the projection root to the current relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Scope(String);

impl Scope {
    /// The root scope (no relation expanded yet)
    pub fn root() -> Self {
        Scope(String::new())
    }

    /// Build a scope from an already-dotted path
    pub fn new(path: impl Into<String>) -> Self {
        Scope(path.into())
    }

    /// Whether this is the projection root
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The dotted path, empty at the root
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The innermost relation name, if any
    pub fn identifier(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('.').next()
        }
    }

    /// Descend into a relation field
    pub fn child(&self, field: &str) -> Scope {
        if self.is_root() {
            Scope(field.to_string())
        } else {
            Scope(format!("{}.{}", self.0, field))
        }
    }

    /// Whether this scope sits inside a tree-children expansion.
    ///
    /// Include scoping is skipped under such scopes so the flattened
    /// include set stays stable at every depth.
    pub fn in_tree_recursion(&self) -> bool {
        self.0.starts_with(TREE_CHILDREN)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_scope() {
        let scope = Scope::root();
        assert!(scope.is_root());
        assert_eq!(scope.identifier(), None);
        assert_eq!(scope.as_str(), "");
    }

    #[test]
    fn test_child_descent() {
        let scope = Scope::root().child("orders").child("items");
        assert_eq!(scope.as_str(), "orders.items");
        assert_eq!(scope.identifier(), Some("items"));
        assert!(!scope.is_root());
    }

    #[test]
    fn test_tree_recursion_detection() {
        assert!(Scope::new("children").in_tree_recursion());
        assert!(Scope::new("children.children").in_tree_recursion());
        assert!(!Scope::new("orders.children").in_tree_recursion());
    }
}
