//! Include/exclude directives for one projection request

pub mod notation;

pub use notation::NotationParser;

use crate::core::scope::Scope;
use indexmap::IndexSet;
use std::fmt;

/// One canonical directive path: ordered field-name segments.
///
/// A parameter-notation token (`thumb:size(250|32)`) is carried as a single
/// verbatim segment; the suffix after `:` never participates in relation
/// traversal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectivePath {
    segments: Vec<String>,
}

impl DirectivePath {
    /// Build a path from a dotted token, skipping empty segments
    pub fn from_dotted(token: &str) -> Self {
        Self {
            segments: token
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The leading segment, if the path is non-empty
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }
}

impl fmt::Display for DirectivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Split a directive token into its field name and verbatim parameter
/// suffix (`thumb:size(250|32)` → `("thumb", Some("size(250|32)"))`)
pub fn split_params(token: &str) -> (&str, Option<&str>) {
    match token.split_once(':') {
        Some((name, params)) => (name, Some(params)),
        None => (token, None),
    }
}

/// Raw directive input: a comma-joined string or a pre-split sequence
#[derive(Debug, Clone, Default)]
pub struct DirectiveInput(Vec<String>);

impl DirectiveInput {
    /// The comma-joined form, ready for the parser
    fn joined(&self) -> String {
        self.0.join(",")
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|s| s.trim().is_empty())
    }
}

impl From<&str> for DirectiveInput {
    fn from(value: &str) -> Self {
        DirectiveInput(vec![value.to_string()])
    }
}

impl From<String> for DirectiveInput {
    fn from(value: String) -> Self {
        DirectiveInput(vec![value])
    }
}

impl From<Vec<String>> for DirectiveInput {
    fn from(value: Vec<String>) -> Self {
        DirectiveInput(value)
    }
}

impl From<&[&str]> for DirectiveInput {
    fn from(value: &[&str]) -> Self {
        DirectiveInput(value.iter().map(|s| s.to_string()).collect())
    }
}

/// The canonical include/exclude path sets for one request.
///
/// Both sets are deduplicated and insertion-ordered. Exclude filtering
/// removes include paths equal to an exclude path; prefix exclusion is
/// deliberately NOT implied — excluding `a` leaves `a.b` requested.
#[derive(Debug, Clone, Default)]
pub struct DirectiveSet {
    includes: IndexSet<String>,
    excludes: IndexSet<String>,
}

impl DirectiveSet {
    /// Build from raw include/exclude input, expanding bracket notation
    pub fn new(include: impl Into<DirectiveInput>, exclude: impl Into<DirectiveInput>) -> Self {
        let include = include.into();
        let exclude = exclude.into();

        let excludes: IndexSet<String> = NotationParser::parse(&exclude.joined())
            .iter()
            .map(|p| p.to_string())
            .collect();

        let includes = NotationParser::parse(&include.joined())
            .iter()
            .map(|p| p.to_string())
            .filter(|p| !excludes.contains(p))
            .collect();

        Self { includes, excludes }
    }

    /// Build from pre-split input without expanding bracket notation.
    ///
    /// Used by collaborators outside the normal input pipeline; the engine
    /// converts any surviving bracket notation itself at the root scope.
    pub fn from_pre_split(
        include: impl Into<DirectiveInput>,
        exclude: impl Into<DirectiveInput>,
    ) -> Self {
        let split = |input: DirectiveInput| -> IndexSet<String> {
            input
                .joined()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        let excludes = split(exclude.into());
        let mut includes = split(include.into());
        includes.retain(|p| !excludes.contains(p));

        Self { includes, excludes }
    }

    /// An empty set: only projector defaults apply
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_include(&self) -> bool {
        !self.includes.is_empty()
    }

    pub fn has_exclude(&self) -> bool {
        !self.excludes.is_empty()
    }

    /// Include paths as dotted strings, in insertion order
    pub fn include_paths(&self) -> impl Iterator<Item = &str> {
        self.includes.iter().map(String::as_str)
    }

    /// Exclude paths as dotted strings, in insertion order
    pub fn exclude_paths(&self) -> impl Iterator<Item = &str> {
        self.excludes.iter().map(String::as_str)
    }

    /// Exact-match membership in the include set
    pub fn has_include_path(&self, path: &str) -> bool {
        self.includes.contains(path)
    }

    /// True if any include path starts with `path`
    pub fn is_include_prefix_present(&self, path: &str) -> bool {
        self.includes.iter().any(|p| p.starts_with(path))
    }

    /// The first segment of every include path local to `scope`.
    ///
    /// At the root every path contributes its first segment. Inside a
    /// tree-children expansion prefix scoping is skipped so the flattened
    /// include set stays stable at every depth.
    pub fn local_includes_under(&self, scope: &Scope) -> IndexSet<String> {
        let mut local = IndexSet::new();

        if scope.is_root() || scope.in_tree_recursion() {
            for path in &self.includes {
                if let Some(first) = path.split('.').next().filter(|s| !s.is_empty()) {
                    local.insert(first.to_string());
                }
            }
            return local;
        }

        let prefix = format!("{}.", scope.as_str());

        for path in &self.includes {
            if let Some(rest) = path.strip_prefix(&prefix) {
                if let Some(first) = rest.split('.').next().filter(|s| !s.is_empty()) {
                    local.insert(first.to_string());
                }
            }
        }

        local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_from_string_and_sequence() {
        let from_string = DirectiveSet::new("orders,orders.items", "");
        let from_sequence = DirectiveSet::new(
            vec!["orders".to_string(), "orders.items".to_string()],
            Vec::new(),
        );

        let a: Vec<&str> = from_string.include_paths().collect();
        let b: Vec<&str> = from_sequence.include_paths().collect();
        assert_eq!(a, b);
        assert!(from_string.has_include());
        assert!(!from_string.has_exclude());
    }

    #[test]
    fn test_bracket_notation_is_expanded() {
        let set = DirectiveSet::new("type(id,code)", "");
        let paths: Vec<&str> = set.include_paths().collect();
        assert_eq!(paths, ["type", "type.id", "type.code"]);
    }

    #[test]
    fn test_exclude_removes_exact_matches_only() {
        let set = DirectiveSet::new("orders,orders.items,orders.total", "orders");
        let paths: Vec<&str> = set.include_paths().collect();

        // Prefix exclusion is not implied: the children stay requested.
        assert_eq!(paths, ["orders.items", "orders.total"]);
        assert!(set.has_exclude());
    }

    #[test]
    fn test_local_includes_at_root() {
        let set = DirectiveSet::new("orders.items,customer,orders", "");
        let local = set.local_includes_under(&Scope::root());
        let names: Vec<&String> = local.iter().collect();
        assert_eq!(names, ["orders", "customer"]);
    }

    #[test]
    fn test_local_includes_under_scope() {
        let set = DirectiveSet::new("orders.items.product,orders.customer,unrelated", "");
        let local = set.local_includes_under(&Scope::new("orders"));
        let names: Vec<&String> = local.iter().collect();
        assert_eq!(names, ["items", "customer"]);
    }

    #[test]
    fn test_scope_itself_contributes_nothing() {
        let set = DirectiveSet::new("orders", "");
        let local = set.local_includes_under(&Scope::new("orders"));
        assert!(local.is_empty());
    }

    #[test]
    fn test_tree_scope_uses_flattened_set() {
        let set = DirectiveSet::new("children,label,weight", "");
        let local = set.local_includes_under(&Scope::new("children.children"));
        let names: Vec<&String> = local.iter().collect();
        assert_eq!(names, ["children", "label", "weight"]);
    }

    #[test]
    fn test_include_prefix_query() {
        let set = DirectiveSet::new("orders.items", "");
        assert!(set.is_include_prefix_present("orders"));
        assert!(set.is_include_prefix_present("orders.items"));
        assert!(!set.is_include_prefix_present("customer"));
    }

    #[test]
    fn test_split_params() {
        assert_eq!(split_params("thumb:size(250|32)"), ("thumb", Some("size(250|32)")));
        assert_eq!(split_params("label"), ("label", None));
    }
}
