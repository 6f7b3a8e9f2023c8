//! Parser for the include/exclude directive micro-syntax
//!
//! Clients write either dotted paths (`type.id,type.code`) or the
//! equivalent bracketed form (`type(id,code)`); both produce the same set
//! of canonical dotted paths. Bracket glyphs are also used by parameter
//! notation (`thumb:size(250|32)`), which must stay a single verbatim
//! token: the disambiguation rule is a `:` before the bracket with no
//! comma in between.
//!
//! Malformed input degrades instead of erroring: unbalanced brackets keep
//! the segment verbatim, empty field names are skipped.

use crate::directives::DirectivePath;
use indexmap::IndexSet;

/// Converts a raw directive string into canonical dotted paths
pub struct NotationParser;

impl NotationParser {
    /// Parse a raw directive string.
    ///
    /// The result is deduplicated and keeps the insertion order of first
    /// appearance; downstream default expansion depends on that order for
    /// deterministic array output.
    ///
    /// # Examples
    ///
    /// ```
    /// use facet::directives::NotationParser;
    ///
    /// let paths: Vec<String> = NotationParser::parse("type(id,code)")
    ///     .iter()
    ///     .map(|p| p.to_string())
    ///     .collect();
    /// assert_eq!(paths, ["type", "type.id", "type.code"]);
    /// ```
    pub fn parse(raw: &str) -> Vec<DirectivePath> {
        let mut tokens: IndexSet<String> = IndexSet::new();

        for segment in Self::split_top_level_commas(raw) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            if segment.contains('(') && segment.contains(')') {
                for token in Self::expand_segment(segment) {
                    tokens.insert(token);
                }
            } else {
                tokens.insert(segment.to_string());
            }
        }

        tokens.into_iter().map(|t| DirectivePath::from_dotted(&t)).collect()
    }

    /// Whether the raw string contains bracket notation that needs
    /// expansion (parameter notation does not count)
    pub fn contains_bracket_notation(raw: &str) -> bool {
        Self::split_top_level_commas(raw).iter().any(|segment| {
            let segment = segment.trim();
            match segment.find('(') {
                None => false,
                Some(open) => !Self::is_parameter_notation(segment, open),
            }
        })
    }

    /// Expand one `relation(f1,f2,...)` segment into dotted tokens
    fn expand_segment(segment: &str) -> Vec<String> {
        let Some(open) = segment.find('(') else {
            return vec![segment.to_string()];
        };

        if Self::is_parameter_notation(segment, open) {
            return vec![segment.to_string()];
        }

        let Some(close) = Self::matching_close(segment, open) else {
            return vec![segment.to_string()];
        };

        let head = &segment[..open];
        let content = &segment[open + 1..close];

        let mut tokens = vec![head.to_string()];

        for field in Self::split_top_level_commas(content) {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }

            if let Some(field_open) = field.find('(') {
                if Self::is_parameter_notation(field, field_open) {
                    tokens.push(format!("{}.{}", head, field));
                    continue;
                }
            }

            if field.contains('(') && field.contains(')') {
                for sub in Self::expand_segment(field) {
                    tokens.push(format!("{}.{}", head, sub));
                }
            } else {
                tokens.push(format!("{}.{}", head, field));
            }
        }

        tokens
    }

    /// Parameter notation has a `:` before the bracket with no comma
    /// between the colon and the bracket
    fn is_parameter_notation(segment: &str, open: usize) -> bool {
        match segment[..open].rfind(':') {
            Some(colon) => !segment[colon..open].contains(','),
            None => false,
        }
    }

    /// Position of the bracket matching the one at `open`, tracking depth
    fn matching_close(segment: &str, open: usize) -> Option<usize> {
        let mut depth = 0usize;

        for (i, ch) in segment.char_indices().skip_while(|(i, _)| *i < open) {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }

        None
    }

    /// Split on commas at bracket depth zero only
    fn split_top_level_commas(raw: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut depth = 0i32;

        for ch in raw.chars() {
            match ch {
                '(' => {
                    depth += 1;
                    current.push(ch);
                }
                ')' => {
                    depth -= 1;
                    current.push(ch);
                }
                ',' if depth == 0 => {
                    segments.push(std::mem::take(&mut current));
                }
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            segments.push(current);
        }

        segments
    }
}
