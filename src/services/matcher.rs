use crate::domain::CleanupError;
use glob::{MatchOptions, Pattern};
use regex::Regex;
use tracing::info;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled selection pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Shell glob over the whole key
    Glob(Pattern),
    /// Regular expression that must match at the start of the key
    Regex(Regex),
}

impl Matcher {
    pub fn new(pattern: &str, use_regex: bool) -> Result<Self, CleanupError> {
        let invalid = |reason: String| CleanupError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if use_regex {
            info!("Using regular expression");
            Regex::new(pattern)
                .map(Self::Regex)
                .map_err(|e| invalid(e.to_string()))
        } else {
            Pattern::new(&collapse_stars(pattern))
                .map(Self::Glob)
                .map_err(|e| invalid(e.to_string()))
        }
    }

    pub fn is_match(&self, key: &str) -> bool {
        match self {
            Self::Glob(pattern) => pattern.matches_with(key, GLOB_OPTIONS),
            Self::Regex(regex) => regex.find(key).is_some_and(|m| m.start() == 0),
        }
    }

    /// Lazily yields the items whose key matches, in source order.
    pub fn select<'m, T, I, F>(&'m self, items: I, key_fn: F) -> impl Iterator<Item = T> + 'm
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'm,
        F: Fn(&T) -> &str,
        F: 'm,
    {
        items
            .into_iter()
            .filter(move |item| self.is_match(key_fn(item)))
    }
}

/// Keys are not paths, so `**` means the same as `*`.
fn collapse_stars(pattern: &str) -> String {
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if !(c == '*' && collapsed.ends_with('*')) {
            collapsed.push(c);
        }
    }
    collapsed
}

/// Compiles `pattern` and selects from `items`. An invalid pattern fails
/// before `items` is touched.
pub fn select<T, I, F>(
    pattern: &str,
    use_regex: bool,
    items: I,
    key_fn: F,
) -> Result<Vec<T>, CleanupError>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &str,
{
    let matcher = Matcher::new(pattern, use_regex)?;
    Ok(items
        .into_iter()
        .filter(|item| matcher.is_match(key_fn(item)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity<'a>(s: &'a &str) -> &'a str {
        s
    }

    const TAGS: [&str; 3] = ["web:latest", "webapp:1", "other:2"];

    #[test]
    fn test_star_glob_selects_everything() {
        let selected = select("*", false, TAGS, identity).unwrap();
        assert_eq!(selected, TAGS.to_vec());
    }

    #[test]
    fn test_regex_is_prefix_match() {
        let selected = select("^web", true, TAGS, identity).unwrap();
        assert_eq!(selected, vec!["web:latest", "webapp:1"]);

        // no implicit anchor needed, and no full-match requirement
        let selected = select("web", true, TAGS, identity).unwrap();
        assert_eq!(selected, vec!["web:latest", "webapp:1"]);

        let selected = select("latest", true, TAGS, identity).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_glob_matches_whole_key() {
        let selected = select("web:*", false, TAGS, identity).unwrap();
        assert_eq!(selected, vec!["web:latest"]);

        let selected = select("web", false, TAGS, identity).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_glob_classes_and_single_char() {
        let m = Matcher::new("app-[0-9]?", false).unwrap();
        assert!(m.is_match("app-1a"));
        assert!(!m.is_match("app-x1"));
        assert!(!m.is_match("APP-1a"));

        let m = Matcher::new("registry/*", false).unwrap();
        assert!(m.is_match("registry/team/app:1"));
    }

    #[test]
    fn test_double_star_acts_like_single_star() {
        let m = Matcher::new("web**", false).unwrap();
        assert!(m.is_match("webapp"));
        assert!(m.is_match("web:latest"));

        let m = Matcher::new("ci-**-old", false).unwrap();
        assert!(m.is_match("ci-build-old"));
        assert!(!m.is_match("ci-build-new"));
    }

    #[test]
    fn test_invalid_regex_fails_before_iteration() {
        let touched = std::cell::Cell::new(false);
        let items = std::iter::from_fn(|| {
            touched.set(true);
            None::<&str>
        });

        let err = select("(unclosed", true, items, identity).unwrap_err();
        assert!(matches!(err, CleanupError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
        assert!(!touched.get());
    }

    #[test]
    fn test_invalid_glob_is_invalid_pattern() {
        let err = Matcher::new("web[", false).unwrap_err();
        assert!(matches!(err, CleanupError::InvalidPattern { .. }));
    }

    #[test]
    fn test_select_preserves_source_order() {
        let items = vec!["b-2", "a-1", "b-1"];
        let m = Matcher::new("b-*", false).unwrap();
        let selected: Vec<_> = m.select(items, identity).collect();
        assert_eq!(selected, vec!["b-2", "b-1"]);
    }
}
