//! Glob pattern sets used by every allow and deny list.
//!
//! Matching follows shell `fnmatch` rules: `*` matches any run of characters
//! (path separators included), `?` matches exactly one character and `[...]`
//! matches a character class. Matching is case-sensitive.

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A single compiled glob pattern that remembers its source text.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    compiled: Pattern,
}

impl GlobPattern {
    /// Compile a pattern.
    ///
    /// Runs of `*` collapse to a single `*` since `*` already crosses
    /// separators. Syntax the glob engine rejects (an unclosed `[` for
    /// instance) is matched literally.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Pattern::new(&collapse_stars(&source))
            .unwrap_or_else(|_| Pattern::new(&Pattern::escape(&source)).unwrap_or_default());
        Self { source, compiled }
    }

    /// The pattern text as it was written in the policy document.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `candidate` matches this pattern.
    pub fn matches(&self, candidate: &str) -> bool {
        self.compiled.matches_with(candidate, MATCH_OPTIONS)
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for GlobPattern {}

fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut previous_star = false;
    for c in pattern.chars() {
        if c == '*' && previous_star {
            continue;
        }
        previous_star = c == '*';
        out.push(c);
    }
    out
}

/// An ordered set of glob patterns.
///
/// An empty set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<GlobPattern>,
}

impl PatternSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any pattern matches `candidate`.
    pub fn matches(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(candidate))
    }

    /// The first pattern matching `candidate`, if any.
    pub fn first_match(&self, candidate: &str) -> Option<&GlobPattern> {
        self.patterns.iter().find(|p| p.matches(candidate))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Source text of each pattern, in document order.
    pub fn sources(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.source.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobPattern> {
        self.patterns.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for PatternSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut patterns: Vec<GlobPattern> = Vec::new();
        for source in iter {
            let pattern = GlobPattern::new(source);
            // Duplicates add nothing to an "any matches" set
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
        Self { patterns }
    }
}

impl Serialize for PatternSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.patterns.iter().map(|p| p.source.as_str()))
    }
}

impl<'de> Deserialize<'de> for PatternSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A YAML `allowed:` key with no value deserializes as null
        let sources: Option<Vec<String>> = Option::deserialize(deserializer)?;
        Ok(sources.unwrap_or_default().into_iter().collect())
    }
}
