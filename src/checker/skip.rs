// src/checker/skip.rs
// =============================================================================
// Skip patterns: URLs that are never requested (rate-limiting DOI resolvers,
// binary images, ...). A match marks the link SKIPPED.
// =============================================================================

use regex::RegexSet;

use crate::config::DEFAULT_SKIP_PATTERNS;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct SkipPatterns {
    set: RegexSet,
}

impl SkipPatterns {
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            set: RegexSet::new(patterns)?,
        })
    }

    /// The built-in patterns followed by `extra`.
    pub fn with_defaults<I, S>(extra: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<String> = DEFAULT_SKIP_PATTERNS.iter().map(|p| p.to_string()).collect();
        patterns.extend(extra.into_iter().map(|p| p.as_ref().to_string()));
        Self::new(patterns)
    }

    pub fn none() -> Self {
        Self {
            set: RegexSet::empty(),
        }
    }

    /// The first pattern that matches `url`, if any.
    pub fn matching(&self, url: &str) -> Option<&str> {
        self.set
            .matches(url)
            .iter()
            .next()
            .map(|index| self.set.patterns()[index].as_str())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}
