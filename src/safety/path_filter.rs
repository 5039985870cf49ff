use glob::Pattern;

use crate::error::ConfigError;

/// Case-insensitive path deny-list: plain substrings plus filename globs.
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// Stored lower-cased.
    substrings: Vec<String>,
    /// Compiled from lower-cased sources.
    patterns: Vec<Pattern>,
}

impl PathFilter {
    pub fn new(substrings: &[String], patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(&p.to_lowercase()).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            substrings: substrings.iter().map(|s| s.to_lowercase()).collect(),
            patterns,
        })
    }

    /// Returns a description of the first rule the path violates, if any.
    pub fn violation(&self, path: &str) -> Option<String> {
        let lower = path.to_lowercase();

        if let Some(sub) = self.substrings.iter().find(|s| lower.contains(s.as_str())) {
            return Some(format!("contains `{sub}`"));
        }

        // `*` crosses `/` here, so `*.key` matches keys at any depth.
        self.patterns
            .iter()
            .find(|p| p.matches(&lower))
            .map(|p| format!("matches `{}`", p.as_str()))
    }

    pub fn is_safe(&self, path: &str) -> bool {
        self.violation(path).is_none()
    }
}
