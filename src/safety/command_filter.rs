use std::path::Path;

/// Decides whether a shell command line may run: a deny-list of substrings
/// checked first, then an allow-list on the first token.
#[derive(Debug, Clone)]
pub struct CommandFilter {
    allowed: Vec<String>,
    /// Stored lower-cased.
    forbidden: Vec<String>,
}

impl CommandFilter {
    pub fn new(allowed: &[String], forbidden: &[String]) -> Self {
        Self {
            allowed: allowed.to_vec(),
            forbidden: forbidden.iter().map(|f| f.to_lowercase()).collect(),
        }
    }

    /// Returns the forbidden substring that matched, if any.
    pub fn forbidden_match(&self, command: &str) -> Option<&str> {
        let lower = command.to_lowercase();
        self.forbidden
            .iter()
            .find(|f| lower.contains(f.as_str()))
            .map(String::as_str)
    }

    /// True when the first whitespace-delimited token is an allow-listed
    /// command name, or a path whose final component is one.
    pub fn first_token_allowed(&self, command: &str) -> bool {
        let Some(first) = command.split_whitespace().next() else {
            return false;
        };

        if self.allowed.iter().any(|a| a == first) {
            return true;
        }

        if !first.contains('/') {
            return false;
        }
        Path::new(first)
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.allowed.iter().any(|a| a == name))
    }

    pub fn is_safe(&self, command: &str) -> bool {
        self.forbidden_match(command).is_none() && self.first_token_allowed(command)
    }
}
