use regex::Regex;

use crate::error::AppError;

/// `*` glob matched against the whole string, case-sensitive
///
/// `*` matches any run of characters, including none. Every other character,
/// slash included, is literal.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    pub fn new(pattern: &str) -> Result<Self, AppError> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = Regex::new(&format!("^{}$", body)).map_err(|e| {
            AppError::ConfigError(format!("Invalid wildcard pattern '{}': {}", pattern, e))
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Compile a list of patterns
pub fn compile_all(patterns: &[String]) -> Result<Vec<WildcardPattern>, AppError> {
    patterns.iter().map(|p| WildcardPattern::new(p)).collect()
}

/// One-shot match without keeping the compiled pattern
pub fn matches_wildcard(value: &str, pattern: &str) -> bool {
    WildcardPattern::new(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(false)
}
