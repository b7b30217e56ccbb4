//! Render result types.

use std::time::Duration;

/// Result of rendering one template.
///
/// # Example
///
/// ```ignore
/// let result = engine.render("Hello {$greeting$}")?;
/// println!("{} ({} macros resolved)", result.text, result.stats.resolved);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderResult {
    /// Rendered text.
    pub text: String,
    /// Render statistics.
    pub stats: RenderStats,
}

impl RenderResult {
    /// Creates a new RenderResult.
    pub fn new(text: String, stats: RenderStats) -> Self {
        Self { text, stats }
    }

    /// Whether every macro found was resolved.
    pub fn is_complete(&self) -> bool {
        self.stats.unresolved == 0
    }
}

impl std::fmt::Display for RenderResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Statistics from rendering one template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    /// Macros a source supplied a value for.
    pub resolved: usize,
    /// Macros no source knew.
    pub unresolved: usize,
    /// Assembled blocks among the macros found.
    pub open_expressions: usize,
    /// Localization lookups served from the cache.
    pub cache_hits: usize,
    /// Total render duration.
    pub elapsed: Duration,
}

impl RenderStats {
    /// Number of macros found.
    pub fn total(&self) -> usize {
        self.resolved + self.unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_result_empty() {
        let result = RenderResult::default();
        assert!(result.text.is_empty());
        assert!(result.is_complete());
        assert_eq!(result.stats.total(), 0);
    }

    #[test]
    fn test_render_result_incomplete() {
        let stats = RenderStats {
            resolved: 2,
            unresolved: 1,
            ..RenderStats::default()
        };
        let result = RenderResult::new("x".to_string(), stats);
        assert!(!result.is_complete());
        assert_eq!(result.stats.total(), 3);
        assert_eq!(result.to_string(), "x");
    }
}
