//! Configuration types for the macro engine.

use std::time::Duration;

use cms_macro::{MacroType, ScanOptions};

/// Culture used when none is configured.
pub const DEFAULT_CULTURE: &str = "en-US";

/// Configuration for the macro engine.
///
/// # Example
///
/// ```rust
/// use cms_macro::MacroType;
/// use cms_macro_engine::{CacheConfig, EngineConfig};
///
/// let config = EngineConfig::builder()
///     .with_allowed_types(&[MacroType::Data, MacroType::Localization])
///     .with_culture("cs-CZ")
///     .with_cache(CacheConfig::default())
///     .with_keep_unresolved(false)
///     .build();
///
/// assert_eq!(config.culture, "cs-CZ");
/// assert!(!config.keep_unresolved);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bracket families the engine resolves.
    pub allowed_types: Vec<MacroType>,
    /// Assemble `{% ... { %}...{%}%}` blocks into one match.
    pub process_open_expressions: bool,
    /// Culture passed to localization lookups.
    pub culture: String,
    /// Localization cache configuration (None = caching disabled).
    pub cache: Option<CacheConfig>,
    /// Render batches in parallel (requires `parallel` feature).
    pub parallel: bool,
    /// Leave macros no source resolves verbatim instead of removing them.
    pub keep_unresolved: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allowed_types: MacroType::ALL.to_vec(),
            process_open_expressions: true,
            culture: DEFAULT_CULTURE.to_string(),
            cache: None,
            parallel: false,
            keep_unresolved: true,
        }
    }
}

impl EngineConfig {
    /// Creates a new builder for EngineConfig.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Scanner options derived from this configuration.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::builder()
            .with_allowed_types(&self.allowed_types)
            .with_open_expressions(self.process_open_expressions)
            .build()
    }
}

/// Builder for EngineConfig.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Restricts the bracket families the engine resolves.
    pub fn with_allowed_types(mut self, types: &[MacroType]) -> Self {
        self.config.allowed_types = types.to_vec();
        self
    }

    /// Enables or disables block assembly.
    pub fn with_open_expressions(mut self, process: bool) -> Self {
        self.config.process_open_expressions = process;
        self
    }

    /// Sets the localization culture.
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.config.culture = culture.into();
        self
    }

    /// Enables localization caching with the given configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = Some(cache);
        self
    }

    /// Enables or disables parallel batch rendering.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Sets whether unresolved macros stay in the output.
    pub fn with_keep_unresolved(mut self, keep: bool) -> Self {
        self.config.keep_unresolved = keep;
        self
    }

    /// Builds the EngineConfig.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

/// Configuration for the localization cache.
///
/// # Example
///
/// ```rust
/// use cms_macro_engine::CacheConfig;
/// use std::time::Duration;
///
/// let cache = CacheConfig {
///     max_entries: 5_000,
///     ttl: Duration::from_secs(60),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached strings.
    pub max_entries: usize,
    /// Time-to-live for cached strings.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(300),
        }
    }
}
