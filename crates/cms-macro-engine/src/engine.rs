//! Macro engine implementation.

use std::time::Instant;

use cms_macro::{
    get_parameter, parse_parameters, MacroContext, MacroProcessingParameters, MacroScanner,
    MacroType, NoSecurity, SecurityProcessor,
};

use crate::cache::LocalizationCache;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::result::{RenderResult, RenderStats};
use crate::traits::MacroSource;

/// Parameter that overrides the culture of one localization macro.
pub const CULTURE_PARAMETER: &str = "culture";

static NO_SECURITY: NoSecurity = NoSecurity;

/// Renders templates by resolving their macros against a [`MacroSource`].
///
/// Each render is one independent scan. Macros the source does not know
/// stay in the text unless [`EngineConfig::keep_unresolved`] is off. The
/// first error a source returns aborts the render.
///
/// # Example
///
/// ```rust
/// use cms_macro::MacroContext;
/// use cms_macro_engine::{EngineResult, MacroEngine, MacroSource};
///
/// struct Greeter;
///
/// impl MacroSource for Greeter {
///     fn resolve_data(&self, context: &MacroContext<'_>) -> EngineResult<Option<String>> {
///         Ok((context.expression() == "Name").then(|| "Ada".to_string()))
///     }
/// }
///
/// let source = Greeter;
/// let engine = MacroEngine::new(&source);
/// let result = engine.render("Hi {%Name%}, {%Unknown%}").unwrap();
///
/// assert_eq!(result.text, "Hi Ada, {%Unknown%}");
/// assert_eq!(result.stats.resolved, 1);
/// assert_eq!(result.stats.unresolved, 1);
/// ```
pub struct MacroEngine<'a> {
    /// Source of macro values.
    source: &'a dyn MacroSource,
    /// Engine configuration.
    config: EngineConfig,
    /// Processor for data macro security parameters.
    security: &'a dyn SecurityProcessor,
    /// Localization cache (optional).
    cache: Option<LocalizationCache>,
}

impl<'a> MacroEngine<'a> {
    /// Creates an engine with default configuration.
    pub fn new(source: &'a dyn MacroSource) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    /// Creates an engine with custom configuration.
    pub fn with_config(source: &'a dyn MacroSource, config: EngineConfig) -> Self {
        let cache = config.cache.clone().map(LocalizationCache::new);
        Self {
            source,
            config,
            security: &NO_SECURITY,
            cache,
        }
    }

    /// Uses `security` to strip and re-sign data macro security parameters.
    pub fn with_security(mut self, security: &'a dyn SecurityProcessor) -> Self {
        self.security = security;
        self
    }

    /// Returns a reference to the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns a reference to the localization cache if enabled.
    pub fn cache(&self) -> Option<&LocalizationCache> {
        self.cache.as_ref()
    }

    /// Renders one template with default processing parameters.
    pub fn render(&self, text: &str) -> EngineResult<RenderResult> {
        self.render_with(text, &MacroProcessingParameters::default())
    }

    /// Renders one template with the given processing parameters.
    pub fn render_with(
        &self,
        text: &str,
        parameters: &MacroProcessingParameters,
    ) -> EngineResult<RenderResult> {
        let start = Instant::now();
        let scanner =
            MacroScanner::with_options(self.config.scan_options()).with_security(self.security);

        let mut stats = RenderStats::default();
        let mut failure: Option<EngineError> = None;

        let rendered = scanner.scan(text, parameters, |ctx| {
            if failure.is_some() {
                return original_text(ctx);
            }
            if ctx.is_open_expression() {
                stats.open_expressions += 1;
            }
            match self.resolve(ctx, &mut stats) {
                Ok(Some(value)) => {
                    stats.resolved += 1;
                    value
                }
                Ok(None) => {
                    stats.unresolved += 1;
                    if self.config.keep_unresolved {
                        original_text(ctx)
                    } else {
                        String::new()
                    }
                }
                Err(err) => {
                    failure = Some(err);
                    original_text(ctx)
                }
            }
        })?;

        if let Some(err) = failure {
            tracing::debug!(error = %err, "render aborted by macro source");
            return Err(err);
        }

        stats.elapsed = start.elapsed();
        tracing::debug!(
            resolved = stats.resolved,
            unresolved = stats.unresolved,
            open_expressions = stats.open_expressions,
            cache_hits = stats.cache_hits,
            elapsed = ?stats.elapsed,
            "rendered template"
        );

        Ok(RenderResult::new(rendered, stats))
    }

    /// Renders several templates, each with an independent scan.
    ///
    /// With the `parallel` feature and [`EngineConfig::parallel`] set the
    /// templates are rendered on the rayon thread pool. Results keep the
    /// input order; the first error is returned.
    pub fn render_many(&self, texts: &[&str]) -> EngineResult<Vec<RenderResult>> {
        #[cfg(feature = "parallel")]
        {
            if self.config.parallel {
                use rayon::prelude::*;
                return texts.par_iter().map(|text| self.render(text)).collect();
            }
        }

        texts.iter().map(|text| self.render(text)).collect()
    }

    fn resolve(
        &self,
        ctx: &MacroContext<'_>,
        stats: &mut RenderStats,
    ) -> EngineResult<Option<String>> {
        let expression = ctx.expression();
        match ctx.macro_type() {
            MacroType::Data => self.source.resolve_data(ctx),
            MacroType::Localization => self.localize(expression, stats),
            MacroType::QueryString => self.source.resolve_query_string(expression.trim()),
            MacroType::Cookie => self.source.resolve_cookie(expression.trim()),
            MacroType::Custom => self.source.resolve_custom(expression),
            MacroType::Path => self.source.resolve_path(expression.trim()),
        }
    }

    /// Looks up `{$key|(culture)xx-XX$}`, going through the cache when enabled.
    fn localize(&self, expression: &str, stats: &mut RenderStats) -> EngineResult<Option<String>> {
        let key = parse_parameters(expression).body.trim();
        let culture_override = get_parameter(expression, CULTURE_PARAMETER);
        let culture = culture_override.as_deref().unwrap_or(&self.config.culture);

        let Some(cache) = &self.cache else {
            return self.source.resolve_localization(key, culture);
        };

        if let Some(hit) = cache.get(culture, key) {
            tracing::trace!(culture, key, "localization cache hit");
            stats.cache_hits += 1;
            return Ok(hit);
        }

        tracing::trace!(culture, key, "localization cache miss");
        let value = self.source.resolve_localization(key, culture)?;
        cache.set(culture, key, value.clone());
        Ok(value)
    }
}

impl std::fmt::Debug for MacroEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroEngine")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn original_text(ctx: &MacroContext<'_>) -> String {
    ctx.original_expression()
        .map(str::to_string)
        .unwrap_or_default()
}
