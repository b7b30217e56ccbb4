//! Integration tests for the macro engine.

use std::collections::HashMap;
use std::sync::Mutex;

use cms_macro::{HashSignatureProcessor, MacroContext, MacroType, SecurityProcessor};
use cms_macro_engine::{
    CacheConfig, EngineConfig, EngineError, EngineResult, MacroEngine, MacroProcessingParameters,
    MacroSource,
};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// In-memory source for a small storefront page.
#[derive(Default)]
struct StoreSource {
    data: HashMap<&'static str, &'static str>,
    strings: HashMap<(String, String), &'static str>,
    query: HashMap<&'static str, &'static str>,
    cookies: HashMap<&'static str, &'static str>,
    paths: HashMap<&'static str, &'static str>,
    /// `(expression, identity, open)` for every data macro seen.
    data_calls: Mutex<Vec<(String, Option<String>, bool)>>,
}

impl StoreSource {
    fn new() -> Self {
        let mut source = StoreSource::default();
        source.data.insert("OrderCount", "3");
        source.data.insert("CurrentUser.UserName", "ada");
        source.strings.insert(("en-US".into(), "greeting".into()), "World");
        source.strings.insert(("cs-CZ".into(), "greeting".into()), "Světe");
        source.query.insert("page", "2");
        source.cookies.insert("theme", "dark");
        source.paths.insert("/Products", "/products/");
        source
    }
}

impl MacroSource for StoreSource {
    fn resolve_data(&self, ctx: &MacroContext<'_>) -> EngineResult<Option<String>> {
        if let Ok(mut calls) = self.data_calls.lock() {
            calls.push((
                ctx.expression().to_string(),
                ctx.identity().map(str::to_string),
                ctx.is_open_expression(),
            ));
        }
        if ctx.is_open_expression() {
            return Ok(Some("<block>".to_string()));
        }
        Ok(self.data.get(ctx.expression()).map(|v| v.to_string()))
    }

    fn resolve_localization(&self, key: &str, culture: &str) -> EngineResult<Option<String>> {
        let lookup = (culture.to_string(), key.to_string());
        Ok(self.strings.get(&lookup).map(|v| v.to_string()))
    }

    fn resolve_query_string(&self, name: &str) -> EngineResult<Option<String>> {
        Ok(self.query.get(name).map(|v| v.to_string()))
    }

    fn resolve_cookie(&self, name: &str) -> EngineResult<Option<String>> {
        Ok(self.cookies.get(name).map(|v| v.to_string()))
    }

    fn resolve_custom(&self, expression: &str) -> EngineResult<Option<String>> {
        if expression == "broken" {
            return Err(EngineError::Source("custom macro failed".to_string()));
        }
        Ok(None)
    }

    fn resolve_path(&self, path: &str) -> EngineResult<Option<String>> {
        Ok(self.paths.get(path).map(|v| v.to_string()))
    }
}

#[test]
fn test_end_to_end_template() {
    init_tracing();
    let source = StoreSource::new();
    let config = EngineConfig::builder()
        .with_allowed_types(&[MacroType::Localization, MacroType::Data])
        .build();
    let engine = MacroEngine::with_config(&source, config);

    let result = engine
        .render("Hello {$greeting$}, you have {%OrderCount%} orders.")
        .unwrap();

    assert_eq!(result.text, "Hello World, you have 3 orders.");
    assert_eq!(result.stats.resolved, 2);
    assert!(result.is_complete());
}

#[test]
fn test_every_family_reaches_its_source_method() {
    init_tracing();
    let source = StoreSource::new();
    let engine = MacroEngine::new(&source);

    let result = engine
        .render("{?page?}|{@theme@}|{&/Products&}|{&amp;/Products&amp;}|{#other#}")
        .unwrap();

    assert_eq!(result.text, "2|dark|/products/|/products/|{#other#}");
    assert_eq!(result.stats.resolved, 4);
    assert_eq!(result.stats.unresolved, 1);
}

#[test]
fn test_disallowed_types_are_untouched() {
    let source = StoreSource::new();
    let config = EngineConfig::builder()
        .with_allowed_types(&[MacroType::QueryString])
        .build();
    let engine = MacroEngine::with_config(&source, config);

    let result = engine.render("{%OrderCount%} {?page?}").unwrap();
    assert_eq!(result.text, "{%OrderCount%} 2");
    assert_eq!(result.stats.total(), 1);
}

#[test]
fn test_configured_culture() {
    let source = StoreSource::new();
    let config = EngineConfig::builder().with_culture("cs-CZ").build();
    let engine = MacroEngine::with_config(&source, config);

    assert_eq!(engine.render("{$greeting$}").unwrap().text, "Světe");
}

#[test]
fn test_replacement_is_not_rendered_again() {
    struct Echo;

    impl MacroSource for Echo {
        fn resolve_data(&self, _ctx: &MacroContext<'_>) -> EngineResult<Option<String>> {
            Ok(Some("{%Again%}".to_string()))
        }
    }

    let source = Echo;
    let engine = MacroEngine::new(&source);
    let result = engine.render("{%Once%}").unwrap();
    assert_eq!(result.text, "{%Again%}");
    assert_eq!(result.stats.resolved, 1);
}

#[test]
fn test_block_is_one_data_call() {
    init_tracing();
    let source = StoreSource::new();
    let engine = MacroEngine::new(&source);

    let result = engine
        .render("<ul>{% if (x) { %}<li>{%OrderCount%}</li>{%}%}</ul>")
        .unwrap();

    assert_eq!(result.text, "<ul><block></ul>");
    assert_eq!(result.stats.open_expressions, 1);

    let calls = source.data_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].2);
    assert!(calls[0].0.contains("ResolveMacros(\"<li>{%OrderCount%}</li>\")"));
}

#[test]
fn test_signed_macro_exposes_identity() {
    let signer = HashSignatureProcessor::new("site-salt");
    let signed = signer
        .add_security_params("CurrentUser.UserName", Some("editor"), None, false)
        .unwrap();
    let template = format!("User: {{%{}%}}", signed);

    let source = StoreSource::new();
    let engine = MacroEngine::new(&source).with_security(&signer);
    let result = engine.render(&template).unwrap();

    assert_eq!(result.text, "User: ada");
    let calls = source.data_calls.lock().unwrap();
    assert_eq!(calls[0].0, "CurrentUser.UserName");
    assert_eq!(calls[0].1.as_deref(), Some("editor"));
}

#[test]
fn test_render_with_parameters_signs_blocks_as_identity() {
    let signer = HashSignatureProcessor::new("site-salt");
    let params = MacroProcessingParameters::builder()
        .with_identity("administrator")
        .build();

    let source = StoreSource::new();
    let engine = MacroEngine::new(&source).with_security(&signer);
    engine
        .render_with("{% if (true) { %}x{%}%}", &params)
        .unwrap();

    let calls = source.data_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.as_deref(), Some("administrator"));
}

#[test]
fn test_source_error_is_returned() {
    let source = StoreSource::new();
    let engine = MacroEngine::new(&source);
    let err = engine.render("before {#broken#} after").unwrap_err();
    assert_eq!(err, EngineError::Source("custom macro failed".to_string()));
}

#[test]
fn test_cache_spans_renders() {
    let source = StoreSource::new();
    let config = EngineConfig::builder()
        .with_cache(CacheConfig::default())
        .build();
    let engine = MacroEngine::with_config(&source, config);

    let first = engine.render("{$greeting$}").unwrap();
    let second = engine.render("{$greeting$} {$greeting$}").unwrap();

    assert_eq!(first.stats.cache_hits, 0);
    assert_eq!(second.stats.cache_hits, 2);
    assert_eq!(engine.cache().map(|c| c.len()), Some(1));
}

#[test]
fn test_render_many_keeps_order() {
    let source = StoreSource::new();
    let config = EngineConfig::builder().with_parallel(true).build();
    let engine = MacroEngine::with_config(&source, config);

    let results = engine
        .render_many(&["{?page?}", "{@theme@}", "plain", "{%OrderCount%}"])
        .unwrap();

    let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["2", "dark", "plain", "3"]);
}

#[test]
fn test_render_many_returns_first_error() {
    let source = StoreSource::new();
    let engine = MacroEngine::new(&source);
    let err = engine.render_many(&["{?page?}", "{#broken#}"]).unwrap_err();
    assert!(matches!(err, EngineError::Source(_)));
}
