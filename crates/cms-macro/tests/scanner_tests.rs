//! Integration tests for the macro scanner.
//!
//! These cover the observable rewriting behaviour: single pass, malformed
//! tolerance, read-only scans, legacy bracket forms and block assembly.

use cms_macro::{
    find_all_macros, process_macros, HashSignatureProcessor, MacroContext,
    MacroProcessingParameters, MacroScanner, MacroType, ScanOptions, SecurityProcessor,
    NOT_RESOLVE,
};
use pretty_assertions::assert_eq;

/// Snapshot of a context, taken inside the resolver.
#[derive(Debug, Clone, PartialEq)]
struct Seen {
    expression: String,
    macro_type: MacroType,
    start: usize,
    end: usize,
    open: bool,
    bracket_type: Option<String>,
}

impl Seen {
    fn capture(ctx: &MacroContext<'_>) -> Self {
        Seen {
            expression: ctx.expression().to_string(),
            macro_type: ctx.macro_type(),
            start: ctx.macro_start(),
            end: ctx.macro_end(),
            open: ctx.is_open_expression(),
            bracket_type: ctx.bracket_type().map(str::to_string),
        }
    }
}

fn scan_recording(scanner: &MacroScanner<'_>, text: &str) -> (String, Vec<Seen>) {
    let params = MacroProcessingParameters::default();
    let mut seen = Vec::new();
    let out = scanner
        .scan(text, &params, |ctx| {
            seen.push(Seen::capture(ctx));
            format!("[{}]", ctx.expression())
        })
        .unwrap();
    (out, seen)
}

mod single_pass {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_replacement_is_not_rescanned() {
        let params = MacroProcessingParameters::default();
        let mut calls = 0;
        let out = MacroScanner::new()
            .scan("{%A%}", &params, |_| {
                calls += 1;
                "{%B%}".to_string()
            })
            .unwrap();
        assert_eq!(out, "{%B%}");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_text_without_braces_is_identical() {
        let text = "No macros here, just 100% text & symbols $ ? # @";
        let (out, seen) = scan_recording(&MacroScanner::new(), text);
        assert_eq!(out, text);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_empty_text() {
        let (out, seen) = scan_recording(&MacroScanner::new(), "");
        assert_eq!(out, "");
        assert!(seen.is_empty());
    }

    #[test]
    fn test_offsets_refer_to_input() {
        let text = "ab{%X%}cd{$Y$}";
        let params = MacroProcessingParameters::default();
        let mut originals = Vec::new();
        MacroScanner::new()
            .scan(text, &params, |ctx| {
                originals.push(ctx.original_expression().unwrap().to_string());
                "a much longer replacement".to_string()
            })
            .unwrap();
        assert_eq!(originals, vec!["{%X%}", "{$Y$}"]);
    }
}

mod malformed {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unclosed_is_unchanged() {
        let (out, seen) = scan_recording(&MacroScanner::new(), "{%unclosed");
        assert_eq!(out, "{%unclosed");
        assert!(seen.is_empty());
    }

    #[test]
    fn test_unknown_type_is_unchanged() {
        let (out, _) = scan_recording(&MacroScanner::new(), "{!x!} {x}");
        assert_eq!(out, "{!x!} {x}");
    }

    #[test]
    fn test_unclosed_legacy_tag() {
        let (out, _) = scan_recording(&MacroScanner::new(), "{(1%X%} tail");
        assert_eq!(out, "{(1%X%} tail");
    }

    #[test]
    fn test_trailing_brace() {
        let (out, _) = scan_recording(&MacroScanner::new(), "text {%");
        assert_eq!(out, "text {%");
    }
}

mod not_resolve {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_not_resolve_invokes_but_keeps_text() {
        let params = MacroProcessingParameters::default();
        let mut counter = 0;
        let out = process_macros(
            "{%X%}",
            Some(NOT_RESOLVE),
            &params,
            |ctx| {
                assert_eq!(ctx.replacement(), Some(NOT_RESOLVE));
                counter += 1;
                "changed".to_string()
            },
            None,
            true,
        )
        .unwrap();
        assert_eq!(out, "{%X%}");
        assert_eq!(counter, 1);
    }

    #[test]
    fn test_not_resolve_visits_every_macro() {
        let params = MacroProcessingParameters::default();
        let scanner = MacroScanner::with_options(
            ScanOptions::builder().with_replacement(NOT_RESOLVE).build(),
        );
        let text = "{%A%} {$B$} {?C?}";
        let mut count = 0;
        let out = scanner
            .scan(text, &params, |_| {
                count += 1;
                String::new()
            })
            .unwrap();
        assert_eq!(out, text);
        assert_eq!(count, 3);
    }
}

mod bracket_forms {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encoded_path_matches_plain_path() {
        let scanner = MacroScanner::with_options(
            ScanOptions::builder()
                .with_allowed_types(&[MacroType::Path])
                .build(),
        );
        let (plain_out, plain) = scan_recording(&scanner, "{&MacroBody&}");
        let (encoded_out, encoded) = scan_recording(&scanner, "{&amp;MacroBody&amp;}");

        assert_eq!(plain_out, "[MacroBody]");
        assert_eq!(encoded_out, "[MacroBody]");
        assert_eq!(plain[0].expression, encoded[0].expression);
        assert_eq!(encoded[0].start, 0);
        assert_eq!(encoded[0].end, "{&amp;MacroBody&amp;}".len());
    }

    #[test]
    fn test_legacy_tag_allows_nesting() {
        let text = "{(1)%Outer({%Inner%})%(1)}";
        let (out, seen) = scan_recording(&MacroScanner::new(), text);
        assert_eq!(out, "[Outer({%Inner%})]");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].bracket_type.as_deref(), Some("(1)"));
        assert_eq!(seen[0].end, text.len());
    }

    #[test]
    fn test_allowed_types_filter() {
        let scanner = MacroScanner::with_options(
            ScanOptions::builder()
                .with_allowed_types(&[MacroType::QueryString])
                .build(),
        );
        let (out, seen) = scan_recording(&scanner, "{%A%}{?B?}{$C$}");
        assert_eq!(out, "{%A%}[B]{$C$}");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].macro_type, MacroType::QueryString);
    }
}

mod open_expressions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_is_one_logical_unit() {
        let text = "{% if (true) { %}BODY{%}%}";
        let (_, seen) = scan_recording(&MacroScanner::new(), text);
        assert_eq!(seen.len(), 1);
        assert!(seen[0].open);
        assert_eq!(seen[0].start, 0);
        assert_eq!(seen[0].end, text.len());
        assert_eq!(
            seen[0].expression,
            "if (true) { print(ResolveMacros(\"BODY\")); }"
        );
    }

    #[test]
    fn test_block_surrounding_text_kept() {
        let (out, _) = scan_recording(&MacroScanner::new(), "<p>{% if (x) { %}y{%}%}</p>");
        assert_eq!(out, "<p>[if (x) { print(ResolveMacros(\"y\")); }]</p>");
    }

    #[test]
    fn test_else_branch_joins_the_block() {
        let text = "{% if (a) { %}A{% } else { %}B{%}%}";
        let (_, seen) = scan_recording(&MacroScanner::new(), text);
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].expression,
            "if (a) { print(ResolveMacros(\"A\")); } else { print(ResolveMacros(\"B\")); }"
        );
        assert_eq!(seen[0].end, text.len());
    }

    #[test]
    fn test_nested_blocks_stay_in_body() {
        let text = "{% if (a) { %}x{% if (b) { %}y{%}%}z{%}%}";
        let (_, seen) = scan_recording(&MacroScanner::new(), text);
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].expression,
            "if (a) { print(ResolveMacros(\"x{% if (b) { %}y{%}%}z\")); }"
        );
    }

    #[test]
    fn test_inner_macros_are_not_resolved_separately() {
        let text = "{% if (a) { %}Hi {%Name%} {$key$}{%}%} after {%Tail%}";
        let (out, seen) = scan_recording(&MacroScanner::new(), text);
        assert_eq!(seen.len(), 2);
        assert!(seen[0].open);
        assert_eq!(seen[1].expression, "Tail");
        assert!(out.ends_with(" after [Tail]"));
    }

    #[test]
    fn test_body_with_quotes_is_escaped() {
        let text = "{% if (a) { %}say \"hi\"{%}%}";
        let (_, seen) = scan_recording(&MacroScanner::new(), text);
        assert_eq!(
            seen[0].expression,
            "if (a) { print(ResolveMacros(\"say \\\"hi\\\"\")); }"
        );
    }

    #[test]
    fn test_block_is_resigned() {
        let signer = HashSignatureProcessor::new("salt");
        let condition = signer
            .add_security_params(" if (a) { ", Some("editor"), None, false)
            .unwrap();
        let text = format!("{{%{}%}}B{{%}}%}}", condition);

        let params = MacroProcessingParameters::default();
        let scanner = MacroScanner::new().with_security(&signer);
        let mut seen = Vec::new();
        scanner
            .scan(&text, &params, |ctx| {
                seen.push((
                    ctx.expression().to_string(),
                    ctx.identity().map(str::to_string),
                    ctx.hash().map(str::to_string),
                ));
                String::new()
            })
            .unwrap();

        assert_eq!(seen.len(), 1);
        let (expression, identity, hash) = &seen[0];
        assert_eq!(expression, "if (a) { print(ResolveMacros(\"B\")); }");
        assert_eq!(identity.as_deref(), Some("editor"));
        let expected = signer.compute_hash(expression, Some("editor"), None);
        assert_eq!(hash.as_deref(), Some(expected.as_str()));
    }
}

mod security {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_macro_security_params_are_stripped() {
        let signer = HashSignatureProcessor::new("salt");
        let signed = signer
            .add_security_params("CurrentUser.UserName", Some("admin"), None, false)
            .unwrap();
        let text = format!("{{%{}%}}", signed);

        let params = MacroProcessingParameters::default();
        let mut seen = None;
        MacroScanner::new()
            .with_security(&signer)
            .scan(&text, &params, |ctx| {
                seen = Some((ctx.expression().to_string(), ctx.identity().map(str::to_string)));
                String::new()
            })
            .unwrap();

        let (expression, identity) = seen.unwrap();
        assert_eq!(expression, "CurrentUser.UserName");
        assert_eq!(identity.as_deref(), Some("admin"));
    }

    #[test]
    fn test_other_types_keep_parameters() {
        let signer = HashSignatureProcessor::new("salt");
        let params = MacroProcessingParameters::default();
        let out = MacroScanner::new()
            .with_security(&signer)
            .scan("{$key|(hash)x$}", &params, |ctx| ctx.expression().to_string())
            .unwrap();
        assert_eq!(out, "key|(hash)x");
    }
}

#[test]
fn test_find_all_macros_collects_expressions() {
    let list = find_all_macros("{%A%} text {$b.c$} {?id?}", None).unwrap();
    assert_eq!(list, "A;b.c;id");
}

#[test]
fn test_end_to_end_template() {
    let params = MacroProcessingParameters::default();
    let out = process_macros(
        "Hello {$greeting$}, you have {%OrderCount%} orders.",
        None,
        &params,
        |ctx| match (ctx.macro_type(), ctx.expression()) {
            (MacroType::Localization, "greeting") => "World".to_string(),
            (MacroType::Data, "OrderCount") => "3".to_string(),
            _ => String::new(),
        },
        Some(&[MacroType::Localization, MacroType::Data]),
        true,
    )
    .unwrap();
    assert_eq!(out, "Hello World, you have 3 orders.");
}
