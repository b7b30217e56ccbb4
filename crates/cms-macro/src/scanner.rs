//! Single-pass macro scanner and rewriter.
//!
//! The scanner walks the text left to right with an explicit cursor. Every
//! `{` is inspected once: it either opens a recognized macro, is part of an
//! unterminated candidate, or is plain text. Matches are handed to a resolver
//! callback and the returned text is spliced into a separate output buffer,
//! so replacements are never scanned again and offsets always refer to the
//! input.
//!
//! ## Bracket forms
//!
//! | Form | Example |
//! |------|---------|
//! | Inline | `{%UserName%}` |
//! | Legacy tagged | `{(1)%Outer {%Inner%} %(1)}` |
//! | Encoded path | `{&amp;/Path&amp;}` |
//! | Block | `{% if (x) { %}body{% } else { %}other{%}%}` |

use nom::{
    bytes::complete::take_till,
    character::complete::char,
    combinator::recognize,
    sequence::delimited,
    IResult,
};

use crate::config::ScanOptions;
use crate::context::MacroContext;
use crate::error::MacroResult;
use crate::helpers::escape_string_literal;
use crate::parameters::MacroProcessingParameters;
use crate::security::{NoSecurity, SecuredExpression, SecurityProcessor};
use crate::types::MacroType;

/// Replacement override that finds macros without rewriting them.
pub const NOT_RESOLVE: &str = "##NOT_RESOLVE##";

const ENCODED_AMPERSAND: &str = "amp;";
const ENCODED_PATH_CLOSER: &str = "&amp;}";
const ELSE_KEYWORD: &str = "else";

static NO_SECURITY: NoSecurity = NoSecurity;

/// Scans text for macros and rewrites them through a resolver.
///
/// # Example
///
/// ```rust
/// use cms_macro::{MacroProcessingParameters, MacroScanner, MacroType, ScanOptions};
///
/// let scanner = MacroScanner::with_options(
///     ScanOptions::builder()
///         .with_allowed_types(&[MacroType::Data])
///         .build(),
/// );
/// let params = MacroProcessingParameters::default();
///
/// let out = scanner
///     .scan("Hello {%UserName%}!", &params, |ctx| ctx.expression().to_uppercase())
///     .unwrap();
/// assert_eq!(out, "Hello USERNAME!");
/// ```
pub struct MacroScanner<'s> {
    options: ScanOptions,
    security: &'s dyn SecurityProcessor,
}

impl Default for MacroScanner<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroScanner<'static> {
    /// Creates a scanner with default options and no security processing.
    pub fn new() -> Self {
        Self::with_options(ScanOptions::default())
    }

    /// Creates a scanner with the given options and no security processing.
    pub fn with_options(options: ScanOptions) -> Self {
        Self {
            options,
            security: &NO_SECURITY,
        }
    }
}

impl<'s> MacroScanner<'s> {
    /// Uses `security` to strip and add data macro security parameters.
    pub fn with_security<'t>(self, security: &'t dyn SecurityProcessor) -> MacroScanner<'t> {
        MacroScanner {
            options: self.options,
            security,
        }
    }

    /// The options this scanner runs with.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scans `text`, resolving every match through `resolver`.
    ///
    /// Malformed brackets are left in place. The only errors are those raised
    /// by the security processor.
    pub fn scan<F>(
        &self,
        text: &str,
        parameters: &MacroProcessingParameters,
        mut resolver: F,
    ) -> MacroResult<String>
    where
        F: FnMut(&MacroContext<'_>) -> String,
    {
        if text.is_empty() {
            return Ok(String::new());
        }

        let replacement = self.options.replacement.as_deref();
        let mut rewriter = Rewriter::new(text, replacement == Some(NOT_RESOLVE));
        let mut block: Option<OpenBlock<'_>> = None;
        let mut cursor = 0;

        while cursor < text.len() {
            let Some(offset) = text[cursor..].find('{') else {
                break;
            };
            let start = cursor + offset;

            let candidate = match read_candidate(text, start, &self.options) {
                Scanned::Macro(candidate) => candidate,
                Scanned::NotMacro => {
                    cursor = start + 1;
                    continue;
                }
                Scanned::Unterminated(macro_type) => {
                    tracing::debug!(%macro_type, start, "unterminated macro left as-is");
                    cursor = start + 1;
                    continue;
                }
            };
            cursor = candidate.end;

            let secured = if candidate.macro_type == MacroType::Data {
                self.security.strip_security_params(candidate.expression)?
            } else {
                SecuredExpression::unsigned(candidate.expression)
            };

            match self.block_step(block.as_ref(), &candidate, secured.expression.trim()) {
                BlockStep::Inline => {
                    let ctx = MacroContext::new(secured.expression, candidate.macro_type)
                        .with_source(text, candidate.start, candidate.end)
                        .with_bracket_type(candidate.bracket_type)
                        .with_replacement(replacement)
                        .with_security(secured.identity, secured.hash)
                        .with_parameters(parameters);
                    let resolved = resolver(&ctx);
                    tracing::trace!(
                        macro_type = %candidate.macro_type,
                        start = candidate.start,
                        end = candidate.end,
                        "resolved macro"
                    );
                    rewriter.splice(candidate.start, candidate.end, &resolved);
                }
                BlockStep::Open => {
                    block = Some(OpenBlock {
                        start: candidate.start,
                        macro_type: candidate.macro_type,
                        bracket_type: candidate.bracket_type,
                        condition: secured.expression.trim().to_string(),
                        body_start: candidate.end,
                        identity: secured.identity,
                        depth: 1,
                    });
                }
                BlockStep::Nest => {
                    if let Some(open) = block.as_mut() {
                        open.depth += 1;
                    }
                }
                BlockStep::Unnest => {
                    if let Some(open) = block.as_mut() {
                        open.depth -= 1;
                    }
                }
                BlockStep::Else => {
                    if let Some(open) = block.as_mut() {
                        let body = &text[open.body_start..candidate.start];
                        open.condition.push_str(&wrap_body(body));
                        open.condition.push_str(secured.expression.trim());
                        open.body_start = candidate.end;
                    }
                }
                BlockStep::Close => {
                    if let Some(open) = block.take() {
                        let body = &text[open.body_start..candidate.start];
                        let mut expression = open.condition;
                        expression.push_str(&wrap_body(body));
                        expression.push_str(secured.expression.trim());

                        let secured = if open.macro_type == MacroType::Data {
                            let identity = parameters
                                .identity()
                                .or(open.identity.as_deref())
                                .or_else(|| parameters.signature_for(&expression));
                            let signed = self.security.add_security_params(
                                &expression,
                                identity,
                                parameters.old_salt(),
                                parameters.decode(),
                            )?;
                            self.security.strip_security_params(&signed)?
                        } else {
                            SecuredExpression::unsigned(expression)
                        };

                        let ctx = MacroContext::new(secured.expression, open.macro_type)
                            .with_source(text, open.start, candidate.end)
                            .with_bracket_type(open.bracket_type)
                            .with_replacement(replacement)
                            .with_open_expression(true)
                            .with_security(secured.identity, secured.hash)
                            .with_parameters(parameters);
                        let resolved = resolver(&ctx);
                        tracing::trace!(
                            macro_type = %open.macro_type,
                            start = open.start,
                            end = candidate.end,
                            "resolved open expression"
                        );
                        rewriter.splice(open.start, candidate.end, &resolved);
                    }
                }
                BlockStep::Skip => {}
                BlockStep::StrayClose => {
                    tracing::debug!(start = candidate.start, "block close without open left as-is");
                }
            }
        }

        if let Some(open) = &block {
            tracing::debug!(
                start = open.start,
                depth = open.depth,
                "unclosed open expression left as-is"
            );
        }

        Ok(rewriter.finish())
    }

    fn block_step(
        &self,
        block: Option<&OpenBlock<'_>>,
        candidate: &Candidate<'_>,
        trimmed: &str,
    ) -> BlockStep {
        if !self.options.process_open_expressions {
            return BlockStep::Inline;
        }

        let opens = trimmed.ends_with('{');
        let closes = trimmed.starts_with('}');

        let Some(open) = block else {
            return if opens {
                BlockStep::Open
            } else if closes {
                BlockStep::StrayClose
            } else {
                BlockStep::Inline
            };
        };

        // Everything inside a block becomes part of its body; only brackets of
        // the block's own type move the nesting depth.
        if candidate.macro_type != open.macro_type {
            return BlockStep::Skip;
        }

        match (closes, opens) {
            // Substring heuristic: a condition or body word containing "else"
            // at depth one is also taken as an else branch.
            (true, true) if open.depth == 1 && trimmed.contains(ELSE_KEYWORD) => BlockStep::Else,
            (true, true) => BlockStep::Skip,
            (false, true) => BlockStep::Nest,
            (true, false) if open.depth == 1 => BlockStep::Close,
            (true, false) => BlockStep::Unnest,
            (false, false) => BlockStep::Skip,
        }
    }
}

/// Scans `text` with a replacement override, an optional type allow-list and
/// no security processing.
///
/// `None` for `allowed_types` recognizes all six families.
pub fn process_macros<F>(
    text: &str,
    replacement: Option<&str>,
    parameters: &MacroProcessingParameters,
    resolver: F,
    allowed_types: Option<&[MacroType]>,
    process_open_expressions: bool,
) -> MacroResult<String>
where
    F: FnMut(&MacroContext<'_>) -> String,
{
    let mut builder = ScanOptions::builder().with_open_expressions(process_open_expressions);
    if let Some(types) = allowed_types {
        builder = builder.with_allowed_types(types);
    }
    if let Some(replacement) = replacement {
        builder = builder.with_replacement(replacement);
    }
    MacroScanner::with_options(builder.build()).scan(text, parameters, resolver)
}

/// What a match does to the block state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockStep {
    Inline,
    Open,
    Nest,
    Unnest,
    Else,
    Close,
    Skip,
    StrayClose,
}

/// A block construct waiting for its closing bracket.
#[derive(Debug)]
struct OpenBlock<'t> {
    start: usize,
    macro_type: MacroType,
    bracket_type: Option<&'t str>,
    condition: String,
    body_start: usize,
    identity: Option<String>,
    depth: usize,
}

/// A bracket pair found in the text.
#[derive(Debug)]
struct Candidate<'t> {
    start: usize,
    end: usize,
    macro_type: MacroType,
    bracket_type: Option<&'t str>,
    expression: &'t str,
}

#[derive(Debug)]
enum Scanned<'t> {
    NotMacro,
    Unterminated(MacroType),
    Macro(Candidate<'t>),
}

fn bracket_tag(input: &str) -> IResult<&str, &str> {
    recognize(delimited(char('('), take_till(|c| c == ')'), char(')')))(input)
}

/// Reads the macro opened by the `{` at `start`.
fn read_candidate<'t>(text: &'t str, start: usize, options: &ScanOptions) -> Scanned<'t> {
    let after = &text[start + 1..];

    let (bracket_type, type_pos) = if after.starts_with('(') {
        match bracket_tag(after) {
            Ok((_, tag)) => (Some(tag), start + 1 + tag.len()),
            Err(_) => return Scanned::NotMacro,
        }
    } else {
        (None, start + 1)
    };

    let Some(type_char) = text[type_pos..].chars().next() else {
        return Scanned::NotMacro;
    };
    let Some(macro_type) = MacroType::from_char(type_char).filter(|&t| options.allows(t)) else {
        return Scanned::NotMacro;
    };

    let mut expression_start = type_pos + type_char.len_utf8();
    let mut closer = format!("{}{}}}", type_char, bracket_type.unwrap_or_default());
    let mut close_pos = None;

    // {&amp;...&amp;} tries the encoded closer first. A plain `&}` search
    // would run past the encoded closer into the next path macro on the
    // page, which HTML editors emit as `{&amp;/A&amp;} {&/B&}`.
    if macro_type == MacroType::Path
        && bracket_type.is_none()
        && text[expression_start..].starts_with(ENCODED_AMPERSAND)
    {
        let encoded_start = expression_start + ENCODED_AMPERSAND.len();
        if let Some(offset) = find_closer(&text[encoded_start..], ENCODED_PATH_CLOSER) {
            expression_start = encoded_start;
            closer = ENCODED_PATH_CLOSER.to_string();
            close_pos = Some(offset);
        }
    }
    if close_pos.is_none() {
        close_pos = find_closer(&text[expression_start..], &closer);
    }

    match close_pos {
        Some(offset) => {
            let expression_end = expression_start + offset;
            Scanned::Macro(Candidate {
                start,
                end: expression_end + closer.len(),
                macro_type,
                bracket_type,
                expression: &text[expression_start..expression_end],
            })
        }
        None => Scanned::Unterminated(macro_type),
    }
}

/// Finds the first closer not escaped as `\X}` inside a parameter value.
fn find_closer(haystack: &str, closer: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(closer) {
        let pos = from + offset;
        if !haystack[..pos].ends_with('\\') {
            return Some(pos);
        }
        // closers start with an ASCII type character
        from = pos + 1;
    }
    None
}

/// Wraps a block body so resolving it evaluates its macros and prints the result.
fn wrap_body(body: &str) -> String {
    format!(" print(ResolveMacros(\"{}\")); ", escape_string_literal(body))
}

/// Output buffer assembled from untouched input slices and replacements.
struct Rewriter<'t> {
    text: &'t str,
    output: String,
    copied: usize,
    read_only: bool,
}

impl<'t> Rewriter<'t> {
    fn new(text: &'t str, read_only: bool) -> Self {
        Self {
            text,
            output: String::with_capacity(if read_only { 0 } else { text.len() }),
            copied: 0,
            read_only,
        }
    }

    /// Replaces `text[start..end]`; spans arrive in increasing order.
    fn splice(&mut self, start: usize, end: usize, replacement: &str) {
        if self.read_only {
            return;
        }
        self.output.push_str(&self.text[self.copied..start]);
        self.output.push_str(replacement);
        self.copied = end;
    }

    fn finish(mut self) -> String {
        if self.read_only {
            return self.text.to_string();
        }
        self.output.push_str(&self.text[self.copied..]);
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{build_macro_parameter, get_parameter};

    fn scan_all(text: &str) -> String {
        let params = MacroProcessingParameters::default();
        MacroScanner::new()
            .scan(text, &params, |ctx| format!("<{}>", ctx.expression()))
            .unwrap()
    }

    #[test]
    fn test_bracket_tag() {
        assert_eq!(bracket_tag("(12)%x").unwrap(), ("%x", "(12)"));
        assert!(bracket_tag("(12%x").is_err());
    }

    #[test]
    fn test_read_candidate_inline() {
        let options = ScanOptions::default();
        match read_candidate("a{%X%}b", 1, &options) {
            Scanned::Macro(c) => {
                assert_eq!((c.start, c.end), (1, 6));
                assert_eq!(c.expression, "X");
                assert_eq!(c.macro_type, MacroType::Data);
                assert!(c.bracket_type.is_none());
            }
            other => panic!("Expected macro, got {:?}", other),
        }
    }

    #[test]
    fn test_read_candidate_tagged() {
        let options = ScanOptions::default();
        let text = "{(1)%A{%B%}%(1)}";
        match read_candidate(text, 0, &options) {
            Scanned::Macro(c) => {
                assert_eq!(c.expression, "A{%B%}");
                assert_eq!(c.bracket_type, Some("(1)"));
                assert_eq!(c.end, text.len());
            }
            other => panic!("Expected macro, got {:?}", other),
        }
    }

    #[test]
    fn test_read_candidate_rejects_disallowed_type() {
        let options = ScanOptions::builder()
            .with_allowed_types(&[MacroType::Localization])
            .build();
        assert!(matches!(read_candidate("{%X%}", 0, &options), Scanned::NotMacro));
    }

    #[test]
    fn test_read_candidate_unterminated() {
        let options = ScanOptions::default();
        assert!(matches!(
            read_candidate("{%unclosed", 0, &options),
            Scanned::Unterminated(MacroType::Data)
        ));
    }

    #[test]
    fn test_plain_braces_survive() {
        assert_eq!(scan_all("fn() { x }"), "fn() { x }");
        assert_eq!(scan_all("{"), "{");
        assert_eq!(scan_all("{("), "{(");
        assert_eq!(scan_all("}{"), "}{");
    }

    #[test]
    fn test_inline_and_neighbours() {
        assert_eq!(scan_all("{%A%}{$B$}"), "<A><B>");
        assert_eq!(scan_all("x{?id?}y"), "x<id>y");
    }

    #[test]
    fn test_encoded_path_before_plain_path() {
        assert_eq!(scan_all("{&amp;/A&amp;} {&/B&}"), "</A> </B>");
    }

    #[test]
    fn test_find_closer_skips_escaped() {
        assert_eq!(find_closer("a\\%}b%}", "%}"), Some(5));
        assert_eq!(find_closer("a\\%}", "%}"), None);
        assert_eq!(find_closer("x%(1)}", "%(1)}"), Some(1));
        assert_eq!(find_closer("\\%(1)}%(1)}", "%(1)}"), Some(6));
    }

    #[test]
    fn test_escaped_closer_stays_in_parameter() {
        let param = build_macro_parameter("default", "a%}b", MacroType::Data).unwrap();
        let text = format!("{{%Body{}%}}!", param);
        let params = MacroProcessingParameters::default();
        let mut seen = Vec::new();
        let out = MacroScanner::new()
            .scan(&text, &params, |ctx| {
                seen.push(ctx.expression().to_string());
                "X".to_string()
            })
            .unwrap();

        assert_eq!(out, "X!");
        assert_eq!(seen.len(), 1);
        assert_eq!(get_parameter(&seen[0], "default").as_deref(), Some("a%}b"));
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(scan_all("[{%%}]"), "[<>]");
    }

    #[test]
    fn test_unterminated_then_valid() {
        assert_eq!(scan_all("{%a {$b$}"), "{%a <b>");
    }

    #[test]
    fn test_wrap_body_escapes() {
        assert_eq!(
            wrap_body("say \"hi\"\n"),
            " print(ResolveMacros(\"say \\\"hi\\\"\\n\")); "
        );
    }

    #[test]
    fn test_block_is_one_match() {
        let out = scan_all("a{% if (x) { %}B{%}%}c");
        assert_eq!(out, "a<if (x) { print(ResolveMacros(\"B\")); }>c");
    }

    #[test]
    fn test_stray_close_left_as_is() {
        assert_eq!(scan_all("a{%}%}b"), "a{%}%}b");
    }

    #[test]
    fn test_unclosed_block_left_as_is() {
        let text = "a{% if (x) { %}B {%Inner%}";
        assert_eq!(scan_all(text), text);
    }

    #[test]
    fn test_blocks_disabled_resolve_each_pair() {
        let params = MacroProcessingParameters::default();
        let scanner = MacroScanner::with_options(
            ScanOptions::builder().with_open_expressions(false).build(),
        );
        let mut count = 0;
        scanner
            .scan("{% if (x) { %}B{%}%}", &params, |_| {
                count += 1;
                String::new()
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_process_macros_function() {
        let params = MacroProcessingParameters::default();
        let out = process_macros(
            "{%A%} {$B$}",
            None,
            &params,
            |_| "x".to_string(),
            Some(&[MacroType::Localization]),
            true,
        )
        .unwrap();
        assert_eq!(out, "{%A%} x");
    }
}
