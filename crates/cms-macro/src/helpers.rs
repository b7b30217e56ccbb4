//! String helpers that work on macro text without running the scanner.
//!
//! These cover bracket detection, neutralizing macros, string-literal and
//! HTML entity handling, and the `|(name)value` parameter suffix grammar
//! that trails a macro expression.

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::char,
    sequence::delimited,
    IResult,
};

use crate::error::{MacroError, MacroResult};
use crate::types::MacroType;

/// A named parameter parsed from an expression suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroParameter {
    /// Parameter name, as written between `|(` and `)`.
    pub name: String,
    /// Unescaped parameter value.
    pub value: String,
}

/// An expression split into its body and trailing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression<'a> {
    /// Everything before the first parameter.
    pub body: &'a str,
    /// Parameters in the order they appear.
    pub parameters: Vec<MacroParameter>,
}

/// Checks whether both the open and close bracket of `macro_type` occur in `text`.
pub fn contains_macro_type(text: &str, macro_type: MacroType) -> bool {
    text.contains(&macro_type.open_bracket()) && text.contains(&macro_type.close_bracket())
}

/// Checks whether `text` contains a bracket pair of any supported type.
pub fn contains_any_macro(text: &str) -> bool {
    MacroType::ALL
        .iter()
        .any(|&t| contains_macro_type(text, t))
}

/// Checks whether the whole trimmed string is exactly one localization macro.
///
/// `{$general.ok$}` qualifies, `Click {$general.ok$}` and
/// `{$a$} {$b$}` do not.
pub fn is_localization_macro(text: &str) -> bool {
    let text = text.trim();
    let open = MacroType::Localization.open_bracket();
    let close = MacroType::Localization.close_bracket();

    if text.len() < open.len() + close.len() || !text.starts_with(&open) || !text.ends_with(&close)
    {
        return false;
    }

    let inner = &text[open.len()..text.len() - close.len()];
    !inner.contains(&open) && !inner.contains(&close)
}

/// Neutralizes every macro in `text` by spacing out its brackets.
///
/// `{%X%}` becomes `{ %X% }`, which the scanner no longer recognizes.
pub fn encode_macro(text: &str) -> String {
    let mut result = text.to_string();
    for t in MacroType::ALL {
        let c = t.as_char();
        result = result
            .replace(&t.open_bracket(), &format!("{{ {}", c))
            .replace(&t.close_bracket(), &format!("{} }}", c));
    }
    result
}

/// Reverses [`encode_macro`].
pub fn decode_encoded_macro(text: &str) -> String {
    let mut result = text.to_string();
    for t in MacroType::ALL {
        let c = t.as_char();
        result = result
            .replace(&format!("{{ {}", c), &t.open_bracket())
            .replace(&format!("{} }}", c), &t.close_bracket());
    }
    result
}

/// Escapes text so it can be embedded in a double-quoted string literal.
pub fn escape_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Decodes HTML entities (named basics plus decimal and hex references).
///
/// Unknown or malformed entities are left untouched.
pub fn html_decode(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_entity(tail) {
            Some((c, len)) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(s: &str) -> Option<(char, usize)> {
    let semi = s.find(';').filter(|&i| i > 1 && i <= 10)?;
    let name = &s[1..semi];
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some((c, semi + 1))
}

// ============================================================================
// Parameter suffix grammar: |(name)value|(name)value...
// ============================================================================

/// Builds a `|(name)value` parameter for an expression of `macro_type`.
///
/// The value is escaped so it cannot split the expression or close the
/// macro early: `|` becomes `\|`, line breaks become `\n` and the type's
/// closing token (`%}` for data macros) gets its type character escaped.
pub fn build_macro_parameter(
    name: &str,
    value: &str,
    macro_type: MacroType,
) -> MacroResult<String> {
    if name.is_empty() || !name.chars().all(is_param_name_char) {
        return Err(MacroError::InvalidParameterName(name.to_string()));
    }
    Ok(format!("|({}){}", name, escape_parameter_value(value, macro_type)))
}

/// Escapes a parameter value for `macro_type`.
pub fn escape_parameter_value(value: &str, macro_type: MacroType) -> String {
    let close = macro_type.close_bracket();
    value
        .replace('|', "\\|")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
        .replace(&close, &format!("\\{}", close))
}

/// Reverses [`escape_parameter_value`] for any macro type.
pub fn unescape_parameter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('|') => {
                out.push('|');
                chars.next();
            }
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some(t) if MacroType::from_char(t).is_some() => {
                // Only `\X}` is an escape; a lone `\X` stays literal.
                let mut lookahead = chars.clone();
                lookahead.next();
                if lookahead.peek() == Some(&'}') {
                    out.push(t);
                    chars.next();
                } else {
                    out.push('\\');
                }
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// Splits an expression into its body and trailing named parameters.
pub fn parse_parameters(expression: &str) -> ParsedExpression<'_> {
    let spans = parameter_spans(expression);
    let body_end = spans.first().map_or(expression.len(), |s| s.start);

    let parameters = spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let end = spans.get(i + 1).map_or(expression.len(), |next| next.start);
            MacroParameter {
                name: span.name.to_string(),
                value: unescape_parameter_value(&expression[span.value_start..end]),
            }
        })
        .collect();

    ParsedExpression {
        body: &expression[..body_end],
        parameters,
    }
}

/// Returns the unescaped value of parameter `name` (case-insensitive).
pub fn get_parameter(expression: &str, name: &str) -> Option<String> {
    parse_parameters(expression)
        .parameters
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| p.value)
}

/// Removes every `|(name)value` occurrence of parameter `name` (case-insensitive).
pub fn remove_parameter(expression: &str, name: &str) -> String {
    let spans = parameter_spans(expression);
    if !spans.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
        return expression.to_string();
    }

    let mut out = String::with_capacity(expression.len());
    let mut copied_to = 0;
    for (i, span) in spans.iter().enumerate() {
        if !span.name.eq_ignore_ascii_case(name) {
            continue;
        }
        let end = spans.get(i + 1).map_or(expression.len(), |next| next.start);
        out.push_str(&expression[copied_to..span.start]);
        copied_to = end;
    }
    out.push_str(&expression[copied_to..]);
    out
}

#[derive(Debug)]
struct ParameterSpan<'a> {
    start: usize,
    value_start: usize,
    name: &'a str,
}

fn is_param_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn parameter_header(input: &str) -> IResult<&str, &str> {
    delimited(tag("|("), take_while1(is_param_name_char), char(')'))(input)
}

fn parameter_spans(expression: &str) -> Vec<ParameterSpan<'_>> {
    let bytes = expression.as_bytes();
    let mut spans = Vec::new();
    let mut from = 0;

    while let Some(offset) = expression[from..].find("|(") {
        let pos = from + offset;
        let escaped = pos > 0 && bytes[pos - 1] == b'\\';
        if !escaped {
            if let Ok((rest, name)) = parameter_header(&expression[pos..]) {
                spans.push(ParameterSpan {
                    start: pos,
                    value_start: expression.len() - rest.len(),
                    name,
                });
            }
        }
        from = pos + 1;
    }

    spans
}
