//! Operations built on top of the scanner.

use crate::config::ScanOptions;
use crate::context::MacroContext;
use crate::error::{MacroError, MacroResult};
use crate::helpers::{html_decode, parse_parameters};
use crate::parameters::MacroProcessingParameters;
use crate::scanner::MacroScanner;
use crate::security::{SecuredExpression, SecurityProcessor};
use crate::types::MacroType;

/// Separator of the list returned by [`find_all_macros`].
pub const MACRO_LIST_SEPARATOR: &str = ";";

/// Collects the expressions of every macro in `text`, joined with `;`.
///
/// With `simple` set, only expressions it accepts are collected.
///
/// ```rust
/// use cms_macro::{find_all_macros, is_simple_expression};
///
/// let text = "{%UserName%} {$general.ok$} {%Count + 1%}";
/// assert_eq!(find_all_macros(text, None).unwrap(), "UserName;general.ok;Count + 1");
/// assert_eq!(
///     find_all_macros(text, Some(&is_simple_expression)).unwrap(),
///     "UserName;general.ok"
/// );
/// ```
pub fn find_all_macros(text: &str, simple: Option<&dyn Fn(&str) -> bool>) -> MacroResult<String> {
    let params = MacroProcessingParameters::builder().with_collector().build();
    MacroScanner::new().scan(text, &params, |ctx| {
        let expression = ctx.expression();
        if simple.map_or(true, |is_simple| is_simple(expression)) {
            if let Some(p) = ctx.parameters() {
                p.collect(expression);
            }
        }
        String::new()
    })?;
    Ok(params.collected().join(MACRO_LIST_SEPARATOR))
}

/// Checks whether an expression is a plain dotted name such as `CurrentUser.UserName`.
///
/// Trailing `|(name)value` parameters are ignored.
pub fn is_simple_expression(expression: &str) -> bool {
    let body = parse_parameters(expression).body.trim();
    !body.is_empty()
        && body
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

/// Replaces every macro in `text` with `replacement`.
pub fn remove_macros(text: &str, replacement: &str) -> MacroResult<String> {
    let params = MacroProcessingParameters::default();
    MacroScanner::new().scan(text, &params, |_| replacement.to_string())
}

/// HTML-decodes every macro in `text`, leaving the surrounding text encoded.
///
/// Block constructs are not assembled; each bracket pair is decoded on its own.
pub fn decode_macros(text: &str) -> MacroResult<String> {
    let params = MacroProcessingParameters::default();
    let scanner =
        MacroScanner::with_options(ScanOptions::builder().with_open_expressions(false).build());
    scanner.scan(text, &params, |ctx| match ctx.original_expression() {
        Ok(original) => html_decode(original),
        Err(_) => html_decode(ctx.expression()),
    })
}

/// Re-signs every signed data macro in `text` with the new salt.
///
/// The identity signed as is the parameters' identity, then the identity the
/// macro already carried, then the signatures table entry for the expression.
/// Unsigned macros are left untouched. A macro whose hash does not verify
/// against the old salt fails the refresh with
/// [`MacroError::InvalidSignature`].
pub fn refresh_security_params(
    text: &str,
    processor: &dyn SecurityProcessor,
    params: &MacroProcessingParameters,
) -> MacroResult<String> {
    let scanner = MacroScanner::with_options(
        ScanOptions::builder()
            .with_allowed_types(&[MacroType::Data])
            .with_open_expressions(false)
            .build(),
    )
    .with_security(processor);

    let mut failure: Option<MacroError> = None;
    let refreshed = scanner.scan(text, params, |ctx| {
        match resign(ctx, processor, params) {
            Ok(Some(signed)) => signed,
            Ok(None) => ctx.original_expression().unwrap_or_default().to_string(),
            Err(e) => {
                failure.get_or_insert(e);
                ctx.original_expression().unwrap_or_default().to_string()
            }
        }
    })?;

    match failure {
        Some(e) => Err(e),
        None => Ok(refreshed),
    }
}

fn resign(
    ctx: &MacroContext<'_>,
    processor: &dyn SecurityProcessor,
    params: &MacroProcessingParameters,
) -> MacroResult<Option<String>> {
    let Some(hash) = ctx.hash() else {
        return Ok(None);
    };

    let current = SecuredExpression {
        expression: ctx.expression().to_string(),
        identity: ctx.identity().map(str::to_string),
        hash: Some(hash.to_string()),
    };
    if !processor.verify(&current, params.old_salt()) {
        tracing::debug!(expression = ctx.expression(), "signature does not verify");
        return Err(MacroError::InvalidSignature {
            expression: current.expression,
        });
    }

    let identity = params
        .identity()
        .or(ctx.identity())
        .or_else(|| params.signature_for(ctx.expression()));
    let signed = processor.add_security_params(
        ctx.expression(),
        identity,
        params.new_salt(),
        params.decode(),
    )?;

    let tag = ctx.bracket_type().unwrap_or_default();
    let c = ctx.macro_type().as_char();
    Ok(Some(format!("{{{tag}{c}{signed}{c}{tag}}}")))
}
