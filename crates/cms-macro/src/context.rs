//! Per-match processing context handed to the resolver callback.

use crate::error::{MacroError, MacroResult};
use crate::parameters::MacroProcessingParameters;
use crate::types::MacroType;

/// One matched macro occurrence.
///
/// Created by the scanner for every match and dropped as soon as the
/// resolver returns. Offsets refer to the text passed to the scan, not to the
/// text being produced.
#[derive(Debug, Clone)]
pub struct MacroContext<'a> {
    expression: String,
    replacement: Option<&'a str>,
    source_text: Option<&'a str>,
    macro_start: usize,
    macro_end: usize,
    macro_type: MacroType,
    bracket_type: Option<&'a str>,
    is_open_expression: bool,
    identity: Option<String>,
    hash: Option<String>,
    parameters: Option<&'a MacroProcessingParameters>,
}

impl<'a> MacroContext<'a> {
    /// Creates a context for an expression with no source text attached.
    pub fn new(expression: impl Into<String>, macro_type: MacroType) -> Self {
        Self {
            expression: expression.into(),
            replacement: None,
            source_text: None,
            macro_start: 0,
            macro_end: 0,
            macro_type,
            bracket_type: None,
            is_open_expression: false,
            identity: None,
            hash: None,
            parameters: None,
        }
    }

    /// Attaches the scanned text and the span `[start, end)` of this macro in it.
    pub fn with_source(mut self, source_text: &'a str, start: usize, end: usize) -> Self {
        self.source_text = Some(source_text);
        self.macro_start = start;
        self.macro_end = end;
        self
    }

    pub(crate) fn with_bracket_type(mut self, bracket_type: Option<&'a str>) -> Self {
        self.bracket_type = bracket_type;
        self
    }

    pub(crate) fn with_replacement(mut self, replacement: Option<&'a str>) -> Self {
        self.replacement = replacement;
        self
    }

    pub(crate) fn with_open_expression(mut self, open: bool) -> Self {
        self.is_open_expression = open;
        self
    }

    pub(crate) fn with_security(mut self, identity: Option<String>, hash: Option<String>) -> Self {
        self.identity = identity;
        self.hash = hash;
        self
    }

    pub(crate) fn with_parameters(mut self, parameters: &'a MacroProcessingParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// The expression between the brackets, security parameters stripped.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The replacement override given to the scan.
    pub fn replacement(&self) -> Option<&str> {
        self.replacement
    }

    /// Start offset of the macro (its `{`) in the scanned text.
    pub fn macro_start(&self) -> usize {
        self.macro_start
    }

    /// Offset just past the macro's closing `}` in the scanned text.
    pub fn macro_end(&self) -> usize {
        self.macro_end
    }

    /// Bracket family.
    pub fn macro_type(&self) -> MacroType {
        self.macro_type
    }

    /// Legacy bracket tag including its parentheses, e.g. `(1)`.
    pub fn bracket_type(&self) -> Option<&str> {
        self.bracket_type
    }

    /// True for a block construct (`{% if (...) { %}...{%}%}`).
    pub fn is_open_expression(&self) -> bool {
        self.is_open_expression
    }

    /// Identity the expression was signed with.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Integrity hash the expression carried.
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Parameters of the scan this context belongs to.
    pub fn parameters(&self) -> Option<&'a MacroProcessingParameters> {
        self.parameters
    }

    /// The verbatim macro text, brackets included.
    pub fn original_expression(&self) -> MacroResult<&'a str> {
        let source = self.source_text.ok_or_else(|| {
            MacroError::InvalidState("source text of the macro context is not set".to_string())
        })?;
        source.get(self.macro_start..self.macro_end).ok_or_else(|| {
            MacroError::InvalidState(format!(
                "macro span {}..{} is outside the source text",
                self.macro_start, self.macro_end
            ))
        })
    }
}
