//! Scan options.

use crate::types::MacroType;

/// Options for one scanner.
///
/// # Example
///
/// ```rust
/// use cms_macro::{MacroType, ScanOptions, NOT_RESOLVE};
///
/// let options = ScanOptions::builder()
///     .with_allowed_types(&[MacroType::Data, MacroType::Localization])
///     .with_open_expressions(false)
///     .with_replacement(NOT_RESOLVE)
///     .build();
///
/// assert!(options.allows(MacroType::Data));
/// assert!(!options.allows(MacroType::Path));
/// ```
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Bracket families the scanner recognizes.
    pub allowed_types: Vec<MacroType>,
    /// Assemble `{% ... { %}...{%}%}` blocks into one match.
    pub process_open_expressions: bool,
    /// Replacement override handed to every context; [`crate::NOT_RESOLVE`]
    /// leaves the text untouched.
    pub replacement: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            allowed_types: MacroType::ALL.to_vec(),
            process_open_expressions: true,
            replacement: None,
        }
    }
}

impl ScanOptions {
    /// Creates a new builder for ScanOptions.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Whether `macro_type` is recognized.
    pub fn allows(&self, macro_type: MacroType) -> bool {
        self.allowed_types.contains(&macro_type)
    }
}

/// Builder for ScanOptions.
#[derive(Debug, Clone, Default)]
pub struct ScanOptionsBuilder {
    allowed_types: Option<Vec<MacroType>>,
    skip_open_expressions: bool,
    replacement: Option<String>,
}

impl ScanOptionsBuilder {
    /// Restricts the recognized bracket families.
    pub fn with_allowed_types(mut self, types: &[MacroType]) -> Self {
        self.allowed_types = Some(types.to_vec());
        self
    }

    /// Enables or disables block assembly.
    pub fn with_open_expressions(mut self, process: bool) -> Self {
        self.skip_open_expressions = !process;
        self
    }

    /// Sets the replacement override.
    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    /// Builds the ScanOptions.
    pub fn build(self) -> ScanOptions {
        ScanOptions {
            allowed_types: self
                .allowed_types
                .unwrap_or_else(|| MacroType::ALL.to_vec()),
            process_open_expressions: !self.skip_open_expressions,
            replacement: self.replacement,
        }
    }
}
