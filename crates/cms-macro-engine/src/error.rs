//! Error types for macro rendering.

use thiserror::Error;

/// Errors that can occur while rendering a template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Error from the macro scanner or its security processor.
    #[error("macro error: {0}")]
    Macro(#[from] cms_macro::MacroError),

    /// A macro source failed to resolve a value.
    #[error("source error: {0}")]
    Source(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
