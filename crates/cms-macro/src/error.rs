//! Error types for macro processing.

use thiserror::Error;

/// Errors that can occur while processing macros.
///
/// Malformed macro text is never an error: the scanner leaves it in place.
/// These variants cover misuse of a context and failures raised by the
/// security collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    /// A context was asked for state it was never given.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The security processor failed to strip or add security parameters.
    #[error("security processing failed: {0}")]
    Security(String),

    /// A signed expression does not match its hash.
    #[error("invalid signature for expression '{expression}'")]
    InvalidSignature {
        /// The expression whose signature did not verify.
        expression: String,
    },

    /// A parameter name cannot be used in the `|(name)value` grammar.
    #[error("invalid macro parameter name: '{0}'")]
    InvalidParameterName(String),
}

/// Result type for macro operations.
pub type MacroResult<T> = std::result::Result<T, MacroError>;
