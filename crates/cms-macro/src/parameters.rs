//! Parameters shared by every match of one top-level scan.

use std::cell::RefCell;
use std::collections::HashMap;

/// Immutable bag of settings for one logical scan call.
///
/// Build a new instance per call; nothing here changes after
/// [`MacroProcessingParametersBuilder::build`] except the collector, which
/// accumulates expressions through a shared reference.
///
/// # Example
///
/// ```rust
/// use cms_macro::MacroProcessingParameters;
///
/// let params = MacroProcessingParameters::builder()
///     .with_identity("administrator")
///     .with_salts("old-salt", "new-salt")
///     .build();
///
/// assert_eq!(params.identity(), Some("administrator"));
/// assert_eq!(params.new_salt(), Some("new-salt"));
/// ```
#[derive(Debug, Default)]
pub struct MacroProcessingParameters {
    signatures: Option<HashMap<String, String>>,
    decode: bool,
    old_salt: Option<String>,
    new_salt: Option<String>,
    collector: Option<RefCell<Vec<String>>>,
    identity: Option<String>,
}

impl MacroProcessingParameters {
    /// Creates a new builder.
    pub fn builder() -> MacroProcessingParametersBuilder {
        MacroProcessingParametersBuilder::default()
    }

    /// Identity recorded for an expression in the signatures table.
    pub fn signature_for(&self, expression: &str) -> Option<&str> {
        self.signatures
            .as_ref()
            .and_then(|s| s.get(expression))
            .map(String::as_str)
    }

    /// Whether expressions are HTML-decoded before they are signed.
    pub fn decode(&self) -> bool {
        self.decode
    }

    /// Salt the current signatures were made with.
    pub fn old_salt(&self) -> Option<&str> {
        self.old_salt.as_deref()
    }

    /// Salt new signatures should be made with.
    pub fn new_salt(&self) -> Option<&str> {
        self.new_salt.as_deref()
    }

    /// Identity to sign as.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Whether this scan collects expressions.
    pub fn is_collecting(&self) -> bool {
        self.collector.is_some()
    }

    /// Appends an expression to the collector. No-op when not collecting.
    pub fn collect(&self, expression: &str) {
        if let Some(collector) = &self.collector {
            collector.borrow_mut().push(expression.to_string());
        }
    }

    /// Expressions collected so far.
    pub fn collected(&self) -> Vec<String> {
        self.collector
            .as_ref()
            .map(|c| c.borrow().clone())
            .unwrap_or_default()
    }
}

/// Builder for [`MacroProcessingParameters`].
#[derive(Debug, Clone, Default)]
pub struct MacroProcessingParametersBuilder {
    signatures: Option<HashMap<String, String>>,
    decode: bool,
    old_salt: Option<String>,
    new_salt: Option<String>,
    collect: bool,
    identity: Option<String>,
}

impl MacroProcessingParametersBuilder {
    /// Sets the expression → identity signatures table.
    pub fn with_signatures(mut self, signatures: HashMap<String, String>) -> Self {
        self.signatures = Some(signatures);
        self
    }

    /// HTML-decode expressions before signing.
    pub fn with_decode(mut self, decode: bool) -> Self {
        self.decode = decode;
        self
    }

    /// Sets the salt pair used when re-signing.
    pub fn with_salts(mut self, old_salt: impl Into<String>, new_salt: impl Into<String>) -> Self {
        self.old_salt = Some(old_salt.into());
        self.new_salt = Some(new_salt.into());
        self
    }

    /// Sets only the current salt.
    pub fn with_old_salt(mut self, salt: impl Into<String>) -> Self {
        self.old_salt = Some(salt.into());
        self
    }

    /// Enables the expression collector.
    pub fn with_collector(mut self) -> Self {
        self.collect = true;
        self
    }

    /// Sets the identity to sign as.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Builds the parameters.
    pub fn build(self) -> MacroProcessingParameters {
        MacroProcessingParameters {
            signatures: self.signatures,
            decode: self.decode,
            old_salt: self.old_salt,
            new_salt: self.new_salt,
            collector: self.collect.then(|| RefCell::new(Vec::new())),
            identity: self.identity,
        }
    }
}
