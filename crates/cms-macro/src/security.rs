//! Security parameters carried by data macros.
//!
//! A signed data macro ends with `|(identity)NAME|(hash)HEX`. The scanner
//! strips that suffix before handing the expression to the resolver, and
//! re-signs block expressions it assembles from several bracket pairs.

use sha2::{Digest, Sha256};

use crate::error::MacroResult;
use crate::helpers::{build_macro_parameter, get_parameter, html_decode, remove_parameter};
use crate::types::MacroType;

/// Name of the identity parameter.
pub const IDENTITY_PARAMETER: &str = "identity";

/// Legacy name of the identity parameter.
pub const USER_PARAMETER: &str = "user";

/// Name of the hash parameter.
pub const HASH_PARAMETER: &str = "hash";

/// An expression with its security parameters split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuredExpression {
    /// The expression without security parameters.
    pub expression: String,
    /// Identity the expression was signed as.
    pub identity: Option<String>,
    /// Integrity hash.
    pub hash: Option<String>,
}

impl SecuredExpression {
    /// An expression that carries no security parameters.
    pub fn unsigned(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            identity: None,
            hash: None,
        }
    }
}

/// Strips and adds the security suffix of data macro expressions.
///
/// Errors raised here propagate out of the scan unchanged.
pub trait SecurityProcessor: Send + Sync {
    /// Splits the security parameters off an expression.
    fn strip_security_params(&self, expression: &str) -> MacroResult<SecuredExpression>;

    /// Signs an expression as `identity` with `salt`.
    ///
    /// With `decode` set the expression is HTML-decoded before signing.
    fn add_security_params(
        &self,
        expression: &str,
        identity: Option<&str>,
        salt: Option<&str>,
        decode: bool,
    ) -> MacroResult<String>;

    /// Checks a stripped expression against its hash signed with `salt`.
    fn verify(&self, secured: &SecuredExpression, salt: Option<&str>) -> bool;
}

/// Leaves expressions untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecurity;

impl SecurityProcessor for NoSecurity {
    fn strip_security_params(&self, expression: &str) -> MacroResult<SecuredExpression> {
        Ok(SecuredExpression::unsigned(expression))
    }

    fn add_security_params(
        &self,
        expression: &str,
        _identity: Option<&str>,
        _salt: Option<&str>,
        _decode: bool,
    ) -> MacroResult<String> {
        Ok(expression.to_string())
    }

    fn verify(&self, _secured: &SecuredExpression, _salt: Option<&str>) -> bool {
        true
    }
}

/// Signs expressions with a salted SHA-256 hash.
///
/// # Example
///
/// ```rust
/// use cms_macro::{HashSignatureProcessor, SecurityProcessor};
///
/// let signer = HashSignatureProcessor::new("salt");
/// let signed = signer
///     .add_security_params("CurrentUser.UserName", Some("admin"), None, false)
///     .unwrap();
/// assert!(signed.starts_with("CurrentUser.UserName|(identity)admin|(hash)"));
///
/// let secured = signer.strip_security_params(&signed).unwrap();
/// assert_eq!(secured.expression, "CurrentUser.UserName");
/// assert!(signer.verify(&secured, None));
/// ```
#[derive(Debug, Clone)]
pub struct HashSignatureProcessor {
    salt: String,
}

impl HashSignatureProcessor {
    /// Creates a signer whose default salt is `salt`.
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// Computes the hash for an expression signed as `identity`.
    pub fn compute_hash(
        &self,
        expression: &str,
        identity: Option<&str>,
        salt: Option<&str>,
    ) -> String {
        let salt = salt.unwrap_or(&self.salt);
        let mut hasher = Sha256::new();
        hasher.update(identity.unwrap_or_default().as_bytes());
        hasher.update(b"|");
        hasher.update(salt.as_bytes());
        hasher.update(b"|");
        hasher.update(expression.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl SecurityProcessor for HashSignatureProcessor {
    fn strip_security_params(&self, expression: &str) -> MacroResult<SecuredExpression> {
        let hash = get_parameter(expression, HASH_PARAMETER);
        let identity = get_parameter(expression, IDENTITY_PARAMETER)
            .or_else(|| get_parameter(expression, USER_PARAMETER));

        if hash.is_none() && identity.is_none() {
            return Ok(SecuredExpression::unsigned(expression));
        }

        let mut stripped = remove_parameter(expression, HASH_PARAMETER);
        stripped = remove_parameter(&stripped, IDENTITY_PARAMETER);
        stripped = remove_parameter(&stripped, USER_PARAMETER);

        Ok(SecuredExpression {
            expression: stripped,
            identity,
            hash,
        })
    }

    fn add_security_params(
        &self,
        expression: &str,
        identity: Option<&str>,
        salt: Option<&str>,
        decode: bool,
    ) -> MacroResult<String> {
        let expression = if decode {
            html_decode(expression)
        } else {
            expression.to_string()
        };
        let unsigned = self.strip_security_params(&expression)?.expression;
        let hash = self.compute_hash(&unsigned, identity, salt);

        let mut signed = unsigned;
        if let Some(identity) = identity {
            signed.push_str(&build_macro_parameter(
                IDENTITY_PARAMETER,
                identity,
                MacroType::Data,
            )?);
        }
        signed.push_str(&build_macro_parameter(HASH_PARAMETER, &hash, MacroType::Data)?);
        Ok(signed)
    }

    fn verify(&self, secured: &SecuredExpression, salt: Option<&str>) -> bool {
        match &secured.hash {
            Some(hash) => {
                let expected =
                    self.compute_hash(&secured.expression, secured.identity.as_deref(), salt);
                expected.eq_ignore_ascii_case(hash)
            }
            None => false,
        }
    }
}
