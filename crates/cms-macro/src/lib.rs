//! # cms-macro
//!
//! A scanner and rewriter for the bracketed macros embedded in CMS templates.
//!
//! This crate provides:
//! - **Macro Scanner**: Find macros of six bracket families in free text and
//!   splice resolver output back in a single left-to-right pass
//! - **Block assembly**: Turn `{% if (...) { %}...{%}%}` into one logical match
//! - **Security parameters**: Strip and add the `|(identity)..|(hash)..` suffix
//! - **Helpers**: Parameter suffix grammar, macro neutralizing, entity decoding
//!
//! ## Usage
//!
//! ```rust
//! use cms_macro::{MacroProcessingParameters, MacroScanner, MacroType, ScanOptions};
//!
//! let scanner = MacroScanner::with_options(
//!     ScanOptions::builder()
//!         .with_allowed_types(&[MacroType::Localization, MacroType::Data])
//!         .build(),
//! );
//! let params = MacroProcessingParameters::default();
//!
//! let out = scanner
//!     .scan(
//!         "Hello {$greeting$}, you have {%OrderCount%} orders.",
//!         &params,
//!         |ctx| match ctx.expression() {
//!             "greeting" => "World".to_string(),
//!             "OrderCount" => "3".to_string(),
//!             _ => String::new(),
//!         },
//!     )
//!     .unwrap();
//!
//! assert_eq!(out, "Hello World, you have 3 orders.");
//! ```
//!
//! ## Macro Syntax Quick Reference
//!
//! | Type | Family | Example |
//! |------|--------|---------|
//! | `%` | Data | `{%CurrentUser.UserName%}` |
//! | `$` | Localization | `{$general.ok$}` |
//! | `?` | Query string | `{?nodeid?}` |
//! | `&` | Legacy path | `{&/Products&}` |
//! | `@` | Cookie (reserved) | `{@CookieName@}` |
//! | `#` | Custom (reserved) | `{#CustomMacro#}` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod config;
mod context;
mod error;
mod helpers;
mod operations;
mod parameters;
mod scanner;
mod security;
mod types;

pub use config::{ScanOptions, ScanOptionsBuilder};
pub use context::MacroContext;
pub use error::{MacroError, MacroResult};
pub use helpers::{
    build_macro_parameter, contains_any_macro, contains_macro_type, decode_encoded_macro,
    encode_macro, escape_parameter_value, escape_string_literal, get_parameter, html_decode,
    is_localization_macro, parse_parameters, remove_parameter, unescape_parameter_value,
    MacroParameter, ParsedExpression,
};
pub use operations::{
    decode_macros, find_all_macros, is_simple_expression, refresh_security_params,
    remove_macros, MACRO_LIST_SEPARATOR,
};
pub use parameters::{MacroProcessingParameters, MacroProcessingParametersBuilder};
pub use scanner::{process_macros, MacroScanner, NOT_RESOLVE};
pub use security::{
    HashSignatureProcessor, NoSecurity, SecuredExpression, SecurityProcessor, HASH_PARAMETER,
    IDENTITY_PARAMETER, USER_PARAMETER,
};
pub use types::MacroType;
