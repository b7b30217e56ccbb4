//! Traits for macro value lookup.
//!
//! This module defines the [`MacroSource`] trait that supplies values for
//! each macro family. Only data macros are required; the other families
//! default to "unknown", which leaves the macro unresolved.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use cms_macro::MacroContext;
//! use cms_macro_engine::{EngineResult, MacroSource};
//!
//! struct PageSource {
//!     fields: HashMap<String, String>,
//!     query: HashMap<String, String>,
//! }
//!
//! impl MacroSource for PageSource {
//!     fn resolve_data(&self, context: &MacroContext<'_>) -> EngineResult<Option<String>> {
//!         Ok(self.fields.get(context.expression()).cloned())
//!     }
//!
//!     fn resolve_query_string(&self, name: &str) -> EngineResult<Option<String>> {
//!         Ok(self.query.get(name).cloned())
//!     }
//! }
//! ```

use cms_macro::MacroContext;

use crate::error::EngineResult;

/// Supplies the values macros resolve to.
///
/// Every method returns `Ok(None)` when the value is unknown and `Err` when
/// the lookup itself failed. An error aborts the render it occurred in.
pub trait MacroSource: Send + Sync {
    /// Evaluates a data macro (`{%...%}`), including assembled blocks.
    ///
    /// The context carries the expression with security parameters stripped,
    /// plus the signing identity and hash when present.
    fn resolve_data(&self, context: &MacroContext<'_>) -> EngineResult<Option<String>>;

    /// Looks up a localized string (`{$...$}`).
    fn resolve_localization(&self, _key: &str, _culture: &str) -> EngineResult<Option<String>> {
        Ok(None)
    }

    /// Reads a query string value (`{?...?}`).
    fn resolve_query_string(&self, _name: &str) -> EngineResult<Option<String>> {
        Ok(None)
    }

    /// Reads a cookie value (`{@...@}`).
    fn resolve_cookie(&self, _name: &str) -> EngineResult<Option<String>> {
        Ok(None)
    }

    /// Evaluates a custom macro (`{#...#}`).
    fn resolve_custom(&self, _expression: &str) -> EngineResult<Option<String>> {
        Ok(None)
    }

    /// Resolves a legacy path macro (`{&...&}`).
    fn resolve_path(&self, _path: &str) -> EngineResult<Option<String>> {
        Ok(None)
    }
}
