//! # cms-macro-engine
//!
//! Template rendering on top of the [`cms_macro`] scanner.
//!
//! The scanner only finds macros; this crate decides what they become. A
//! [`MacroSource`] supplies values per macro family, and the engine splices
//! them in, counts what it did and optionally memoizes localization lookups.
//!
//! ## Key Features
//!
//! - **Typed sources** - One trait method per macro family, only data is required
//! - **Localization cache** - LRU cache with TTL keyed by culture and key
//! - **Fail-fast sources** - The first source error aborts the render
//! - **Optional parallelism** - Enable `parallel` feature for batch rendering
//!
//! ## Quick Start
//!
//! ```rust
//! use cms_macro::{MacroContext, MacroType};
//! use cms_macro_engine::{EngineConfig, EngineResult, MacroEngine, MacroSource};
//!
//! struct Shop;
//!
//! impl MacroSource for Shop {
//!     fn resolve_data(&self, context: &MacroContext<'_>) -> EngineResult<Option<String>> {
//!         Ok((context.expression() == "OrderCount").then(|| "3".to_string()))
//!     }
//!
//!     fn resolve_localization(&self, key: &str, _culture: &str) -> EngineResult<Option<String>> {
//!         Ok((key == "greeting").then(|| "World".to_string()))
//!     }
//! }
//!
//! let source = Shop;
//! let config = EngineConfig::builder()
//!     .with_allowed_types(&[MacroType::Localization, MacroType::Data])
//!     .build();
//! let engine = MacroEngine::with_config(&source, config);
//!
//! let result = engine
//!     .render("Hello {$greeting$}, you have {%OrderCount%} orders.")
//!     .unwrap();
//! assert_eq!(result.text, "Hello World, you have 3 orders.");
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Enables parallel batch rendering using rayon
//! - `serde` - Enables serde derives on the scanner's public types

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod config;
mod engine;
mod error;
mod result;
mod traits;

pub use cache::LocalizationCache;
pub use config::{CacheConfig, EngineConfig, EngineConfigBuilder, DEFAULT_CULTURE};
pub use engine::{MacroEngine, CULTURE_PARAMETER};
pub use error::{EngineError, EngineResult};
pub use result::{RenderResult, RenderStats};
pub use traits::MacroSource;

// Re-export commonly used types from the scanner for convenience
pub use cms_macro::{MacroContext, MacroProcessingParameters, MacroType};
