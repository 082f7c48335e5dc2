//! Purpose: Polymorphic JSON encoding for closed sets of variant types.
//! Exports: `api` (container, variants, registry, errors) and `poly_enum!`.
//! Role: Library crate; `Poly<V>` nests inside any serde-derived structure.
//! Invariants: The wire form is `{"type": <discriminator>, ..fields}` or `null`.
//! Invariants: Decoding never guesses a variant and never commits a partial patch.
//!
//! ```
//! use polyjson::{Poly, Variant, poly_enum};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
//! struct Dismiss {}
//!
//! impl Variant for Dismiss {
//!     const TYPE_NAME: &'static str = "dismiss";
//! }
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
//! struct DeepLink {
//!     url: String,
//! }
//!
//! impl Variant for DeepLink {
//!     const TYPE_NAME: &'static str = "deep-link";
//! }
//!
//! poly_enum! {
//!     #[derive(Clone, Debug, PartialEq)]
//!     pub enum Action {
//!         Dismiss(Dismiss),
//!         DeepLink(DeepLink),
//!     }
//! }
//!
//! let mut action: Poly<Action> = Poly::new();
//!
//! action.decode(br#"{"type": "dismiss"}"#).unwrap();
//! assert_eq!(action.encode().unwrap(), br#"{"type":"dismiss"}"#);
//!
//! action.decode(br#"{"type": "deep-link", "url": "url"}"#).unwrap();
//! assert_eq!(action.encode().unwrap(), br#"{"type":"deep-link","url":"url"}"#);
//!
//! // Same variant: only the given fields change.
//! action.decode(br#"{"url": "url-2"}"#).unwrap();
//! assert_eq!(action.encode().unwrap(), br#"{"type":"deep-link","url":"url-2"}"#);
//! ```

#[macro_use]
mod macros;

pub mod api;
mod core;
mod json;

pub use api::*;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::{Error as JsonError, Value};
}
