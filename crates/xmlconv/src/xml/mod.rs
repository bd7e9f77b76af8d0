//! Record ⇄ XML mapping through custom `serde::Serializer` and
//! `serde::Deserializer` implementations.
//!
//! ## Architecture
//!
//! - **Serialization**: the `Serializer` receives serialize calls as the
//!   derived `Serialize` impl traverses the record and writes quick-xml events
//!   directly to the output. Start tags are held back until the first child
//!   content so that attribute fields can still be attached.
//!
//! - **Deserialization**: the `Deserializer` walks a [`Document`](crate::Document)
//!   produced by the secure parser. Child elements are grouped by name so
//!   repeated elements can feed sequence fields regardless of interleaving.
//!
//! ## Record ↔ XML Mapping
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! #[serde(rename = "xml")]
//! struct Refund {
//!     #[serde(rename = "@version")]
//!     version: String,          // <xml version="2">
//!     out_refund_no: String,    //   <out_refund_no>R1</out_refund_no>
//!     amount: Amount,           //   <amount currency="CNY">100</amount>
//!     #[serde(default)]
//!     tags: Vec<String>,        //   <tags>a</tags><tags>b</tags>
//!     memo: Option<String>,     //   omitted when None
//! }
//!
//! #[derive(Serialize, Deserialize)]
//! struct Amount {
//!     #[serde(rename = "@currency")]
//!     currency: String,
//!     #[serde(rename = "$text")]
//!     total: u64,
//! }
//! ```
//!
//! Sequence fields should carry `#[serde(default)]`: an empty sequence writes
//! no element, so without a default it cannot be read back.
//!
//! Under the default verbatim text policy, strings round-trip when they hold
//! plain text or well-formed markup. Pre-escaped text is the exception: a
//! field holding `AT&amp;T` is written unchanged, and the reference is
//! resolved on the way back, so it decodes as `AT&T`. Use
//! [`TextEscaping::Escape`](crate::TextEscaping::Escape) when such text must
//! come back byte for byte.

pub(crate) mod de;
pub(crate) mod ser;
pub mod utils;
