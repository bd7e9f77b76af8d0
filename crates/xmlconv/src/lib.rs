//! # xmlconv
//!
//! Hardened conversion between serde records and XML.
//!
//! ## Features
//!
//! - **Record ⇄ XML**: custom `serde::Serializer` and `serde::Deserializer`
//!   implementations map derive-annotated structs onto elements, attributes
//!   (`@name` fields) and character data (`$text` fields).
//! - **Per-context binding cache**: an [`XmlContext`] compiles each record type
//!   once and reuses the compiled reader/writer for every later conversion.
//! - **Secure ingestion**: every payload passes [`parse_document`], which never
//!   resolves external entities, never loads external DTDs and refuses entity
//!   expansion beyond the predefined entities and character references.
//! - **Flat-map decoding**: [`flat::decode_flat`] reads simple
//!   `<xml><key>value</key>...</xml>` payloads into an ordered map.
//!
//! ## Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use xmlconv::{Rejection, XmlContext};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! #[serde(rename = "xml")]
//! struct Message {
//!     #[serde(rename = "@id")]
//!     id: u32,
//!     body: String,
//! }
//!
//! let mut ctx = XmlContext::new();
//!
//! // Embedded markup is written through verbatim and read back unchanged
//! let message = Message { id: 1, body: "<b>bold</b>".to_string() };
//! let xml = ctx.encode(&message)?;
//! assert_eq!(ctx.decode_str::<Message>(&xml)?, message);
//!
//! // External entities never resolve
//! let hostile = r#"<!DOCTYPE xml [<!ENTITY x SYSTEM "file:///etc/hostname">]><xml>&x;</xml>"#;
//! let err = ctx.decode_str::<Message>(hostile).unwrap_err();
//! assert!(matches!(err.rejection(), Some(Rejection::ExternalEntity { .. })));
//!
//! // Flat maps keep first-seen order, last value wins
//! let map = ctx.decode_flat("<root><a>1</a><b>2</b><a>3</a></root>")?;
//! assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b"]);
//! assert_eq!(map["a"], "3");
//! # Ok::<(), xmlconv::XmlConvError>(())
//! ```

pub mod binding;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod flat;
pub mod secure;
pub mod xml;

// Re-export common types and functions
pub use binding::{
    Binding, BindingRegistry, BindingStats, EntityReader, EntityWriter, FieldBinding, FieldKind,
    XmlEntity,
};
pub use config::{DoctypePolicy, EncoderConfig, ParserConfig, TextEscaping};
pub use context::XmlContext;
pub use document::{Document, XmlElement, XmlNode};
pub use error::{
    BindingError, DecodingError, EncodingError, ParseError, Rejection, Result, XmlConvError,
};
pub use flat::FlatMap;
pub use secure::{decode_bytes, parse_document};
