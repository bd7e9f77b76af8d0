//! Error types for XML conversion.
//!
//! The hierarchy mirrors the stages a payload passes through:
//!
//! | Error | Raised by | Meaning |
//! |-------|-----------|---------|
//! | [`BindingError`] | binding registry | the record type cannot be compiled into a reader/writer |
//! | [`EncodingError`] | encoder | a valid binding exists but this record could not be written |
//! | [`DecodingError`] | typed decoder | input is malformed, rejected, or does not fit the type |
//! | [`ParseError`] | secure parser, flat-map decoder | input is malformed or rejected |
//!
//! Security rejections ([`Rejection`]) are always carried inside a
//! [`ParseError`] so callers can tell hostile input apart from plain syntax
//! errors with [`XmlConvError::is_rejection`].

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type returned by [`XmlContext`](crate::XmlContext) operations.
#[derive(Error, Debug)]
pub enum XmlConvError {
    /// The record type could not be bound
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// A record could not be serialized
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// A payload could not be deserialized
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// A payload could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl XmlConvError {
    /// Returns the security rejection behind this error, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            XmlConvError::Decoding(e) => e.rejection(),
            XmlConvError::Parse(e) => e.rejection(),
            _ => None,
        }
    }

    /// Returns `true` if the input was refused by the secure parser configuration.
    pub fn is_rejection(&self) -> bool {
        self.rejection().is_some()
    }
}

/// Errors raised while compiling a record type into a reader/writer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("cannot bind {type_name}: expected a struct, found {shape}")]
    UnsupportedShape {
        type_name: &'static str,
        shape: &'static str,
    },

    #[error("cannot bind {type_name}: `{name}` is not a valid XML name")]
    InvalidName {
        type_name: &'static str,
        name: String,
    },

    #[error("cannot bind {type_name}: field `{name}` is declared more than once")]
    DuplicateField {
        type_name: &'static str,
        name: String,
    },
}

/// Errors raised while writing a record as XML.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("cannot encode {kind} inside <{element}>")]
    UnsupportedValue { element: String, kind: &'static str },

    #[error("`{name}` is not a valid XML name")]
    InvalidName { name: String },

    #[error("attribute `{name}` must be written before any child content of <{element}>")]
    AttributeAfterContent { element: String, name: String },

    #[error("I/O error while writing XML: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML writer error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    Custom(String),
}

impl serde::ser::Error for EncodingError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        EncodingError::Custom(msg.to_string())
    }
}

/// Errors raised while reading a payload into a record.
#[derive(Error, Debug)]
pub enum DecodingError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("input is not valid {encoding}")]
    Charset { encoding: &'static str },

    #[error("I/O error while reading XML: {0}")]
    Io(#[from] std::io::Error),

    #[error("document has no root element")]
    MissingRoot,

    #[error("expected root element <{expected}>, found <{found}>")]
    RootMismatch { expected: String, found: String },

    #[error("{0}")]
    Shape(String),
}

impl DecodingError {
    /// Returns the security rejection behind this error, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            DecodingError::Parse(e) => e.rejection(),
            _ => None,
        }
    }
}

impl serde::de::Error for DecodingError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        DecodingError::Shape(msg.to_string())
    }
}

/// Errors raised by the secure parser for malformed or refused input.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed XML at byte {position}: {source}")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed attribute on <{element}>: {message}")]
    Attribute { element: String, message: String },

    #[error("element <{name}> is never closed")]
    UnclosedElement { name: String },

    #[error("closing tag </{name}> has no matching start tag")]
    UnexpectedEndTag { name: String },

    #[error("document has more than one root element (found <{name}>)")]
    MultipleRoots { name: String },

    #[error("character data outside the root element")]
    TextOutsideRoot,

    #[error("DOCTYPE declaration must precede the root element")]
    MisplacedDoctype,

    #[error("input rejected: {0}")]
    Rejected(#[from] Rejection),
}

impl ParseError {
    /// Returns the security rejection behind this error, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ParseError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

/// Input refused by the secure parser configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("DOCTYPE declarations are not allowed")]
    DoctypeForbidden,

    #[error("reference to external entity `{name}` ({system_id})")]
    ExternalEntity { name: String, system_id: String },

    #[error("expansion of declared entity `{name}` is not allowed")]
    EntityExpansion { name: String },

    #[error("reference to undeclared entity `{name}`")]
    UndeclaredEntity { name: String },

    #[error("invalid character reference `&{reference};`")]
    InvalidCharRef { reference: String },

    #[error("element nesting exceeds the limit of {limit}")]
    DepthLimit { limit: usize },
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, XmlConvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_is_visible_through_wrappers() {
        let rejection = Rejection::ExternalEntity {
            name: "x".to_string(),
            system_id: "file:///etc/hostname".to_string(),
        };
        let err: XmlConvError = DecodingError::from(ParseError::from(rejection.clone())).into();

        assert!(err.is_rejection());
        assert_eq!(err.rejection(), Some(&rejection));
        assert!(err.to_string().contains("external entity `x`"));
    }

    #[test]
    fn test_shape_errors_are_not_rejections() {
        let err: XmlConvError = DecodingError::MissingRoot.into();
        assert!(!err.is_rejection());
    }
}
