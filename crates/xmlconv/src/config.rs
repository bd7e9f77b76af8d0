//! Parser and encoder configuration.
//!
//! Both configurations are plain values: they are cloned into the structures
//! that use them, so changing a config after a binding was built does not
//! affect that binding.
//!
//! # Example
//!
//! ```rust
//! use xmlconv::{DoctypePolicy, EncoderConfig, ParserConfig, TextEscaping};
//!
//! // Refuse any DOCTYPE and cap nesting at 32 levels
//! let parser = ParserConfig::strict().max_depth(32);
//! assert_eq!(parser.doctype, DoctypePolicy::Reject);
//!
//! // Compact output with standard escaping
//! let encoder = EncoderConfig {
//!     indent_size: 0,
//!     escaping: TextEscaping::Escape,
//!     ..Default::default()
//! };
//! assert!(!encoder.is_indented());
//! ```

/// Default maximum element nesting accepted by the parser.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How the parser treats a `<!DOCTYPE ...>` declaration.
///
/// Neither policy ever fetches an external DTD subset or resolves an external
/// entity; they differ only in whether the declaration itself is tolerated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DoctypePolicy {
    /// Accept the declaration, inspect its internal subset, never load anything.
    #[default]
    Permit,
    /// Refuse any document carrying a DOCTYPE.
    Reject,
}

/// Settings applied to every XML ingestion path.
///
/// External entity resolution, external DTD loading, XInclude processing and
/// expansion of declared entities are disabled unconditionally and are
/// therefore not represented here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// DOCTYPE handling.
    pub doctype: DoctypePolicy,
    /// Maximum element nesting depth.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            doctype: DoctypePolicy::Permit,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserConfig {
    /// A configuration that refuses any DOCTYPE declaration.
    pub fn strict() -> Self {
        Self {
            doctype: DoctypePolicy::Reject,
            ..Default::default()
        }
    }

    /// Sets the DOCTYPE policy.
    pub fn doctype(mut self, policy: DoctypePolicy) -> Self {
        self.doctype = policy;
        self
    }

    /// Sets the maximum element nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// How the encoder writes character data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEscaping {
    /// Write text content exactly as the record holds it.
    ///
    /// Producer-supplied markup such as `<![CDATA[...]]>` sections or
    /// pre-escaped `&amp;` sequences reaches the output unchanged. Text that
    /// contains a bare `<` or `&` without intending markup produces a document
    /// that will not parse back.
    ///
    /// Pre-escaped text does not survive a round trip: `AT&amp;T` is written
    /// as is but decodes to `AT&T`, since references are resolved on input.
    #[default]
    Verbatim,
    /// Escape `<`, `>`, `&`, `'` and `"` in text content.
    Escape,
}

/// Settings used when a writer binding is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Byte used for indentation.
    pub indent_char: u8,
    /// Indentation width per nesting level; `0` produces compact output.
    pub indent_size: usize,
    /// Character data escaping policy.
    pub escaping: TextEscaping,
    /// Whether to emit `<?xml version="1.0" encoding="UTF-8" standalone="yes"?>`.
    pub xml_declaration: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            indent_char: b' ',
            indent_size: 2,
            escaping: TextEscaping::Verbatim,
            xml_declaration: true,
        }
    }
}

impl EncoderConfig {
    /// Returns `true` if output is pretty-printed.
    pub fn is_indented(&self) -> bool {
        self.indent_size > 0
    }

    /// Sets the escaping policy.
    pub fn escaping(mut self, escaping: TextEscaping) -> Self {
        self.escaping = escaping;
        self
    }

    /// Enables or disables the XML declaration.
    pub fn xml_declaration(mut self, enabled: bool) -> Self {
        self.xml_declaration = enabled;
        self
    }

    /// Sets the indentation width (`0` for compact output).
    pub fn indent(mut self, size: usize) -> Self {
        self.indent_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_defaults_permit_doctype() {
        let config = ParserConfig::default();
        assert_eq!(config.doctype, DoctypePolicy::Permit);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_strict_parser_rejects_doctype() {
        let config = ParserConfig::strict().max_depth(8);
        assert_eq!(config.doctype, DoctypePolicy::Reject);
        assert_eq!(config.max_depth, 8);
    }

    #[test]
    fn test_encoder_defaults() {
        let config = EncoderConfig::default();
        assert!(config.is_indented());
        assert!(config.xml_declaration);
        assert_eq!(config.escaping, TextEscaping::Verbatim);

        let compact = config.indent(0).escaping(TextEscaping::Escape);
        assert!(!compact.is_indented());
        assert_eq!(compact.escaping, TextEscaping::Escape);
    }
}
