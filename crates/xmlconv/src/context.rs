//! The execution context: public entry point for conversions.

use crate::binding::{BindingRegistry, XmlEntity};
use crate::config::{EncoderConfig, ParserConfig};
use crate::error::{DecodingError, ParseError, Result};
use crate::flat::{self, FlatMap};
use crate::secure;
use encoding_rs::Encoding;
use std::io::{Read, Write};

/// An isolated conversion context owning its own binding cache.
///
/// Bindings are built lazily the first time a record type is encoded or
/// decoded and reused for the lifetime of the context. A context is `Send`,
/// so each worker thread or task can own one; it is never shared, which keeps
/// the cache free of locks.
///
/// # Examples
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use xmlconv::XmlContext;
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// #[serde(rename = "xml")]
/// struct Notify {
///     return_code: String,
///     total_fee: u32,
/// }
///
/// let mut ctx = XmlContext::new();
/// let notify = Notify {
///     return_code: "SUCCESS".to_string(),
///     total_fee: 100,
/// };
///
/// let xml = ctx.encode(&notify)?;
/// assert!(xml.contains("<return_code>SUCCESS</return_code>"));
///
/// let back: Notify = ctx.decode_str(&xml)?;
/// assert_eq!(back, notify);
/// # Ok::<(), xmlconv::XmlConvError>(())
/// ```
#[derive(Debug, Default)]
pub struct XmlContext {
    registry: BindingRegistry,
    parser: ParserConfig,
}

impl XmlContext {
    /// Creates a context with default parser and encoder settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context with explicit settings.
    pub fn with_config(parser: ParserConfig, encoder: EncoderConfig) -> Self {
        Self {
            registry: BindingRegistry::new(encoder),
            parser,
        }
    }

    /// The context's binding cache.
    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    /// The parser settings applied to every ingestion path.
    pub fn parser_config(&self) -> &ParserConfig {
        &self.parser
    }

    /// Encodes a record as an XML document.
    pub fn encode<T: XmlEntity>(&mut self, record: &T) -> Result<String> {
        let writer = self.registry.get_or_create_writer::<T>()?;
        Ok(writer.write_string(record)?)
    }

    /// Encodes a record into `out`.
    pub fn encode_to_writer<T: XmlEntity, W: Write>(&mut self, record: &T, out: W) -> Result<()> {
        let writer = self.registry.get_or_create_writer::<T>()?;
        writer.write(record, out)?;
        Ok(())
    }

    /// Decodes a record from XML text.
    pub fn decode_str<T: XmlEntity>(&mut self, xml: &str) -> Result<T> {
        let reader = self.registry.get_or_create_reader::<T>()?;
        let doc = secure::parse_document(xml, &self.parser).map_err(DecodingError::from)?;
        Ok(reader.read(&doc)?)
    }

    /// Decodes a record from raw bytes (UTF-8, or UTF-16 with a BOM).
    pub fn decode_slice<T: XmlEntity>(&mut self, bytes: &[u8]) -> Result<T> {
        let text = secure::decode_bytes(bytes, None)?;
        self.decode_str(&text)
    }

    /// Decodes a record from a byte stream (UTF-8, or UTF-16 with a BOM).
    pub fn decode_reader<T: XmlEntity, R: Read>(&mut self, input: R) -> Result<T> {
        let bytes = read_all(input)?;
        self.decode_slice(&bytes)
    }

    /// Decodes a record from a byte stream in an explicit charset.
    pub fn decode_reader_with_charset<T: XmlEntity, R: Read>(
        &mut self,
        input: R,
        charset: &'static Encoding,
    ) -> Result<T> {
        let bytes = read_all(input)?;
        let text = secure::decode_bytes(&bytes, Some(charset))?;
        self.decode_str(&text)
    }

    /// Securely parses `xml` and flattens the root's children into a map.
    ///
    /// See [`flat::decode_flat`].
    pub fn decode_flat(&self, xml: &str) -> std::result::Result<FlatMap, ParseError> {
        flat::decode_flat(xml, &self.parser)
    }
}

fn read_all<R: Read>(mut input: R) -> std::result::Result<Vec<u8>, DecodingError> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn test_context_is_send() {
        assert_send::<XmlContext>();
    }

    #[test]
    fn test_with_config_keeps_settings() {
        let ctx = XmlContext::with_config(
            ParserConfig::strict(),
            EncoderConfig::default().xml_declaration(false),
        );
        assert_eq!(ctx.parser_config(), &ParserConfig::strict());
        assert!(!ctx.registry().encoder_config().xml_declaration);
        assert!(ctx.registry().is_empty());
    }
}
