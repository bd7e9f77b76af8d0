//! XML serialization implementation using custom serde::Serializer.
//!
//! This module writes records to XML by providing a custom `Serializer` that
//! emits quick-xml events directly as serde traverses the record:
//!
//! - a struct becomes an element with one child element per field;
//! - `None` fields are omitted, sequences repeat the field's element;
//! - fields serialized as `@name` become attributes, `$text` becomes
//!   character data;
//! - unit variants are written as text, newtype and struct variants as a
//!   child element named after the variant.
//!
//! A start tag is held back until the element's first child content arrives,
//! so attribute fields can still be added to it and childless elements are
//! written as `<name/>`.

use crate::config::{EncoderConfig, TextEscaping};
use crate::error::EncodingError;
use crate::xml::utils;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::ser::{self, Impossible, Serialize};
use std::io::Write;

type Result<T> = std::result::Result<T, EncodingError>;

/// Serializes `value` as a complete XML document rooted at `root`.
pub(crate) fn to_writer<T, W>(value: &T, root: &str, config: &EncoderConfig, out: W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    let mut serializer = XmlSerializer::new(out, config);
    if config.xml_declaration {
        serializer.write_xml_declaration()?;
    }
    value.serialize(RootSerializer {
        ser: &mut serializer,
        root,
    })?;
    serializer.finish()
}

fn unsupported(element: &str, kind: &'static str) -> EncodingError {
    EncodingError::UnsupportedValue {
        element: element.to_string(),
        kind,
    }
}

/// XML Serializer that writes directly to quick-xml.
pub struct XmlSerializer<W: Write> {
    writer: Writer<W>,
    escaping: TextEscaping,
    /// Start tag of the innermost open element that has no content yet.
    pending_start: Option<BytesStart<'static>>,
}

impl<W: Write> XmlSerializer<W> {
    /// Creates a new XML serializer.
    pub fn new(out: W, config: &EncoderConfig) -> Self {
        let writer = if config.is_indented() {
            Writer::new_with_indent(out, config.indent_char, config.indent_size)
        } else {
            Writer::new(out)
        };
        Self {
            writer,
            escaping: config.escaping,
            pending_start: None,
        }
    }

    /// Finishes serialization and flushes the writer.
    pub fn finish(mut self) -> Result<()> {
        self.flush_pending()?;
        self.writer.into_inner().flush()?;
        Ok(())
    }

    fn write_xml_declaration(&mut self) -> Result<()> {
        let decl = BytesDecl::new("1.0", Some("UTF-8"), Some("yes"));
        self.writer.write_event(Event::Decl(decl))?;
        Ok(())
    }

    /// Writes out a held-back start tag, if any.
    fn flush_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending_start.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn open_element(&mut self, name: &str) -> Result<()> {
        if !utils::is_valid_xml_name(name) {
            return Err(EncodingError::InvalidName {
                name: name.to_string(),
            });
        }
        self.flush_pending()?;
        self.pending_start = Some(BytesStart::new(name.to_string()));
        Ok(())
    }

    fn close_element(&mut self, name: &str) -> Result<()> {
        match self.pending_start.take() {
            Some(start) => self.writer.write_event(Event::Empty(start))?,
            None => self.writer.write_event(Event::End(BytesEnd::new(name)))?,
        }
        Ok(())
    }

    fn push_attribute(&mut self, element: &str, name: &str, value: &str) -> Result<()> {
        if !utils::is_valid_xml_name(name) {
            return Err(EncodingError::InvalidName {
                name: name.to_string(),
            });
        }
        match self.pending_start.as_mut() {
            Some(start) => {
                start.push_attribute((name, value));
                Ok(())
            }
            None => Err(EncodingError::AttributeAfterContent {
                element: element.to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Writes character data according to the escaping policy.
    fn write_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.flush_pending()?;
        let event = match self.escaping {
            TextEscaping::Verbatim => BytesText::from_escaped(text),
            TextEscaping::Escape => BytesText::new(text),
        };
        self.writer.write_event(Event::Text(event))?;
        Ok(())
    }

    fn write_text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.open_element(name)?;
        self.write_text(text)?;
        self.close_element(name)
    }
}

/// Serializer for the document root; only struct-like records are accepted.
struct RootSerializer<'a, W: Write> {
    ser: &'a mut XmlSerializer<W>,
    root: &'a str,
}

impl<'a, W: Write> RootSerializer<'a, W> {
    fn reject<T>(self, kind: &'static str) -> Result<T> {
        Err(unsupported(self.root, kind))
    }
}

impl<'a, W: Write> ser::Serializer for RootSerializer<'a, W> {
    type Ok = ();
    type Error = EncodingError;

    type SerializeSeq = Impossible<(), EncodingError>;
    type SerializeTuple = Impossible<(), EncodingError>;
    type SerializeTupleStruct = Impossible<(), EncodingError>;
    type SerializeTupleVariant = Impossible<(), EncodingError>;
    type SerializeMap = MapSerializer<'a, W>;
    type SerializeStruct = StructSerializer<'a, W>;
    type SerializeStructVariant = Impossible<(), EncodingError>;

    fn serialize_bool(self, _v: bool) -> Result<()> {
        self.reject("a boolean")
    }

    fn serialize_i8(self, _v: i8) -> Result<()> {
        self.reject("an integer")
    }

    fn serialize_i16(self, _v: i16) -> Result<()> {
        self.reject("an integer")
    }

    fn serialize_i32(self, _v: i32) -> Result<()> {
        self.reject("an integer")
    }

    fn serialize_i64(self, _v: i64) -> Result<()> {
        self.reject("an integer")
    }

    fn serialize_u8(self, _v: u8) -> Result<()> {
        self.reject("an integer")
    }

    fn serialize_u16(self, _v: u16) -> Result<()> {
        self.reject("an integer")
    }

    fn serialize_u32(self, _v: u32) -> Result<()> {
        self.reject("an integer")
    }

    fn serialize_u64(self, _v: u64) -> Result<()> {
        self.reject("an integer")
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        self.reject("a float")
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        self.reject("a float")
    }

    fn serialize_char(self, _v: char) -> Result<()> {
        self.reject("a character")
    }

    fn serialize_str(self, _v: &str) -> Result<()> {
        self.reject("a string")
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        self.reject("a byte array")
    }

    fn serialize_none(self) -> Result<()> {
        self.reject("a missing value")
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.reject("a unit")
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.ser.open_element(self.root)?;
        self.ser.close_element(self.root)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        self.reject("an enum")
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.reject("an enum")
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.reject("a sequence")
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        self.reject("a tuple")
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.reject("a tuple struct")
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.reject("an enum")
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.ser.open_element(self.root)?;
        Ok(MapSerializer::new(self.ser, self.root))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        // The bound root name wins over the serde struct name
        self.ser.open_element(self.root)?;
        Ok(StructSerializer {
            ser: self.ser,
            name: self.root,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.reject("an enum")
    }
}

/// Serializer for a value stored under a named element.
struct ElementSerializer<'a, W: Write> {
    ser: &'a mut XmlSerializer<W>,
    name: &'a str,
}

impl<'a, W: Write> ser::Serializer for ElementSerializer<'a, W> {
    type Ok = ();
    type Error = EncodingError;

    type SerializeSeq = SeqSerializer<'a, W>;
    type SerializeTuple = SeqSerializer<'a, W>;
    type SerializeTupleStruct = SeqSerializer<'a, W>;
    type SerializeTupleVariant = Impossible<(), EncodingError>;
    type SerializeMap = MapSerializer<'a, W>;
    type SerializeStruct = StructSerializer<'a, W>;
    type SerializeStructVariant = StructVariantSerializer<'a, W>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.ser.write_text_element(self.name, utils::bool_to_string(v))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.ser.write_text_element(self.name, &v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.ser.write_text_element(self.name, v.encode_utf8(&mut [0; 4]))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.ser.write_text_element(self.name, v)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(unsupported(self.name, "a byte array"))
    }

    fn serialize_none(self) -> Result<()> {
        // Absent values produce no element
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.ser.open_element(self.name)?;
        self.ser.close_element(self.name)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.ser.write_text_element(self.name, variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.ser.open_element(self.name)?;
        value.serialize(ElementSerializer {
            ser: &mut *self.ser,
            name: variant,
        })?;
        self.ser.close_element(self.name)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SeqSerializer {
            ser: self.ser,
            name: self.name,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported(self.name, "a tuple variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.ser.open_element(self.name)?;
        Ok(MapSerializer::new(self.ser, self.name))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.ser.open_element(self.name)?;
        Ok(StructSerializer {
            ser: self.ser,
            name: self.name,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.ser.open_element(self.name)?;
        self.ser.open_element(variant)?;
        Ok(StructVariantSerializer {
            inner: StructSerializer {
                ser: self.ser,
                name: variant,
            },
            outer: self.name,
        })
    }
}

/// Writes each sequence item as a repeated element.
pub struct SeqSerializer<'a, W: Write> {
    ser: &'a mut XmlSerializer<W>,
    name: &'a str,
}

impl<'a, W: Write> SeqSerializer<'a, W> {
    fn write_item<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(ElementSerializer {
            ser: &mut *self.ser,
            name: self.name,
        })
    }
}

impl<'a, W: Write> ser::SerializeSeq for SeqSerializer<'a, W> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.write_item(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, W: Write> ser::SerializeTuple for SeqSerializer<'a, W> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.write_item(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, W: Write> ser::SerializeTupleStruct for SeqSerializer<'a, W> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.write_item(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Writes struct fields as child elements, attributes or text.
pub struct StructSerializer<'a, W: Write> {
    ser: &'a mut XmlSerializer<W>,
    name: &'a str,
}

impl<'a, W: Write> ser::SerializeStruct for StructSerializer<'a, W> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if utils::is_attribute_field(key) {
            let name = utils::strip_attribute_prefix(key);
            if let Some(text) = value.serialize(ValueExtractor { element: self.name })? {
                self.ser.push_attribute(self.name, name, &text)?;
            }
            return Ok(());
        }

        if utils::is_text_field(key) {
            if let Some(text) = value.serialize(ValueExtractor { element: self.name })? {
                self.ser.write_text(&text)?;
            }
            return Ok(());
        }

        value.serialize(ElementSerializer {
            ser: &mut *self.ser,
            name: key,
        })
    }

    fn end(self) -> Result<()> {
        self.ser.close_element(self.name)
    }
}

/// A struct variant written as `<field><Variant>...</Variant></field>`.
pub struct StructVariantSerializer<'a, W: Write> {
    inner: StructSerializer<'a, W>,
    outer: &'a str,
}

impl<'a, W: Write> ser::SerializeStructVariant for StructVariantSerializer<'a, W> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<()> {
        let ser = self.inner.ser;
        ser.close_element(self.inner.name)?;
        ser.close_element(self.outer)
    }
}

/// Writes map entries as `<key>value</key>` children.
pub struct MapSerializer<'a, W: Write> {
    ser: &'a mut XmlSerializer<W>,
    name: &'a str,
    key: Option<String>,
}

impl<'a, W: Write> MapSerializer<'a, W> {
    fn new(ser: &'a mut XmlSerializer<W>, name: &'a str) -> Self {
        Self {
            ser,
            name,
            key: None,
        }
    }
}

impl<'a, W: Write> ser::SerializeMap for MapSerializer<'a, W> {
    type Ok = ();
    type Error = EncodingError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = key
            .serialize(ValueExtractor { element: self.name })?
            .ok_or_else(|| unsupported(self.name, "a missing map key"))?;
        self.key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| EncodingError::Custom("map value without a key".to_string()))?;
        value.serialize(ElementSerializer {
            ser: &mut *self.ser,
            name: &key,
        })
    }

    fn end(self) -> Result<()> {
        self.ser.close_element(self.name)
    }
}

/// Serializer that renders a primitive value as a string.
///
/// Used for attribute values, `$text` content and map keys. `None` yields
/// `Ok(None)` so optional attributes can be skipped.
struct ValueExtractor<'a> {
    element: &'a str,
}

impl<'a> ValueExtractor<'a> {
    fn text(self, value: impl ToString) -> Result<Option<String>> {
        Ok(Some(value.to_string()))
    }

    fn reject<T>(self, kind: &'static str) -> Result<T> {
        Err(unsupported(self.element, kind))
    }
}

impl<'a> ser::Serializer for ValueExtractor<'a> {
    type Ok = Option<String>;
    type Error = EncodingError;

    type SerializeSeq = Impossible<Option<String>, EncodingError>;
    type SerializeTuple = Impossible<Option<String>, EncodingError>;
    type SerializeTupleStruct = Impossible<Option<String>, EncodingError>;
    type SerializeTupleVariant = Impossible<Option<String>, EncodingError>;
    type SerializeMap = Impossible<Option<String>, EncodingError>;
    type SerializeStruct = Impossible<Option<String>, EncodingError>;
    type SerializeStructVariant = Impossible<Option<String>, EncodingError>;

    fn serialize_bool(self, v: bool) -> Result<Option<String>> {
        self.text(utils::bool_to_string(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_i16(self, v: i16) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_i32(self, v: i32) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_i64(self, v: i64) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_u16(self, v: u16) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_u32(self, v: u32) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_f64(self, v: f64) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_char(self, v: char) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_str(self, v: &str) -> Result<Option<String>> {
        self.text(v)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Option<String>> {
        self.reject("a byte array")
    }

    fn serialize_none(self) -> Result<Option<String>> {
        Ok(None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Option<String>>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Option<String>> {
        self.text("")
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Option<String>> {
        self.text("")
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Option<String>> {
        self.text(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Option<String>>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Option<String>>
    where
        T: ?Sized + Serialize,
    {
        self.reject("a newtype variant")
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.reject("a sequence")
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        self.reject("a tuple")
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.reject("a tuple struct")
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.reject("a tuple variant")
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.reject("a map")
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.reject("a struct")
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.reject("a struct variant")
    }
}
