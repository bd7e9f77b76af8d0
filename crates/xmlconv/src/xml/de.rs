//! XML deserialization implementation using custom serde::Deserializer.
//!
//! Decoding runs over a [`Document`] that has already passed the secure
//! parser, so this module never sees raw entity references or DOCTYPEs. The
//! deserializers walk the element tree:
//!
//! - a struct reads attributes as `@name` keys, child elements grouped by
//!   name, and (when the struct declares it) character data as `$text`;
//! - a sequence field consumes every occurrence of its element, a scalar
//!   field takes the last one;
//! - strings whose content contains markup are returned as the raw inner
//!   source text, so embedded markup written verbatim reads back unchanged.

use crate::document::{Document, XmlElement};
use crate::error::DecodingError;
use crate::xml::utils;
use indexmap::IndexMap;
use serde::de::value::StringDeserializer;
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::str::FromStr;

type Result<T> = std::result::Result<T, DecodingError>;

/// Deserializes a record from a parsed element.
pub(crate) fn from_element<T: DeserializeOwned>(doc: &Document<'_>, root: &XmlElement) -> Result<T> {
    T::deserialize(ElementDeserializer { doc, element: root })
}

fn parse_text<T: FromStr>(text: &str, kind: &'static str, context: &str) -> Result<T> {
    let trimmed = text.trim();
    trimmed.parse().map_err(|_| {
        DecodingError::Shape(format!("invalid {kind} `{trimmed}` in <{context}>"))
    })
}

fn parse_bool(text: &str, context: &str) -> Result<bool> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(DecodingError::Shape(format!(
            "invalid boolean `{other}` in <{context}>"
        ))),
    }
}

fn parse_char(text: &str, context: &str) -> Result<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(DecodingError::Shape(format!(
            "expected a single character in <{context}>, found `{text}`"
        ))),
    }
}

fn string_key(key: String) -> StringDeserializer<DecodingError> {
    key.into_deserializer()
}

/// Generates `deserialize_*` methods that parse the scalar text of `self`.
macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty, $kind:literal);)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                let value: $ty = parse_text(&self.scalar_text(), $kind, self.context())?;
                visitor.$visit(value)
            }
        )*
    };
}

macro_rules! deserialize_numbers {
    () => {
        deserialize_parsed! {
            deserialize_i8 => visit_i8(i8, "integer");
            deserialize_i16 => visit_i16(i16, "integer");
            deserialize_i32 => visit_i32(i32, "integer");
            deserialize_i64 => visit_i64(i64, "integer");
            deserialize_u8 => visit_u8(u8, "integer");
            deserialize_u16 => visit_u16(u16, "integer");
            deserialize_u32 => visit_u32(u32, "integer");
            deserialize_u64 => visit_u64(u64, "integer");
            deserialize_f32 => visit_f32(f32, "number");
            deserialize_f64 => visit_f64(f64, "number");
        }

        fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            visitor.visit_bool(parse_bool(&self.scalar_text(), self.context())?)
        }

        fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            visitor.visit_char(parse_char(&self.scalar_text(), self.context())?)
        }
    };
}

/// Deserializer for a single element.
#[derive(Clone, Copy)]
struct ElementDeserializer<'a> {
    doc: &'a Document<'a>,
    element: &'a XmlElement,
}

impl<'a> ElementDeserializer<'a> {
    fn scalar_text(&self) -> String {
        self.element.text_content()
    }

    fn context(&self) -> &str {
        self.element.name()
    }

    /// The element's value when read as a string.
    fn string_value(&self) -> String {
        let markup = self.doc.inner_markup(self.element);
        if markup.contains('<') {
            markup.to_string()
        } else {
            self.element.text_content()
        }
    }

    fn map_access(self, with_text: bool) -> ElementMapAccess<'a> {
        ElementMapAccess::new(self.doc, self.element, with_text)
    }

    fn seq_access(self) -> ElementSeqAccess<'a> {
        ElementSeqAccess::new(self.doc, self.element.child_elements().collect())
    }
}

impl<'de, 'a> de::Deserializer<'de> for ElementDeserializer<'a> {
    type Error = DecodingError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.element.attributes().is_empty() && !self.element.has_element_children() {
            visitor.visit_string(self.string_value())
        } else {
            visitor.visit_map(self.map_access(false))
        }
    }

    deserialize_numbers!();

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.string_value())
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.string_value())
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(DecodingError::Shape(format!(
            "byte arrays are not supported (in <{}>)",
            self.context()
        )))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        // An element that is present always carries a value
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(self.seq_access())
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(self.seq_access())
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_seq(self.seq_access())
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_map(self.map_access(false))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let with_text = fields.iter().any(|field| utils::is_text_field(field));
        visitor.visit_map(self.map_access(with_text))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(ElementEnumAccess { inner: self })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

/// Deserializer for all occurrences of one child element name.
///
/// Sequences consume every occurrence; anything else reads the last one.
struct GroupDeserializer<'a> {
    doc: &'a Document<'a>,
    elements: Vec<&'a XmlElement>,
}

impl<'a> GroupDeserializer<'a> {
    fn last(&self) -> Result<ElementDeserializer<'a>> {
        self.elements
            .last()
            .map(|element| ElementDeserializer {
                doc: self.doc,
                element,
            })
            .ok_or_else(|| DecodingError::Shape("empty element group".to_string()))
    }

    fn seq_access(self) -> ElementSeqAccess<'a> {
        ElementSeqAccess::new(self.doc, self.elements)
    }
}

/// Forwards `deserialize_*` methods to the last element of a group.
macro_rules! forward_to_last {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                self.last()?.$method(visitor)
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for GroupDeserializer<'a> {
    type Error = DecodingError;

    forward_to_last! {
        deserialize_any deserialize_bool deserialize_char
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64
        deserialize_str deserialize_string deserialize_bytes deserialize_byte_buf
        deserialize_unit deserialize_map deserialize_identifier
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.last()?.deserialize_unit_struct(name, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        // Keep the whole group so `Vec` newtypes still see every occurrence
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(self.seq_access())
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(self.seq_access())
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_seq(self.seq_access())
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.last()?.deserialize_struct(name, fields, visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.last()?.deserialize_enum(name, variants, visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

/// Deserializer for attribute values and `$text` content.
struct TextDeserializer<'a> {
    text: Cow<'a, str>,
    context: &'a str,
}

impl<'a> TextDeserializer<'a> {
    fn scalar_text(&self) -> &str {
        &self.text
    }

    fn context(&self) -> &str {
        self.context
    }
}

impl<'de, 'a> de::Deserializer<'de> for TextDeserializer<'a> {
    type Error = DecodingError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.text.into_owned())
    }

    deserialize_numbers!();

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(string_key(self.text.trim().to_string()))
    }

    serde::forward_to_deserialize_any! {
        str string bytes byte_buf unit_struct seq tuple tuple_struct
        map struct identifier ignored_any
    }
}

enum MapValue<'a> {
    Text(Cow<'a, str>),
    Group(Vec<&'a XmlElement>),
}

/// Map access over an element's attributes, text and child element groups.
struct ElementMapAccess<'a> {
    doc: &'a Document<'a>,
    context: &'a str,
    entries: VecDeque<(String, MapValue<'a>)>,
    value: Option<MapValue<'a>>,
}

impl<'a> ElementMapAccess<'a> {
    fn new(doc: &'a Document<'a>, element: &'a XmlElement, with_text: bool) -> Self {
        let mut entries = VecDeque::new();

        for (name, value) in element.attributes() {
            entries.push_back((
                format!("{}{}", utils::ATTRIBUTE_PREFIX, name),
                MapValue::Text(Cow::Borrowed(value.as_str())),
            ));
        }

        if with_text {
            let text = element.own_text();
            let text = if element.has_element_children() {
                text.trim().to_string()
            } else {
                text
            };
            entries.push_back((utils::TEXT_FIELD.to_string(), MapValue::Text(Cow::Owned(text))));
        }

        let mut groups: IndexMap<&str, Vec<&XmlElement>> = IndexMap::new();
        for child in element.child_elements() {
            groups.entry(child.name()).or_default().push(child);
        }
        for (name, elements) in groups {
            entries.push_back((name.to_string(), MapValue::Group(elements)));
        }

        Self {
            doc,
            context: element.name(),
            entries,
            value: None,
        }
    }
}

impl<'de, 'a> de::MapAccess<'de> for ElementMapAccess<'a> {
    type Error = DecodingError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.entries.pop_front() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(string_key(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.value.take() {
            Some(MapValue::Text(text)) => seed.deserialize(TextDeserializer {
                text,
                context: self.context,
            }),
            Some(MapValue::Group(elements)) => seed.deserialize(GroupDeserializer {
                doc: self.doc,
                elements,
            }),
            None => Err(DecodingError::Shape(
                "map value requested before its key".to_string(),
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Sequence access over a list of elements.
struct ElementSeqAccess<'a> {
    doc: &'a Document<'a>,
    elements: std::vec::IntoIter<&'a XmlElement>,
}

impl<'a> ElementSeqAccess<'a> {
    fn new(doc: &'a Document<'a>, elements: Vec<&'a XmlElement>) -> Self {
        Self {
            doc,
            elements: elements.into_iter(),
        }
    }
}

impl<'de, 'a> de::SeqAccess<'de> for ElementSeqAccess<'a> {
    type Error = DecodingError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.elements.next() {
            Some(element) => seed
                .deserialize(ElementDeserializer {
                    doc: self.doc,
                    element,
                })
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.elements.len())
    }
}

/// Enum access: the first child element names the variant, otherwise the
/// element's text does.
struct ElementEnumAccess<'a> {
    inner: ElementDeserializer<'a>,
}

impl<'de, 'a> de::EnumAccess<'de> for ElementEnumAccess<'a> {
    type Error = DecodingError;
    type Variant = ElementVariantAccess<'a>;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let doc = self.inner.doc;
        match self.inner.element.child_elements().next() {
            Some(child) => {
                let variant = seed.deserialize(string_key(child.name().to_string()))?;
                let content = ElementDeserializer {
                    doc,
                    element: child,
                };
                Ok((variant, ElementVariantAccess { content: Some(content) }))
            }
            None => {
                let name = self.inner.element.text_content().trim().to_string();
                let variant = seed.deserialize(string_key(name))?;
                Ok((variant, ElementVariantAccess { content: None }))
            }
        }
    }
}

struct ElementVariantAccess<'a> {
    content: Option<ElementDeserializer<'a>>,
}

impl<'a> ElementVariantAccess<'a> {
    fn content(self) -> Result<ElementDeserializer<'a>> {
        self.content.ok_or_else(|| {
            DecodingError::Shape("expected a child element naming the variant".to_string())
        })
    }
}

impl<'de, 'a> de::VariantAccess<'de> for ElementVariantAccess<'a> {
    type Error = DecodingError;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.content()?)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> Result<V::Value> {
        Err(DecodingError::Shape(
            "tuple variants are not supported".to_string(),
        ))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_struct(self.content()?, "", fields, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::secure::parse_document;
    use serde::Deserialize;
    use std::collections::HashMap;

    fn decode<T: DeserializeOwned>(xml: &str) -> Result<T> {
        let doc = parse_document(xml, &ParserConfig::default())?;
        let root = doc.root().ok_or(DecodingError::MissingRoot)?;
        from_element(&doc, root)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Line {
        #[serde(rename = "@sku")]
        sku: String,
        #[serde(rename = "@qty")]
        qty: Option<u32>,
        #[serde(rename = "$text")]
        label: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum State {
        Open,
        Closed { reason: String },
        Moved(String),
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: u64,
        price: f64,
        paid: bool,
        note: Option<String>,
        #[serde(default)]
        lines: Vec<Line>,
        state: State,
        previous: Vec<State>,
    }

    #[test]
    fn test_struct_fields_groups_and_attributes() {
        let xml = r#"<order>
            <id> 42 </id>
            <price>9.5</price>
            <paid>1</paid>
            <lines sku="a" qty="2">first</lines>
            <unknown>ignored</unknown>
            <lines sku="b">second</lines>
            <state>Open</state>
            <previous><Closed><reason>done</reason></Closed></previous>
            <previous><Moved>elsewhere</Moved></previous>
        </order>"#;

        let order: Order = decode(xml).unwrap();
        assert_eq!(order.id, 42);
        assert_eq!(order.price, 9.5);
        assert!(order.paid);
        assert_eq!(order.note, None);
        assert_eq!(
            order.lines,
            vec![
                Line {
                    sku: "a".to_string(),
                    qty: Some(2),
                    label: "first".to_string(),
                },
                Line {
                    sku: "b".to_string(),
                    qty: None,
                    label: "second".to_string(),
                },
            ]
        );
        assert_eq!(order.state, State::Open);
        assert_eq!(
            order.previous,
            vec![
                State::Closed {
                    reason: "done".to_string()
                },
                State::Moved("elsewhere".to_string()),
            ]
        );
    }

    #[test]
    fn test_scalar_takes_last_occurrence() {
        #[derive(Deserialize)]
        struct R {
            a: String,
        }
        let r: R = decode("<r><a>1</a><a>2</a></r>").unwrap();
        assert_eq!(r.a, "2");
    }

    #[test]
    fn test_strings_keep_embedded_markup() {
        #[derive(Deserialize)]
        struct R {
            body: String,
            data: String,
            plain: String,
        }
        let r: R = decode(
            "<r><body><b>bold</b> text</body><data><![CDATA[1 < 2]]></data><plain>a &amp; b</plain></r>",
        )
        .unwrap();
        assert_eq!(r.body, "<b>bold</b> text");
        assert_eq!(r.data, "<![CDATA[1 < 2]]>");
        assert_eq!(r.plain, "a & b");
    }

    #[test]
    fn test_maps_read_child_elements() {
        #[derive(Deserialize)]
        struct R {
            extra: HashMap<String, i32>,
        }
        let r: R = decode("<r><extra><x>1</x><y>2</y></extra></r>").unwrap();
        assert_eq!(r.extra.get("x"), Some(&1));
        assert_eq!(r.extra.get("y"), Some(&2));
    }

    #[test]
    fn test_shape_errors() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct R {
            n: u8,
        }

        let err = decode::<R>("<r><n>300</n></r>").unwrap_err();
        assert!(matches!(err, DecodingError::Shape(ref m) if m.contains("invalid integer `300` in <n>")));

        let err = decode::<R>("<r/>").unwrap_err();
        assert!(matches!(err, DecodingError::Shape(ref m) if m.contains("missing field `n`")));
    }
}
