//! Entity binding registry.
//!
//! A [`Binding`] is the compiled form of a record type: its root element name
//! and how each serialized field maps onto XML. Bindings are derived from the
//! type's serde metadata by driving its `Deserialize` impl with a probe that
//! records the struct name and field list, then validated against XML naming
//! rules.
//!
//! [`BindingRegistry`] caches one [`EntityWriter`] and one [`EntityReader`] per
//! record type. It is owned by a single execution context (see
//! [`XmlContext`](crate::XmlContext)) and accessed through `&mut self`, so the
//! cache needs no locking; a second context builds its own entries.

use crate::config::EncoderConfig;
use crate::document::Document;
use crate::error::{BindingError, DecodingError, EncodingError};
use crate::xml::{self, utils};
use serde::Serialize;
use serde::de::{self, DeserializeOwned, Visitor};
use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Write;
use std::marker::PhantomData;
use tracing::debug;

/// A record type that can be bound to XML.
///
/// Implemented for every `'static` type that is both `Serialize` and
/// `DeserializeOwned`; whether the type's shape is actually bindable is
/// decided when its binding is built.
pub trait XmlEntity: Serialize + DeserializeOwned + 'static {}

impl<T> XmlEntity for T where T: Serialize + DeserializeOwned + 'static {}

/// How a serialized field is represented in XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A child element named after the field.
    Element,
    /// An attribute (field serialized as `@name`).
    Attribute,
    /// The element's character data (field serialized as `$text`).
    Text,
}

/// A single serialized field of a bound record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// The serialized field name, including any `@` prefix.
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldBinding {
    /// The XML element or attribute name this field maps to.
    pub fn xml_name(&self) -> &'static str {
        utils::strip_attribute_prefix(self.name)
    }
}

/// Compiled mapping between a record type and its XML representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    type_name: &'static str,
    root: &'static str,
    fields: Vec<FieldBinding>,
}

impl Binding {
    /// Builds the binding for `T`.
    pub fn of<T: DeserializeOwned>() -> Result<Self, BindingError> {
        let type_name = type_name::<T>();
        let mut shape = None;
        // The probe always aborts deserialization; the outcome is in `shape`.
        let _ = T::deserialize(ShapeProbe { shape: &mut shape });

        match shape {
            Some(ProbedShape::Struct { name, fields }) => Self::compile(type_name, name, fields),
            Some(ProbedShape::Other(shape)) => {
                Err(BindingError::UnsupportedShape { type_name, shape })
            }
            None => Err(BindingError::UnsupportedShape {
                type_name,
                shape: "a custom deserializer",
            }),
        }
    }

    fn compile(
        type_name: &'static str,
        root: &'static str,
        names: &'static [&'static str],
    ) -> Result<Self, BindingError> {
        if !utils::is_valid_xml_name(root) {
            return Err(BindingError::InvalidName {
                type_name,
                name: root.to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(names.len());
        for &name in names {
            let kind = if utils::is_text_field(name) {
                FieldKind::Text
            } else if utils::is_attribute_field(name) {
                FieldKind::Attribute
            } else {
                FieldKind::Element
            };
            let field = FieldBinding { name, kind };
            if kind != FieldKind::Text && !utils::is_valid_xml_name(field.xml_name()) {
                return Err(BindingError::InvalidName {
                    type_name,
                    name: name.to_string(),
                });
            }
            if !seen.insert(name) {
                return Err(BindingError::DuplicateField {
                    type_name,
                    name: name.to_string(),
                });
            }
            fields.push(field);
        }

        Ok(Self {
            type_name,
            root,
            fields,
        })
    }

    /// The Rust type this binding was built for.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The root element name.
    pub fn root(&self) -> &'static str {
        self.root
    }

    /// Serialized fields in declaration order.
    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    /// Looks up a field by its serialized name.
    pub fn field(&self, name: &str) -> Option<&FieldBinding> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Compiled writer for one record type.
pub struct EntityWriter<T> {
    binding: Binding,
    config: EncoderConfig,
    _marker: PhantomData<fn(&T)>,
}

impl<T: XmlEntity> EntityWriter<T> {
    fn build(config: &EncoderConfig) -> Result<Self, BindingError> {
        Ok(Self {
            binding: Binding::of::<T>()?,
            config: config.clone(),
            _marker: PhantomData,
        })
    }

    /// The binding this writer was compiled from.
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// The encoder settings captured when the writer was built.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Writes `record` as an XML document to `out`.
    pub fn write<W: Write>(&self, record: &T, out: W) -> Result<(), EncodingError> {
        xml::ser::to_writer(record, self.binding.root(), &self.config, out)
    }

    /// Writes `record` as an XML string.
    pub fn write_string(&self, record: &T) -> Result<String, EncodingError> {
        let mut buffer = Vec::new();
        self.write(record, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| EncodingError::Custom(e.to_string()))
    }
}

impl<T> fmt::Debug for EntityWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityWriter")
            .field("binding", &self.binding)
            .field("config", &self.config)
            .finish()
    }
}

/// Compiled reader for one record type.
pub struct EntityReader<T> {
    binding: Binding,
    _marker: PhantomData<fn() -> T>,
}

impl<T: XmlEntity> EntityReader<T> {
    fn build() -> Result<Self, BindingError> {
        Ok(Self {
            binding: Binding::of::<T>()?,
            _marker: PhantomData,
        })
    }

    /// The binding this reader was compiled from.
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Reads a record from a securely parsed document.
    pub fn read(&self, doc: &Document<'_>) -> Result<T, DecodingError> {
        let root = doc.root().ok_or(DecodingError::MissingRoot)?;
        if root.name() != self.binding.root() {
            return Err(DecodingError::RootMismatch {
                expected: self.binding.root().to_string(),
                found: root.name().to_string(),
            });
        }
        xml::de::from_element(doc, root)
    }
}

impl<T> fmt::Debug for EntityReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityReader")
            .field("binding", &self.binding)
            .finish()
    }
}

/// Counters for binding construction, for observing cache reuse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingStats {
    pub writers_built: usize,
    pub readers_built: usize,
}

/// Per-context cache of compiled readers and writers.
pub struct BindingRegistry {
    config: EncoderConfig,
    writers: HashMap<TypeId, Box<dyn Any + Send>>,
    readers: HashMap<TypeId, Box<dyn Any + Send>>,
    stats: BindingStats,
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

impl BindingRegistry {
    /// Creates an empty registry whose writers use `config`.
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            writers: HashMap::new(),
            readers: HashMap::new(),
            stats: BindingStats::default(),
        }
    }

    /// The encoder settings new writers are built with.
    pub fn encoder_config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Returns the cached writer for `T`, building it on first use.
    pub fn get_or_create_writer<T: XmlEntity>(&mut self) -> Result<&EntityWriter<T>, BindingError> {
        let id = TypeId::of::<T>();
        if !self.writers.contains_key(&id) {
            let writer = EntityWriter::<T>::build(&self.config)?;
            debug!(
                type_name = writer.binding().type_name(),
                root = writer.binding().root(),
                fields = writer.binding().fields().len(),
                "Built XML writer binding"
            );
            self.stats.writers_built += 1;
            self.writers.insert(id, Box::new(writer));
        }
        Ok(self.writers[&id]
            .downcast_ref::<EntityWriter<T>>()
            .expect("writer cache entries are keyed by their own TypeId"))
    }

    /// Returns the cached reader for `T`, building it on first use.
    pub fn get_or_create_reader<T: XmlEntity>(&mut self) -> Result<&EntityReader<T>, BindingError> {
        let id = TypeId::of::<T>();
        if !self.readers.contains_key(&id) {
            let reader = EntityReader::<T>::build()?;
            debug!(
                type_name = reader.binding().type_name(),
                root = reader.binding().root(),
                fields = reader.binding().fields().len(),
                "Built XML reader binding"
            );
            self.stats.readers_built += 1;
            self.readers.insert(id, Box::new(reader));
        }
        Ok(self.readers[&id]
            .downcast_ref::<EntityReader<T>>()
            .expect("reader cache entries are keyed by their own TypeId"))
    }

    /// Construction counters since the registry was created.
    pub fn stats(&self) -> BindingStats {
        self.stats
    }

    /// Number of cached writers and readers.
    pub fn len(&self) -> usize {
        self.writers.len() + self.readers.len()
    }

    /// Returns `true` if nothing has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("config", &self.config)
            .field("writers", &self.writers.len())
            .field("readers", &self.readers.len())
            .field("stats", &self.stats)
            .finish()
    }
}

/// What the probe observed about a type's serde shape.
enum ProbedShape {
    Struct {
        name: &'static str,
        fields: &'static [&'static str],
    },
    Other(&'static str),
}

/// Error used to abort deserialization once the shape is known.
#[derive(Debug)]
struct ProbeDone;

impl fmt::Display for ProbeDone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("shape probe finished")
    }
}

impl std::error::Error for ProbeDone {}

impl de::Error for ProbeDone {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        ProbeDone
    }
}

/// Deserializer that records the first shape request and aborts.
struct ShapeProbe<'a> {
    shape: &'a mut Option<ProbedShape>,
}

impl ShapeProbe<'_> {
    fn other<T>(self, shape: &'static str) -> Result<T, ProbeDone> {
        *self.shape = Some(ProbedShape::Other(shape));
        Err(ProbeDone)
    }
}

macro_rules! probe_other {
    ($($method:ident => $shape:literal),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeDone> {
                self.other($shape)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ShapeProbe<'_> {
    type Error = ProbeDone;

    probe_other! {
        deserialize_any => "a self-describing type",
        deserialize_bool => "a boolean",
        deserialize_i8 => "an integer",
        deserialize_i16 => "an integer",
        deserialize_i32 => "an integer",
        deserialize_i64 => "an integer",
        deserialize_u8 => "an integer",
        deserialize_u16 => "an integer",
        deserialize_u32 => "an integer",
        deserialize_u64 => "an integer",
        deserialize_f32 => "a float",
        deserialize_f64 => "a float",
        deserialize_char => "a character",
        deserialize_str => "a string",
        deserialize_string => "a string",
        deserialize_bytes => "a byte array",
        deserialize_byte_buf => "a byte array",
        deserialize_option => "an option",
        deserialize_unit => "a unit",
        deserialize_seq => "a sequence",
        deserialize_map => "a map",
        deserialize_identifier => "an identifier",
        deserialize_ignored_any => "an ignored value",
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, ProbeDone> {
        self.other("a unit struct")
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ProbeDone> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> Result<V::Value, ProbeDone> {
        self.other("a tuple")
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, ProbeDone> {
        self.other("a tuple struct")
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeDone> {
        *self.shape = Some(ProbedShape::Struct { name, fields });
        Err(ProbeDone)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeDone> {
        self.other("an enum")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    #[serde(rename = "xml")]
    struct Notify {
        #[serde(rename = "ToUserName")]
        to_user: String,
        #[serde(rename = "@version")]
        version: Option<String>,
    }

    #[derive(Serialize, Deserialize)]
    struct Wrapper(Notify);

    #[derive(Serialize, Deserialize)]
    struct BadField {
        #[serde(rename = "has space")]
        value: String,
    }

    #[derive(Serialize, Deserialize)]
    struct Flattened {
        #[serde(flatten)]
        extra: BTreeMap<String, String>,
    }

    #[test]
    fn test_binding_reads_serde_metadata() {
        let binding = Binding::of::<Notify>().unwrap();
        assert_eq!(binding.root(), "xml");
        assert_eq!(binding.fields().len(), 2);
        assert_eq!(binding.field("ToUserName").unwrap().kind, FieldKind::Element);
        let version = binding.field("@version").unwrap();
        assert_eq!(version.kind, FieldKind::Attribute);
        assert_eq!(version.xml_name(), "version");
    }

    #[test]
    fn test_binding_follows_newtype_wrappers() {
        let binding = Binding::of::<Wrapper>().unwrap();
        assert_eq!(binding.root(), "xml");
    }

    #[test]
    fn test_binding_rejects_non_struct_shapes() {
        assert!(matches!(
            Binding::of::<String>(),
            Err(BindingError::UnsupportedShape { shape: "a string", .. })
        ));
        assert!(matches!(
            Binding::of::<Vec<Notify>>(),
            Err(BindingError::UnsupportedShape { shape: "a sequence", .. })
        ));
        assert!(matches!(
            Binding::of::<Flattened>(),
            Err(BindingError::UnsupportedShape { shape: "a map", .. })
        ));
    }

    #[test]
    fn test_binding_rejects_invalid_names() {
        assert!(matches!(
            Binding::of::<BadField>(),
            Err(BindingError::InvalidName { ref name, .. }) if name == "has space"
        ));
    }

    #[test]
    fn test_registry_reuses_entries() {
        let mut registry = BindingRegistry::default();
        assert!(registry.is_empty());

        registry.get_or_create_writer::<Notify>().unwrap();
        registry.get_or_create_writer::<Notify>().unwrap();
        registry.get_or_create_reader::<Notify>().unwrap();

        assert_eq!(
            registry.stats(),
            BindingStats {
                writers_built: 1,
                readers_built: 1
            }
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_does_not_cache_failures() {
        let mut registry = BindingRegistry::default();
        assert!(registry.get_or_create_reader::<BadField>().is_err());
        assert!(registry.get_or_create_reader::<BadField>().is_err());
        assert!(registry.is_empty());
        assert_eq!(registry.stats(), BindingStats::default());
    }
}
