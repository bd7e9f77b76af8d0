//! Parsed XML element tree.
//!
//! A [`Document`] is produced only by [`secure::parse_document`](crate::secure::parse_document),
//! so every tree in this crate has passed the secure parser configuration.
//! Text nodes hold resolved character data (predefined entities and character
//! references expanded, CDATA sections unwrapped). Comments and processing
//! instructions are dropped. Each element remembers the byte range of its
//! inner content in the source, so raw inner markup can be recovered verbatim.

use std::ops::Range;

/// A parsed document borrowing its source text.
#[derive(Debug, Clone)]
pub struct Document<'s> {
    pub(crate) source: &'s str,
    pub(crate) root: Option<XmlElement>,
}

impl<'s> Document<'s> {
    /// The root element, if the document has one.
    pub fn root(&self) -> Option<&XmlElement> {
        self.root.as_ref()
    }

    /// The source text the document was parsed from (without a leading BOM).
    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Returns the raw source text between an element's start and end tags.
    ///
    /// Empty elements (`<a/>`) yield an empty string.
    pub fn inner_markup(&self, element: &XmlElement) -> &'s str {
        self.source.get(element.inner.clone()).unwrap_or_default()
    }
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<XmlNode>,
    pub(crate) inner: Range<usize>,
}

impl XmlElement {
    pub(crate) fn new(name: String, attributes: Vec<(String, String)>, inner_start: usize) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
            inner: inner_start..inner_start,
        }
    }

    /// The element's qualified name as written in the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order, values unescaped.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Looks up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All children in document order.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Element children in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Returns `true` if at least one child is an element.
    pub fn has_element_children(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// Concatenation of all descendant character data.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    /// Concatenation of this element's own text children, ignoring descendants.
    pub fn own_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Appends character data, merging with a preceding text node.
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    pub(crate) fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }
}
