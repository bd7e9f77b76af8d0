//! Hardened XML ingestion.
//!
//! Every payload that enters the crate, whether it is decoded into a record
//! or flattened into a map, is parsed by [`parse_document`]. The parser never
//! performs I/O of its own, so external DTD subsets and external entities are
//! never fetched. On top of that it enforces:
//!
//! - references to declared *external* entities are rejected;
//! - references to declared *internal* entities are rejected rather than
//!   expanded, which rules out exponential expansion ("billion laughs");
//! - only the five predefined entities and character references are resolved,
//!   in text and in attribute values alike;
//! - parameter entity references inside the internal subset are never expanded;
//! - `xi:include` elements are ordinary elements;
//! - element nesting is bounded by [`ParserConfig::max_depth`].
//!
//! A DOCTYPE declaration is tolerated under [`DoctypePolicy::Permit`] and
//! refused under [`DoctypePolicy::Reject`].

use crate::config::{DoctypePolicy, ParserConfig};
use crate::document::{Document, XmlElement};
use crate::error::{DecodingError, ParseError, Rejection};
use crate::xml::utils;
use encoding_rs::{Encoding, UTF_8};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;
use tracing::{debug, warn};

/// Decodes raw payload bytes into text.
///
/// Without an explicit `charset` the input is sniffed for a UTF-8 or UTF-16
/// byte-order mark and otherwise treated as UTF-8. With a charset, a matching
/// BOM is skipped and the rest is decoded with that charset. Malformed byte
/// sequences are an error; they are never replaced.
pub fn decode_bytes<'a>(
    bytes: &'a [u8],
    charset: Option<&'static Encoding>,
) -> Result<Cow<'a, str>, DecodingError> {
    let bom = Encoding::for_bom(bytes);
    let (encoding, body) = match (charset, bom) {
        (Some(explicit), Some((sniffed, len))) if explicit == sniffed => (explicit, &bytes[len..]),
        (Some(explicit), _) => (explicit, bytes),
        (None, Some((sniffed, len))) => (sniffed, &bytes[len..]),
        (None, None) => (UTF_8, bytes),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or(DecodingError::Charset {
            encoding: encoding.name(),
        })
}

/// Parses `xml` into a [`Document`] under the secure configuration.
///
/// A document without any element (empty input, or only a prolog) yields a
/// [`Document`] whose root is `None`.
pub fn parse_document<'s>(xml: &'s str, config: &ParserConfig) -> Result<Document<'s>, ParseError> {
    let source = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut builder = TreeBuilder::new(config);

    // quick-xml ends a DOCTYPE at the first `>`, even inside a quoted literal
    // of the internal subset, so a prolog DOCTYPE is cut out and read here.
    match find_prolog_doctype(source) {
        Some(span) => {
            builder.feed(&source[..span.start], 0)?;
            builder.doctype(&source[span.start + 2..span.end - 1])?;
            builder.feed(&source[span.end..], span.end)?;
        }
        None => builder.feed(source, 0)?,
    }

    builder.finish(source)
}

/// Element tree under construction, fed one source segment at a time.
struct TreeBuilder<'c> {
    config: &'c ParserConfig,
    entities: DeclaredEntities,
    stack: Vec<XmlElement>,
    root: Option<XmlElement>,
    seen_doctype: bool,
}

impl<'c> TreeBuilder<'c> {
    fn new(config: &'c ParserConfig) -> Self {
        Self {
            config,
            entities: DeclaredEntities::default(),
            stack: Vec::new(),
            root: None,
            seen_doctype: false,
        }
    }

    /// Parses `segment`, which starts at byte `base` of the document source.
    fn feed(&mut self, segment: &str, base: usize) -> Result<(), ParseError> {
        let mut reader = Reader::from_str(segment);
        reader.config_mut().trim_text(false);

        loop {
            let before = base + reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|source| ParseError::Syntax {
                position: (base as u64) + reader.error_position() as u64,
                source,
            })?;

            match event {
                Event::Start(start) => {
                    self.check_new_element(&start)?;
                    let name = element_name(&start);
                    let attributes = read_attributes(&start, &name, &self.entities)?;
                    let inner_start = base + reader.buffer_position() as usize;
                    self.stack.push(XmlElement::new(name, attributes, inner_start));
                }
                Event::Empty(start) => {
                    self.check_new_element(&start)?;
                    let name = element_name(&start);
                    let attributes = read_attributes(&start, &name, &self.entities)?;
                    let position = base + reader.buffer_position() as usize;
                    self.attach(XmlElement::new(name, attributes, position));
                }
                Event::End(end) => {
                    let Some(mut element) = self.stack.pop() else {
                        return Err(ParseError::UnexpectedEndTag {
                            name: String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                        });
                    };
                    element.inner.end = before;
                    self.attach(element);
                }
                Event::Text(text) => {
                    let text = String::from_utf8_lossy(&text);
                    match self.stack.last_mut() {
                        Some(parent) => parent.push_text(&text),
                        None if utils::is_whitespace(&text) => {}
                        None => return Err(ParseError::TextOutsideRoot),
                    }
                }
                Event::CData(cdata) => {
                    let Some(parent) = self.stack.last_mut() else {
                        return Err(ParseError::TextOutsideRoot);
                    };
                    parent.push_text(&String::from_utf8_lossy(&cdata));
                }
                Event::GeneralRef(reference) => {
                    let Some(parent) = self.stack.last_mut() else {
                        return Err(ParseError::TextOutsideRoot);
                    };
                    let name = String::from_utf8_lossy(&reference);
                    let mut resolved = String::new();
                    push_reference(&mut resolved, &name, &self.entities)?;
                    parent.push_text(&resolved);
                }
                Event::DocType(doctype) => {
                    self.doctype(&String::from_utf8_lossy(&doctype))?;
                }
                Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
                Event::Eof => return Ok(()),
            }
        }
    }

    /// Applies the DOCTYPE policy to the content of a `<!DOCTYPE ...>` declaration.
    fn doctype(&mut self, decl: &str) -> Result<(), ParseError> {
        if self.seen_doctype || self.root.is_some() || !self.stack.is_empty() {
            return Err(ParseError::MisplacedDoctype);
        }
        if self.config.doctype == DoctypePolicy::Reject {
            warn!("Rejected document carrying a DOCTYPE declaration");
            return Err(Rejection::DoctypeForbidden.into());
        }
        let info = inspect_doctype(decl);
        if let Some(system_id) = &info.external_subset {
            debug!(root = %info.name, system_id = %system_id, "Ignoring external DTD subset");
        }
        debug!(
            root = %info.name,
            general = info.entities.general.len(),
            parameter = info.entities.parameter.len(),
            "Inspected DOCTYPE declaration"
        );
        self.entities = info.entities;
        self.seen_doctype = true;
        Ok(())
    }

    fn check_new_element(&self, start: &BytesStart<'_>) -> Result<(), ParseError> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ParseError::MultipleRoots {
                name: element_name(start),
            });
        }
        if self.stack.len() >= self.config.max_depth {
            warn!(
                limit = self.config.max_depth,
                "Rejected document exceeding the nesting limit"
            );
            return Err(Rejection::DepthLimit {
                limit: self.config.max_depth,
            }
            .into());
        }
        Ok(())
    }

    fn attach(&mut self, element: XmlElement) {
        match self.stack.last_mut() {
            Some(parent) => parent.push_element(element),
            None => self.root = Some(element),
        }
    }

    fn finish<'s>(self, source: &'s str) -> Result<Document<'s>, ParseError> {
        if let Some(open) = self.stack.last() {
            return Err(ParseError::UnclosedElement {
                name: open.name().to_string(),
            });
        }
        Ok(Document {
            source,
            root: self.root,
        })
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

/// Locates a `<!DOCTYPE ...>` declaration in the prolog.
///
/// Only whitespace, processing instructions (including the XML declaration)
/// and comments may precede it. Returns `None` when the prolog holds no
/// DOCTYPE or the declaration is never terminated.
fn find_prolog_doctype(source: &str) -> Option<Range<usize>> {
    let mut pos = 0;
    loop {
        let rest = &source[pos..];
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        pos += rest.len() - trimmed.len();

        if trimmed.starts_with("<?") {
            pos += trimmed.find("?>")? + 2;
        } else if trimmed.starts_with("<!--") {
            pos += trimmed.find("-->")? + 3;
        } else if trimmed.starts_with("<!DOCTYPE") {
            let len = declaration_len(trimmed)?;
            return Some(pos..pos + len);
        } else {
            return None;
        }
    }
}

/// Length of the markup declaration at the start of `decl`, up to and
/// including its closing `>`.
///
/// Quoted literals, and comments and processing instructions inside the
/// internal subset, may contain `>` without ending the declaration.
fn declaration_len(decl: &str) -> Option<usize> {
    let bytes = decl.as_bytes();
    let mut quote: Option<u8> = None;
    let mut in_subset = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => in_subset = true,
                b']' => in_subset = false,
                b'<' if in_subset && decl[i..].starts_with("<!--") => {
                    i += decl[i..].find("-->")? + 3;
                    continue;
                }
                b'<' if in_subset && decl[i..].starts_with("<?") => {
                    i += decl[i..].find("?>")? + 2;
                    continue;
                }
                b'>' if !in_subset => return Some(i + 1),
                _ => {}
            },
        }
        i += 1;
    }
    None
}

fn read_attributes(
    start: &BytesStart<'_>,
    element: &str,
    entities: &DeclaredEntities,
) -> Result<Vec<(String, String)>, ParseError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::Attribute {
            element: element.to_string(),
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        if raw.contains('<') {
            return Err(ParseError::Attribute {
                element: element.to_string(),
                message: format!("`<` is not allowed in value of `{}`", key),
            });
        }
        let value = expand_references(&raw, entities).map_err(|e| match e {
            ExpandError::Rejected(rejection) => ParseError::Rejected(rejection),
            ExpandError::Unterminated => ParseError::Attribute {
                element: element.to_string(),
                message: format!("unterminated reference in value of `{}`", key),
            },
        })?;
        attributes.push((key, value));
    }
    Ok(attributes)
}

enum ExpandError {
    Rejected(Rejection),
    Unterminated,
}

/// Resolves the references in an attribute value under the same policy as text.
fn expand_references(raw: &str, entities: &DeclaredEntities) -> Result<String, ExpandError> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after.find(';').ok_or(ExpandError::Unterminated)?;
        push_reference(&mut out, &after[..semi], entities).map_err(ExpandError::Rejected)?;
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Appends the replacement text of `&name;` to `out`, or rejects the reference.
fn push_reference(out: &mut String, name: &str, entities: &DeclaredEntities) -> Result<(), Rejection> {
    if let Some(reference) = name.strip_prefix('#') {
        let code = match reference.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => reference.parse::<u32>().ok(),
        };
        return match code.and_then(char::from_u32).filter(|c| is_xml_char(*c)) {
            Some(c) => {
                out.push(c);
                Ok(())
            }
            None => Err(Rejection::InvalidCharRef {
                reference: name.to_string(),
            }),
        };
    }

    if let Some(text) = predefined_entity(name) {
        out.push_str(text);
        return Ok(());
    }

    let rejection = match entities.general.get(name) {
        Some(EntityDecl::External { system_id }) => Rejection::ExternalEntity {
            name: name.to_string(),
            system_id: system_id.clone(),
        },
        Some(EntityDecl::Internal) => Rejection::EntityExpansion {
            name: name.to_string(),
        },
        None => Rejection::UndeclaredEntity {
            name: name.to_string(),
        },
    };
    warn!(entity = %name, reason = %rejection, "Rejected entity reference");
    Err(rejection)
}

fn predefined_entity(name: &str) -> Option<&'static str> {
    match name {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => None,
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// An entity declared in the internal DTD subset.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EntityDecl {
    /// Replacement text given inline; never expanded.
    Internal,
    /// `SYSTEM`/`PUBLIC` entity; never fetched.
    External { system_id: String },
}

#[derive(Debug, Default)]
struct DeclaredEntities {
    general: HashMap<String, EntityDecl>,
    parameter: HashMap<String, EntityDecl>,
}

impl DeclaredEntities {
    fn declare(&mut self, name: String, decl: EntityDecl, is_parameter: bool) {
        let map = if is_parameter {
            &mut self.parameter
        } else {
            &mut self.general
        };
        // First declaration wins
        map.entry(name).or_insert(decl);
    }
}

/// What the parser learned from a DOCTYPE declaration.
#[derive(Debug, Default)]
struct DoctypeInfo {
    name: String,
    external_subset: Option<String>,
    entities: DeclaredEntities,
}

/// Reads the content of a `<!DOCTYPE ...>` declaration.
///
/// Only what the entity policy needs is extracted: the document type name,
/// the external subset identifier, and the entity declarations of the
/// internal subset. Anything unrecognized is skipped.
fn inspect_doctype(decl: &str) -> DoctypeInfo {
    let mut scanner = Scanner::new(decl);
    scanner.skip_ws();
    scanner.eat_keyword("DOCTYPE");
    scanner.skip_ws();

    let mut info = DoctypeInfo {
        name: scanner.take_name().to_string(),
        ..Default::default()
    };
    scanner.skip_ws();
    info.external_subset = scanner.external_id();
    scanner.skip_ws();

    if scanner.eat("[") {
        let subset_end = scanner.rest.rfind(']').unwrap_or(scanner.rest.len());
        let mut subset = Scanner::new(&scanner.rest[..subset_end]);
        subset.declarations(&mut info.entities);
    }
    info
}

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t', '\r', '\n']);
    }

    fn eat(&mut self, token: &str) -> bool {
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Consumes `keyword` only when it is followed by whitespace or the end.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.rest.strip_prefix(keyword) {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                self.rest = rest;
                true
            }
            _ => false,
        }
    }

    fn take_name(&mut self) -> &'a str {
        let end = self
            .rest
            .find(|c: char| c.is_whitespace() || matches!(c, '[' | '>' | '"' | '\''))
            .unwrap_or(self.rest.len());
        let (name, rest) = self.rest.split_at(end);
        self.rest = rest;
        name
    }

    fn take_quoted(&mut self) -> Option<&'a str> {
        let quote = self.rest.chars().next().filter(|c| matches!(c, '"' | '\''))?;
        let body = &self.rest[1..];
        let end = body.find(quote)?;
        self.rest = &body[end + 1..];
        Some(&body[..end])
    }

    /// Parses an optional `SYSTEM "uri"` or `PUBLIC "pubid" "uri"`, returning the URI.
    fn external_id(&mut self) -> Option<String> {
        if self.eat_keyword("SYSTEM") {
            self.skip_ws();
            return self.take_quoted().map(str::to_string);
        }
        if self.eat_keyword("PUBLIC") {
            self.skip_ws();
            self.take_quoted()?;
            self.skip_ws();
            return self.take_quoted().map(str::to_string);
        }
        None
    }

    /// Skips past the next `>` that is not inside a quoted literal.
    fn skip_declaration(&mut self) {
        let mut quote: Option<char> = None;
        for (i, c) in self.rest.char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '>') => {
                    self.rest = &self.rest[i + 1..];
                    return;
                }
                (None, _) => {}
            }
        }
        self.rest = "";
    }

    fn skip_past(&mut self, terminator: &str) {
        self.rest = match self.rest.find(terminator) {
            Some(i) => &self.rest[i + terminator.len()..],
            None => "",
        };
    }

    /// Walks the internal subset collecting entity declarations.
    fn declarations(&mut self, entities: &mut DeclaredEntities) {
        while let Some(start) = self.rest.find('<') {
            self.rest = &self.rest[start..];
            if self.eat("<!--") {
                self.skip_past("-->");
            } else if self.eat("<?") {
                self.skip_past("?>");
            } else if self.eat("<!ENTITY") {
                self.entity_declaration(entities);
            } else {
                self.rest = &self.rest[1..];
                self.skip_declaration();
            }
        }
    }

    fn entity_declaration(&mut self, entities: &mut DeclaredEntities) {
        self.skip_ws();
        let is_parameter = self.eat_keyword("%");
        self.skip_ws();
        let name = self.take_name().to_string();
        self.skip_ws();

        let decl = if self.take_quoted().is_some() {
            Some(EntityDecl::Internal)
        } else {
            self.external_id()
                .map(|system_id| EntityDecl::External { system_id })
        };

        if let Some(decl) = decl
            && !name.is_empty()
        {
            entities.declare(name, decl, is_parameter);
        }
        self.skip_declaration();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_doctype_collects_entities() {
        let info = inspect_doctype(
            r#"foo [
                <!-- <!ENTITY hidden SYSTEM "nope"> -->
                <!ENTITY x SYSTEM "file:///etc/hostname">
                <!ENTITY y "internal > value">
                <!ENTITY % pe PUBLIC "-//X//EN" "http://example.com/pe.dtd">
                <!ENTITY z PUBLIC '-//Y//EN' 'http://example.com/z'>
                <!ELEMENT foo (#PCDATA)>
                <!ENTITY x "second declaration is ignored">
            ]"#,
        );

        assert_eq!(info.name, "foo");
        assert_eq!(info.external_subset, None);
        assert_eq!(
            info.entities.general.get("x"),
            Some(&EntityDecl::External {
                system_id: "file:///etc/hostname".to_string()
            })
        );
        assert_eq!(info.entities.general.get("y"), Some(&EntityDecl::Internal));
        assert_eq!(
            info.entities.general.get("z"),
            Some(&EntityDecl::External {
                system_id: "http://example.com/z".to_string()
            })
        );
        assert!(info.entities.parameter.contains_key("pe"));
        assert!(!info.entities.general.contains_key("hidden"));
        assert!(!info.entities.general.contains_key("pe"));
    }

    #[test]
    fn test_inspect_doctype_external_subset() {
        let info = inspect_doctype(r#"DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0//EN" "http://www.w3.org/TR/xhtml1.dtd""#);
        assert_eq!(info.name, "html");
        assert_eq!(
            info.external_subset.as_deref(),
            Some("http://www.w3.org/TR/xhtml1.dtd")
        );

        let info = inspect_doctype("note SYSTEM 'note.dtd'");
        assert_eq!(info.name, "note");
        assert_eq!(info.external_subset.as_deref(), Some("note.dtd"));
    }

    #[test]
    fn test_push_reference() {
        let entities = DeclaredEntities::default();
        let mut out = String::new();
        push_reference(&mut out, "lt", &entities).unwrap();
        push_reference(&mut out, "#65", &entities).unwrap();
        push_reference(&mut out, "#x4e2d", &entities).unwrap();
        assert_eq!(out, "<A中");

        assert!(matches!(
            push_reference(&mut out, "#0", &entities),
            Err(Rejection::InvalidCharRef { .. })
        ));
        assert!(matches!(
            push_reference(&mut out, "nbsp", &entities),
            Err(Rejection::UndeclaredEntity { .. })
        ));
    }

    #[test]
    fn test_expand_references_in_attribute_values() {
        let entities = DeclaredEntities::default();
        assert!(matches!(
            expand_references("a &amp; b &#x3C;", &entities),
            Ok(ref s) if s == "a & b <"
        ));
        assert!(matches!(
            expand_references("broken & value", &entities),
            Err(ExpandError::Unterminated)
        ));
    }

    #[test]
    fn test_decode_bytes_sniffs_bom() {
        let utf16: Vec<u8> = [0xFF, 0xFE]
            .into_iter()
            .chain("<a/>".encode_utf16().flat_map(|u| u.to_le_bytes()))
            .collect();
        assert_eq!(decode_bytes(&utf16, None).unwrap(), "<a/>");

        let utf8_bom = b"\xEF\xBB\xBF<a/>";
        assert_eq!(decode_bytes(utf8_bom, None).unwrap(), "<a/>");
    }

    #[test]
    fn test_decode_bytes_borrows_utf8_input() {
        let input = b"<a/>".to_vec();
        let text = decode_bytes(&input, None).unwrap();
        assert!(matches!(text, Cow::Borrowed("<a/>")));
    }

    #[test]
    fn test_declaration_len_skips_quoted_gt() {
        assert_eq!(declaration_len("<!DOCTYPE r>"), Some(12));
        let decl = r#"<!DOCTYPE r [<!ENTITY y "a>b"><!-- '> --><?pi >?>]>"#;
        assert_eq!(declaration_len(decl), Some(decl.len()));
        assert_eq!(declaration_len(r#"<!DOCTYPE r SYSTEM "x>"#), None);
    }

    #[test]
    fn test_find_prolog_doctype() {
        let xml = "<?xml version=\"1.0\"?>\n<!-- > -->\n<!DOCTYPE r [<!ENTITY y 'a>b'>]><r/>";
        let span = find_prolog_doctype(xml).unwrap();
        assert_eq!(&xml[span.clone()], "<!DOCTYPE r [<!ENTITY y 'a>b'>]>");
        assert_eq!(&xml[span.end..], "<r/>");

        assert_eq!(find_prolog_doctype("<r/><!DOCTYPE r>"), None);
        assert_eq!(find_prolog_doctype("<r/>"), None);
    }

    #[test]
    fn test_parse_document_spans_after_doctype() {
        let xml = r#"<!DOCTYPE r [<!ENTITY y "a>b">]><r><c>x</c></r>"#;
        let doc = parse_document(xml, &ParserConfig::default()).unwrap();
        assert_eq!(doc.inner_markup(doc.root().unwrap()), "<c>x</c>");
    }

    #[test]
    fn test_decode_bytes_rejects_malformed_input() {
        let err = decode_bytes(b"<a>\xFF</a>", None).unwrap_err();
        assert!(matches!(err, DecodingError::Charset { encoding: "UTF-8" }));
    }

    #[test]
    fn test_decode_bytes_explicit_charset() {
        let (gbk, _, _) = encoding_rs::GBK.encode("<a>中文</a>");
        assert_eq!(
            decode_bytes(&gbk, Some(encoding_rs::GBK)).unwrap(),
            "<a>中文</a>"
        );
    }

    #[test]
    fn test_parse_document_spans() {
        let xml = "<r><c>x<b>y</b></c><e/></r>";
        let doc = parse_document(xml, &ParserConfig::default()).unwrap();
        let root = doc.root().unwrap();
        let c = root.child_elements().next().unwrap();
        assert_eq!(doc.inner_markup(root), "<c>x<b>y</b></c><e/>");
        assert_eq!(doc.inner_markup(c), "x<b>y</b>");
        assert_eq!(c.text_content(), "xy");
    }
}
