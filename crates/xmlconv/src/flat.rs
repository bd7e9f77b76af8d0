//! Flat-map decoding of single-level documents.
//!
//! Payloads such as `<xml><return_code>SUCCESS</return_code>...</xml>` are
//! often consumed as plain key/value pairs. [`decode_flat`] projects the root's
//! immediate element children into an insertion-ordered map; nested structure
//! below the first level is collapsed into its text content.

use crate::config::ParserConfig;
use crate::document::Document;
use crate::error::ParseError;
use crate::secure;
use indexmap::IndexMap;

/// Insertion-ordered map of element name to text content.
pub type FlatMap = IndexMap<String, String>;

/// Securely parses `xml` and flattens the root's children.
///
/// Returns an empty map when the document has no root element or the root has
/// no element children. When a name repeats, the last value wins and the
/// entry keeps the position of its first occurrence.
///
/// # Examples
///
/// ```rust
/// use xmlconv::{ParserConfig, flat};
///
/// let map = flat::decode_flat(
///     "<root><a>1</a><b>2</b><a>3</a></root>",
///     &ParserConfig::default(),
/// )?;
/// assert_eq!(map.get_index(0), Some((&"a".to_string(), &"3".to_string())));
/// assert_eq!(map["b"], "2");
/// # Ok::<(), xmlconv::ParseError>(())
/// ```
pub fn decode_flat(xml: &str, config: &ParserConfig) -> Result<FlatMap, ParseError> {
    let doc = secure::parse_document(xml, config)?;
    Ok(flatten(&doc))
}

/// Projects an already parsed document into a [`FlatMap`].
pub fn flatten(doc: &Document<'_>) -> FlatMap {
    let mut map = FlatMap::new();
    let Some(root) = doc.root() else {
        return map;
    };

    for child in root.child_elements() {
        map.insert(child.name().to_string(), child.text_content());
    }
    map
}
