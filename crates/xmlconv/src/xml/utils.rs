//! Utility functions and constants shared by the encoder and decoder.
//!
//! This module provides the field naming conventions that map serde field
//! names onto XML attributes and character data, and XML name validation.

/// Field name that maps to the element's character data.
pub const TEXT_FIELD: &str = "$text";

/// Prefix marking a field that maps to an XML attribute.
pub const ATTRIBUTE_PREFIX: char = '@';

/// Checks if a field name represents an attribute (e.g., `@id`).
pub fn is_attribute_field(key: &str) -> bool {
    key.starts_with(ATTRIBUTE_PREFIX)
}

/// Strips the attribute prefix from a field name.
///
/// Returns the field name without the leading `@`. If the field
/// doesn't start with `@`, returns the original name.
pub fn strip_attribute_prefix(key: &str) -> &str {
    key.strip_prefix(ATTRIBUTE_PREFIX).unwrap_or(key)
}

/// Checks if a field name maps to the element's character data.
pub fn is_text_field(key: &str) -> bool {
    key == TEXT_FIELD
}

/// Checks if `name` is a valid XML 1.0 element or attribute name.
///
/// Qualified names (`xi:include`) are accepted; the prefix is passed
/// through without namespace processing.
pub fn is_valid_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// Checks if text consists only of XML whitespace.
pub fn is_whitespace(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\n' | b'\r' | b'\t'))
}

/// Converts a Rust boolean to its string representation for XML.
pub fn bool_to_string(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_attribute_field() {
        assert!(is_attribute_field("@id"));
        assert!(is_attribute_field("@lang"));
        assert!(!is_attribute_field("id"));
        assert!(!is_attribute_field("$text"));
    }

    #[test]
    fn test_strip_attribute_prefix() {
        assert_eq!(strip_attribute_prefix("@id"), "id");
        assert_eq!(strip_attribute_prefix("id"), "id");
    }

    #[test]
    fn test_is_valid_xml_name() {
        assert!(is_valid_xml_name("xml"));
        assert!(is_valid_xml_name("ToUserName"));
        assert!(is_valid_xml_name("_private"));
        assert!(is_valid_xml_name("xi:include"));
        assert!(is_valid_xml_name("out-trade.no2"));
        assert!(is_valid_xml_name("名字"));
        assert!(!is_valid_xml_name(""));
        assert!(!is_valid_xml_name("1st"));
        assert!(!is_valid_xml_name("-dash"));
        assert!(!is_valid_xml_name("has space"));
        assert!(!is_valid_xml_name("$text"));
        assert!(!is_valid_xml_name("a<b"));
    }

    #[test]
    fn test_is_whitespace() {
        assert!(is_whitespace(""));
        assert!(is_whitespace(" \n\t\r"));
        assert!(!is_whitespace(" x "));
    }

    #[test]
    fn test_bool_to_string() {
        assert_eq!(bool_to_string(true), "true");
        assert_eq!(bool_to_string(false), "false");
    }
}
