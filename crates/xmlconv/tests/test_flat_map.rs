use xmlconv::{ParseError, ParserConfig, XmlContext, flat, parse_document};

#[test]
fn test_last_write_wins_and_first_position_kept() -> Result<(), ParseError> {
    let ctx = XmlContext::new();
    let map = ctx.decode_flat("<root><a>1</a><b>2</b><a>3</a></root>")?;

    assert_eq!(map.len(), 2);
    assert_eq!(map.get_index(0), Some((&"a".to_string(), &"3".to_string())));
    assert_eq!(map.get_index(1), Some((&"b".to_string(), &"2".to_string())));

    Ok(())
}

#[test]
fn test_empty_root_yields_empty_map() -> Result<(), ParseError> {
    let ctx = XmlContext::new();
    assert!(ctx.decode_flat("<root/>")?.is_empty());
    assert!(ctx.decode_flat("<root>  only text  </root>")?.is_empty());
    assert!(ctx.decode_flat("")?.is_empty());

    Ok(())
}

#[test]
fn test_malformed_input_fails() {
    let ctx = XmlContext::new();
    let err = ctx.decode_flat("<root><a>1</a>").unwrap_err();
    assert!(!matches!(err, ParseError::Rejected(_)));

    assert!(ctx.decode_flat("<root><a>1</b></root>").is_err());
}

#[test]
fn test_typical_payload() -> Result<(), ParseError> {
    let xml = r#"<xml>
  <return_code><![CDATA[SUCCESS]]></return_code>
  <return_msg><![CDATA[OK]]></return_msg>
  <appid>wx2421b1c4370ec43b</appid>
  <total_fee>101</total_fee>
</xml>"#;

    let map = flat::decode_flat(xml, &ParserConfig::default())?;
    assert_eq!(
        map.keys().map(String::as_str).collect::<Vec<_>>(),
        ["return_code", "return_msg", "appid", "total_fee"]
    );
    assert_eq!(map["return_code"], "SUCCESS");
    assert_eq!(map["total_fee"], "101");

    Ok(())
}

#[test]
fn test_flatten_parsed_document() -> Result<(), ParseError> {
    let doc = parse_document("<r><a>x<i>y</i></a><b/></r>", &ParserConfig::default())?;
    let map = flat::flatten(&doc);
    assert_eq!(map["a"], "xy");
    assert_eq!(map["b"], "");

    Ok(())
}

#[test]
fn test_flat_map_serializes_in_document_order() -> Result<(), ParseError> {
    let ctx = XmlContext::new();
    let map = ctx.decode_flat("<xml><z>1</z><a>2</a><m>3</m></xml>")?;

    let json = serde_json::to_string(&map).unwrap();
    assert_eq!(json, r#"{"z":"1","a":"2","m":"3"}"#);

    Ok(())
}
