use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use xmlconv::XmlContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "xml")]
struct Generated {
    #[serde(rename = "@id")]
    id: u32,
    title: String,
    count: i64,
    #[serde(default)]
    flags: Vec<bool>,
    memo: Option<String>,
}

proptest! {
    #[test]
    fn prop_encode_decode_roundtrip(
        id in any::<u32>(),
        title in "[a-zA-Z0-9 ,.;:!?_-]{0,32}",
        count in any::<i64>(),
        flags in prop::collection::vec(any::<bool>(), 0..5),
        memo in prop::option::of("[a-z ]{0,12}"),
    ) {
        let record = Generated { id, title, count, flags, memo };
        let mut ctx = XmlContext::new();

        let xml = ctx.encode(&record).unwrap();
        let decoded: Generated = ctx.decode_str(&xml).unwrap();
        prop_assert_eq!(decoded, record);
    }
}
