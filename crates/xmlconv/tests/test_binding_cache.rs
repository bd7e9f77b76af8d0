use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::thread;
use xmlconv::{
    Binding, BindingError, BindingStats, FieldKind, Result, XmlContext, XmlConvError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "xml")]
struct PayNotify {
    #[serde(rename = "@version")]
    version: String,
    transaction_id: String,
    total_fee: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "order")]
struct Order {
    id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
enum Status {
    Open,
    Closed,
}

#[derive(Debug, Serialize, Deserialize)]
struct BadName {
    #[serde(rename = "1st")]
    first: String,
}

fn notify(n: u32) -> PayNotify {
    PayNotify {
        version: "1".to_string(),
        transaction_id: format!("tx-{n}"),
        total_fee: n,
    }
}

#[test]
fn test_bindings_are_built_once_per_context() -> Result<()> {
    let mut ctx = XmlContext::new();
    assert!(ctx.registry().is_empty());

    let first = ctx.encode(&notify(1))?;
    let second = ctx.encode(&notify(2))?;
    assert_eq!(
        ctx.registry().stats(),
        BindingStats {
            writers_built: 1,
            readers_built: 0,
        }
    );

    let _: PayNotify = ctx.decode_str(&first)?;
    let _: PayNotify = ctx.decode_str(&second)?;
    assert_eq!(ctx.registry().stats().readers_built, 1);
    assert_eq!(ctx.registry().len(), 2);

    // A different type gets its own entry
    ctx.encode(&Order { id: 9 })?;
    assert_eq!(ctx.registry().stats().writers_built, 2);
    assert_eq!(ctx.registry().len(), 3);

    Ok(())
}

#[test]
fn test_each_context_builds_its_own_bindings() -> Result<()> {
    let mut a = XmlContext::new();
    let mut b = XmlContext::new();

    a.encode(&notify(1))?;
    a.encode(&notify(2))?;
    b.encode(&notify(3))?;

    assert_eq!(a.registry().stats().writers_built, 1);
    assert_eq!(b.registry().stats().writers_built, 1);

    Ok(())
}

#[test]
fn test_contexts_per_worker_thread() {
    let workers: Vec<_> = (0..4u32)
        .map(|worker| {
            thread::spawn(move || {
                let mut ctx = XmlContext::new();
                for n in 0..10 {
                    let record = notify(worker * 100 + n);
                    let xml = ctx.encode(&record).unwrap();
                    let back: PayNotify = ctx.decode_str(&xml).unwrap();
                    assert_eq!(back, record);
                }
                ctx.registry().stats()
            })
        })
        .collect();

    for worker in workers {
        let stats = worker.join().unwrap();
        assert_eq!(
            stats,
            BindingStats {
                writers_built: 1,
                readers_built: 1,
            }
        );
    }
}

#[test]
fn test_context_moves_to_another_thread() {
    let mut ctx = XmlContext::new();
    ctx.encode(&notify(1)).unwrap();

    let stats = thread::spawn(move || {
        ctx.encode(&notify(2)).unwrap();
        ctx.registry().stats()
    })
    .join()
    .unwrap();

    assert_eq!(stats.writers_built, 1);
}

#[test]
fn test_binding_metadata() -> Result<()> {
    let binding = Binding::of::<PayNotify>()?;
    assert_eq!(binding.root(), "xml");
    assert!(binding.type_name().ends_with("PayNotify"));

    let kinds: Vec<_> = binding.fields().iter().map(|f| (f.xml_name(), f.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("version", FieldKind::Attribute),
            ("transaction_id", FieldKind::Element),
            ("total_fee", FieldKind::Element),
        ]
    );

    Ok(())
}

#[test]
fn test_non_struct_types_cannot_be_bound() {
    let mut ctx = XmlContext::new();

    let err = ctx.encode(&vec![1u8, 2, 3]).unwrap_err();
    assert!(matches!(
        err,
        XmlConvError::Binding(BindingError::UnsupportedShape {
            shape: "a sequence",
            ..
        })
    ));

    let err = ctx.encode(&HashMap::<String, String>::new()).unwrap_err();
    assert!(matches!(
        err,
        XmlConvError::Binding(BindingError::UnsupportedShape { shape: "a map", .. })
    ));

    let err = ctx.decode_str::<Status>("<Status>Open</Status>").unwrap_err();
    assert!(matches!(
        err,
        XmlConvError::Binding(BindingError::UnsupportedShape {
            shape: "an enum",
            ..
        })
    ));

    let err = ctx.decode_str::<String>("<s>x</s>").unwrap_err();
    assert!(matches!(
        err,
        XmlConvError::Binding(BindingError::UnsupportedShape { .. })
    ));

    // Failed builds are not cached
    assert!(ctx.registry().is_empty());
    assert_eq!(ctx.registry().stats(), BindingStats::default());
}

#[test]
fn test_invalid_field_names_cannot_be_bound() {
    let mut ctx = XmlContext::new();
    let err = ctx
        .encode(&BadName {
            first: "x".to_string(),
        })
        .unwrap_err();

    match err {
        XmlConvError::Binding(BindingError::InvalidName { name, .. }) => assert_eq!(name, "1st"),
        other => panic!("unexpected error: {other}"),
    }
}
