//! End-to-end flattening across handler families
//!
//! Each test builds a registry the way a caller would and checks the addresses and
//! values that come out, including how errors surface in the lazy sequence.

use std::sync::Arc;

use indexmap::IndexMap;
use objflat::document::{JsonHandler, NumberMode, XmlNode};
use objflat::handlers::IterableHandler;
use objflat::tabular::memory::cell;
use objflat::tabular::DataTable;
use objflat::writer::leaf_to_json;
use objflat::{
    reflect_enum, reflect_record, ArrayHandler, FilterHandler, FlattenConfig, FlattenError,
    Flattener, ListHandler, NdArray, NoHandlerPolicy, StandardHandler,
};
use serde_json::json;

#[derive(Debug)]
struct Line {
    sku: String,
    qty: u32,
    price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Open,
}

#[derive(Debug)]
struct Order {
    id: u32,
    status: Status,
    lines: Vec<Line>,
    totals: IndexMap<String, f64>,
    note: Option<String>,
}

reflect_record!(Line { sku, qty, price });
reflect_record!(Order { id, status, lines, totals, note });
reflect_enum!(Status);

fn sample_order() -> Order {
    let mut totals = IndexMap::new();
    totals.insert("net".to_string(), 3.0);
    totals.insert("tax".to_string(), 0.6);

    Order {
        id: 7,
        status: Status::Open,
        lines: vec![
            Line {
                sku: "A".to_string(),
                qty: 2,
                price: Some(1.5),
            },
            Line {
                sku: "B".to_string(),
                qty: 1,
                price: None,
            },
        ],
        totals,
        note: None,
    }
}

#[test]
fn test_record_graph_addresses() {
    let order = sample_order();
    let flattener = Flattener::standard();
    let entries = flattener.collect("order", &order).unwrap();

    let addresses: Vec<&str> = entries.iter().map(|e| e.address.as_str()).collect();
    assert_eq!(
        addresses,
        vec![
            "order.id",
            "order.status",
            "order.lines[0].sku",
            "order.lines[0].qty",
            "order.lines[0].price",
            "order.lines[1].sku",
            "order.lines[1].qty",
            "order.lines[1].price",
            "order.totals.net",
            "order.totals.tax",
            "order.note",
        ]
    );

    assert_eq!(entries[1].value.downcast_ref::<Status>(), Some(&Status::Open));
    assert_eq!(entries[4].value.downcast_ref::<f64>(), Some(&1.5));
    assert!(entries[7].value.is_null());
    assert_eq!(entries[9].value.downcast_ref::<f64>(), Some(&0.6));
    assert!(entries[10].value.is_null());
}

#[test]
fn test_empty_prefix_omits_leading_separator() {
    let order = sample_order();
    let flattener = Flattener::standard();
    let entries = flattener.collect("", &order).unwrap();
    assert_eq!(entries[0].address, "id");
    assert_eq!(entries[2].address, "lines[0].sku");
}

#[test]
fn test_multidimensional_array_with_lower_bounds() {
    let grid = NdArray::from_rows(vec![vec![1, 2], vec![3, 4]])
        .unwrap()
        .with_lower_bounds(vec![1, -1])
        .unwrap();

    let flattener = Flattener::standard();
    let entries = flattener.collect("grid", &grid).unwrap();
    let actual: Vec<(&str, i32)> = entries
        .iter()
        .map(|e| (e.address.as_str(), *e.value.downcast_ref::<i32>().unwrap()))
        .collect();
    assert_eq!(
        actual,
        vec![
            ("grid[1,-1]", 1),
            ("grid[1,0]", 2),
            ("grid[2,-1]", 3),
            ("grid[2,0]", 4),
        ]
    );
}

#[test]
fn test_jagged_array_with_null_element() {
    let jagged: Vec<Option<Vec<bool>>> = vec![Some(vec![false, false]), None];
    let flattener = Flattener::standard();
    let entries = flattener.collect("j", &jagged).unwrap();

    let actual: Vec<(&str, bool)> = entries
        .iter()
        .map(|e| (e.address.as_str(), e.value.is_null()))
        .collect();
    assert_eq!(
        actual,
        vec![("j[0][0]", false), ("j[0][1]", false), ("j[1]", true)]
    );
    assert_eq!(entries[1].value.downcast_ref::<bool>(), Some(&false));
}

#[test]
fn test_nested_map_values_under_member_name() {
    #[derive(Debug)]
    struct Holder {
        dictionary: IndexMap<String, serde_json::Value>,
    }
    reflect_record!(Holder { dictionary });

    let mut dictionary = IndexMap::new();
    dictionary.insert("key1".to_string(), json!({ "nestedObj": "he" }));
    dictionary.insert("key2".to_string(), json!(3));
    let holder = Holder { dictionary };

    let flattener = FlattenConfig {
        number_mode: NumberMode::I64,
        ..FlattenConfig::default()
    }
    .build()
    .unwrap();
    let entries = flattener.collect("", &holder).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].address, "dictionary.key1.nestedObj");
    assert_eq!(
        entries[0].value.downcast_ref::<String>().map(String::as_str),
        Some("he")
    );
    assert_eq!(entries[1].address, "dictionary.key2");
    assert_eq!(entries[1].value.downcast_ref::<i64>(), Some(&3));
}

#[test]
fn test_flattening_twice_gives_identical_entries() {
    let order = sample_order();
    let flattener = Flattener::standard();

    let run = || -> Vec<(String, serde_json::Value)> {
        flattener
            .collect("order", &order)
            .unwrap()
            .iter()
            .map(|e| (e.address.clone(), leaf_to_json(&e.value)))
            .collect()
    };

    let first = run();
    assert_eq!(first.len(), 11);
    assert_eq!(first, run());
}

#[test]
fn test_no_handler_policies() {
    let values = vec![1, 2];

    let fail = Flattener::new().with_handler(ListHandler);
    let err = fail.collect("v", &values).unwrap_err();
    assert_eq!(
        err,
        FlattenError::Unresolved {
            address: "v[0]".to_string(),
            value: "1".to_string(),
        }
    );

    let ignore = Flattener::new()
        .with_policy(NoHandlerPolicy::Ignore)
        .with_handler(ListHandler);
    assert!(ignore.collect("v", &values).unwrap().is_empty());

    let pass = Flattener::new()
        .with_policy(NoHandlerPolicy::PassThrough)
        .with_handler(ListHandler);
    let entries = pass.collect("v", &values).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].value.downcast_ref::<i32>(), Some(&2));
}

#[test]
fn test_entries_before_an_error_are_still_produced() {
    let flattener = Flattener::new().with_handler(
        JsonHandler::builder()
            .number_mode(NumberMode::I32)
            .build()
            .unwrap(),
    );
    let doc = json!({ "a": 1, "b": 1.5, "c": 3 });

    let results: Vec<_> = flattener.flatten("doc".to_string(), &doc).collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().address, "doc.a");
    assert_eq!(
        results[1].as_ref().unwrap_err(),
        &FlattenError::interpretation("doc.b", NumberMode::I32)
    );
}

#[test]
fn test_sequence_is_lazy() {
    let values: Vec<u64> = (0..100_000).collect();
    let flattener = Flattener::standard();

    let first: Vec<_> = flattener
        .flatten("n".to_string(), &values)
        .take(3)
        .map(|e| e.unwrap().address)
        .collect();
    assert_eq!(first, vec!["n[0]", "n[1]", "n[2]"]);
}

#[test]
fn test_mixed_document_kinds_in_one_record() {
    #[derive(Debug)]
    struct Envelope {
        payload: serde_json::Value,
        manifest: XmlNode,
        rows: DataTable,
    }
    reflect_record!(Envelope { payload, manifest, rows });

    let mut rows = DataTable::new("rows", &["k"]);
    rows.push_row(vec![cell("x".to_string())]).unwrap();

    let envelope = Envelope {
        payload: json!({ "ok": true, "ids": [4, 5] }),
        manifest: XmlNode::document(
            XmlNode::element("manifest").child(XmlNode::element("item").with_text("box")),
        ),
        rows,
    };

    let flattener = FlattenConfig::default().build().unwrap();
    let entries = flattener.collect("env", &envelope).unwrap();
    let addresses: Vec<&str> = entries.iter().map(|e| e.address.as_str()).collect();
    assert_eq!(
        addresses,
        vec![
            "env.payload.ok",
            "env.payload.ids[0]",
            "env.payload.ids[1]",
            "env.manifest.manifest.item",
            "env.rows[0][k]",
        ]
    );
    assert_eq!(
        entries[3].value.downcast_ref::<String>().map(String::as_str),
        Some("box")
    );
}

#[test]
fn test_filter_keeps_strings_out_of_the_iterable_handler() {
    let words = vec!["ab".to_string(), "c".to_string()];

    let flattener = Flattener::new()
        .with_handler(FilterHandler::new(IterableHandler, |_, value| {
            !value.is::<String>()
        }))
        .with_handler(StandardHandler::default());
    let entries = flattener.collect("w", &words).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].address, "w[0]");
}

#[test]
fn test_engine_is_shared_between_threads() {
    let flattener = Arc::new(
        Flattener::new()
            .with_handler(JsonHandler::new())
            .with_handler(ArrayHandler)
            .with_handler(StandardHandler::default()),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let flattener = Arc::clone(&flattener);
            std::thread::spawn(move || {
                let doc = json!({ "n": i, "list": [i, i] });
                flattener.collect("d", &doc).map(|entries| entries.len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(3));
    }
}
