//! Property tests for the dynamic value codec

use pattern_core::value::{
    decode, encode, DynamicMap, DynamicValue, INFINITY_SENTINEL, NAN_SENTINEL,
    NEG_INFINITY_SENTINEL,
};
use proptest::prelude::*;

/// Strings that are not reserved as float sentinels
fn plain_string() -> impl Strategy<Value = String> {
    any::<String>().prop_filter("sentinel strings decode as floats", |s| {
        s != INFINITY_SENTINEL && s != NEG_INFINITY_SENTINEL && s != NAN_SENTINEL
    })
}

fn dynamic_value() -> impl Strategy<Value = DynamicValue> {
    let leaf = prop_oneof![
        Just(DynamicValue::Null),
        any::<bool>().prop_map(DynamicValue::Bool),
        any::<i64>().prop_map(DynamicValue::Int),
        any::<f64>().prop_map(DynamicValue::Float),
        Just(DynamicValue::Float(f64::INFINITY)),
        Just(DynamicValue::Float(f64::NEG_INFINITY)),
        Just(DynamicValue::Float(f64::NAN)),
        plain_string().prop_map(DynamicValue::String),
    ];

    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(DynamicValue::Array),
            prop::collection::btree_map(any::<String>(), inner, 0..8)
                .prop_map(|map: DynamicMap| DynamicValue::Object(map)),
        ]
    })
}

proptest! {
    #[test]
    fn roundtrip_preserves_value(value in dynamic_value()) {
        let bytes = encode(&value).unwrap();
        let decoded = decode(&bytes).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn roundtrip_preserves_float_bits(f in any::<f64>()) {
        let decoded = decode(&encode(&DynamicValue::Float(f)).unwrap()).unwrap();
        match decoded {
            DynamicValue::Float(g) if f.is_nan() => prop_assert!(g.is_nan()),
            DynamicValue::Float(g) => prop_assert_eq!(g.to_bits(), f.to_bits()),
            other => prop_assert!(false, "expected float, got {:?}", other),
        }
    }

    #[test]
    fn encoded_output_is_standard_json(value in dynamic_value()) {
        let bytes = encode(&value).unwrap();
        prop_assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_ok());
    }
}

#[test]
fn infinity_survives_transmission() {
    let bytes = encode(&DynamicValue::Float(f64::INFINITY)).unwrap();
    let decoded = decode(&bytes).unwrap();
    let f = decoded.as_f64().unwrap();
    assert!(f.is_infinite() && f > 0.0);
}

#[test]
fn edge_case_values_roundtrip() {
    let cases = vec![
        DynamicValue::String(String::new()),
        DynamicValue::Array(Vec::new()),
        DynamicValue::Object(DynamicMap::new()),
        DynamicValue::Float(-0.0),
        DynamicValue::Float(f64::MIN_POSITIVE),
        DynamicValue::Int(i64::MAX),
        DynamicValue::Int(i64::MIN),
    ];

    for value in cases {
        assert_eq!(decode(&encode(&value).unwrap()).unwrap(), value);
    }
}
