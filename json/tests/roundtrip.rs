//! Property tests: parse(serialize(v)) is structurally equal to v for any
//! value tree without NaN/Infinity doubles.

use meridian_json::{parse, Value};
use proptest::prelude::*;

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::UInt),
        // finite doubles only; NaN/Infinity have no JSON rendering
        prop::num::f64::NORMAL.prop_map(Value::Double),
        "[a-zA-Z0-9 _\\-\\\\\"\\n\\t]{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,8}", inner), 0..6).prop_map(|pairs| {
                let mut obj = Value::object();
                for (k, v) in pairs {
                    obj.set(k, v);
                }
                obj
            }),
        ]
    })
}

proptest! {
    #[test]
    fn serialize_parse_roundtrip(v in arb_value()) {
        let text = v.to_string();
        let back = parse(&text).expect("serializer output must parse");
        prop_assert_eq!(back, v);
    }

    #[test]
    fn parser_never_panics_on_arbitrary_input(s in "\\PC{0,256}") {
        let _ = parse(&s);
    }
}
