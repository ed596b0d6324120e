//! Binary wire format: round trips, encoding shape, and failure modes.

use tessella::prelude::*;

fn roundtrip(registry: &Registry, value: &Value) -> Value {
    let bytes = to_bytes(registry, value).unwrap();
    from_bytes(registry, &bytes).unwrap()
}

#[test]
fn array_of_ints_roundtrips_with_abstract_type_array() {
    let registry = Registry::new();
    let original = array_of([1i32, 2, 3]);
    let back = roundtrip(&registry, &original);
    assert!(equals(&registry, &original, &back));
    assert!(matches!(
        abstract_type_of(&registry, &back).unwrap(),
        Value::Np(NpTerm::Array)
    ));
}

#[test]
fn singletons_encode_in_two_bytes() {
    let registry = Registry::new();
    for v in [Value::void(), Value::from(true), Value::Np(NpTerm::Type)] {
        let bytes = to_bytes(&registry, &v).unwrap();
        assert_eq!(bytes.len(), 2);
        assert!(equals(&registry, &v, &roundtrip(&registry, &v)));
    }
}

#[test]
fn primitives_roundtrip() {
    let registry = Registry::new();
    let values = [
        Value::from(i8::MIN),
        Value::from(i64::MAX),
        Value::from(u8::MAX),
        Value::from(u64::MAX),
        Value::from(-0.0f32),
        Value::from(f64::INFINITY),
        Value::from(f64::NAN),
        Value::from(""),
        Value::from("héllo wörld"),
    ];
    for v in values {
        assert!(
            equals(&registry, &v, &roundtrip(&registry, &v)),
            "{} did not roundtrip",
            display_lossy(&registry, &v)
        );
    }
}

#[test]
fn pinned_length_is_omitted_from_the_encoding() {
    let registry = Registry::new();
    let element = Value::from(7u8);
    let free = array_of([7u8]);
    let pinned = Value::Array(
        ArrayTerm::with_constraint(
            &registry,
            ArrayConstraint::element_and_length(Value::Np(NpTerm::Uint8), 1),
            vec![element.clone()],
        )
        .unwrap(),
    );
    let free_bytes = to_bytes(&registry, &free).unwrap();
    let pinned_bytes = to_bytes(&registry, &pinned).unwrap();

    // Free: code + 2-byte Array singleton + 8-byte count + one 4-byte
    // element (code + 2-byte Uint8 singleton + payload byte).
    assert_eq!(free_bytes.len(), 1 + 2 + 8 + 4);
    // Pinned: code + ArrayES abstract type (code + 2-byte ArrayType
    // singleton + kind byte + 2-byte element type + 8-byte length) + the
    // element, with no separate count field.
    assert_eq!(pinned_bytes.len(), 1 + (1 + 2 + 1 + 2 + 8) + 4);
    // Both roundtrip to values equal to each other (weak container equality).
    let free_back = from_bytes(&registry, &free_bytes).unwrap();
    let pinned_back = from_bytes(&registry, &pinned_bytes).unwrap();
    assert!(equals(&registry, &free_back, &pinned_back));
    // The pinned array keeps its declared type across the wire.
    assert!(matches!(
        abstract_type_of(&registry, &pinned_back).unwrap(),
        Value::ArrayType(_)
    ));
}

#[test]
fn length_only_constraint_also_omits_the_count() {
    let registry = Registry::new();
    let sized = Value::Array(
        ArrayTerm::with_constraint(
            &registry,
            ArrayConstraint::length_only(2),
            vec![Value::from(1i32), Value::from("two")],
        )
        .unwrap(),
    );
    let bytes = to_bytes(&registry, &sized).unwrap();
    // Code + ArrayS abstract type (code + 2-byte ArrayType singleton + kind
    // byte + 8-byte length) + a 7-byte sint32 element + a 14-byte text
    // element (code + 2-byte singleton + 8-byte length + 3 bytes), with no
    // separate count field.
    assert_eq!(bytes.len(), 1 + (1 + 2 + 1 + 8) + 7 + 14);

    let back = from_bytes(&registry, &bytes).unwrap();
    assert!(equals(&registry, &sized, &back));
    let Value::Array(a) = &back else {
        panic!("expected an array");
    };
    assert!(matches!(
        a.constraint(),
        Some(c) if c.length() == Some(2) && c.element_type().is_none()
    ));
}

#[test]
fn hostile_string_length_is_malformed() {
    let registry = Registry::new();
    // Parametric code, `Utf8String` abstract type, then a length field far
    // beyond the bytes that follow.
    let mut bytes = vec![1, 0, NpTerm::Utf8String.discriminant()];
    bytes.extend_from_slice(&u64::MAX.to_le_bytes());
    let err = from_bytes(&registry, &bytes).unwrap_err();
    assert!(err.is_malformed_stream());

    // Same shape with a plausible-but-unsatisfied length.
    let mut bytes = vec![1, 0, NpTerm::Utf8String.discriminant()];
    bytes.extend_from_slice(&16u64.to_le_bytes());
    bytes.extend_from_slice(b"short");
    let err = from_bytes(&registry, &bytes).unwrap_err();
    assert!(err.is_malformed_stream());
}

#[test]
fn maps_roundtrip_in_canonical_order() {
    let registry = Registry::new();
    let map = Value::Map(MapTerm::from_pairs(
        &registry,
        [
            (Value::from(30i32), Value::from("c")),
            (Value::from(10i32), Value::from("a")),
            (Value::from(20i32), Value::from("b")),
        ],
    ));
    let back = roundtrip(&registry, &map);
    assert!(equals(&registry, &map, &back));
    let Value::Map(m) = &back else {
        panic!("expected a map");
    };
    let keys: Vec<i32> = m
        .iter()
        .map(|(k, _)| match k {
            Value::Sint32(x) => *x,
            other => panic!("unexpected key {other:?}"),
        })
        .collect();
    assert_eq!(keys, vec![10, 20, 30]);
}

#[test]
fn constrained_maps_keep_their_constraint() {
    let registry = Registry::new();
    let map = Value::Map(
        MapTerm::with_constraint(
            &registry,
            MapConstraint::domain_and_codomain(
                Value::Np(NpTerm::Sint32),
                Value::Np(NpTerm::Utf8String),
            ),
            [(Value::from(1i32), Value::from("one"))],
        )
        .unwrap(),
    );
    let back = roundtrip(&registry, &map);
    assert!(equals(&registry, &map, &back));
    assert!(matches!(
        abstract_type_of(&registry, &back).unwrap(),
        Value::MapType(_)
    ));
}

#[test]
fn nested_structures_roundtrip() {
    let registry = Registry::new();
    let nested = tuple_of([
        array_of([1i32, 2]),
        Value::Map(MapTerm::from_pairs(
            &registry,
            [(Value::from("k"), tuple_of([true, false]))],
        )),
        union_of([Value::Np(NpTerm::Sint32), Value::Np(NpTerm::Float64)]),
        Value::ArrayType(ArrayConstraint::element(Value::Np(NpTerm::Bool))),
    ]);
    assert!(equals(&registry, &nested, &roundtrip(&registry, &nested)));
}

#[test]
fn references_serialize_their_referent() {
    let registry = Registry::new();
    let referent = array_of([5i32]);
    let reference = Value::Ref(RefTerm::Mem(MemRef::new(referent.clone())));
    let bytes_direct = to_bytes(&registry, &referent).unwrap();
    let bytes_via_ref = to_bytes(&registry, &reference).unwrap();
    assert_eq!(bytes_direct, bytes_via_ref);
}

#[test]
fn exhausted_stream_decodes_as_end_of_file() {
    let registry = Registry::new();
    let v = from_bytes(&registry, &[]).unwrap();
    assert!(matches!(v, Value::Np(NpTerm::EndOfFile)));
}

#[test]
fn streams_decode_sequentially_until_end_of_file() {
    let registry = Registry::new();
    let mut bytes = Vec::new();
    serialize(&registry, &Value::from(1i32), &mut bytes).unwrap();
    serialize(&registry, &Value::from("two"), &mut bytes).unwrap();

    let mut cursor = std::io::Cursor::new(bytes.as_slice());
    assert!(matches!(
        deserialize(&registry, &mut cursor).unwrap(),
        Value::Sint32(1)
    ));
    assert!(matches!(
        deserialize(&registry, &mut cursor).unwrap(),
        Value::Text(_)
    ));
    assert!(matches!(
        deserialize(&registry, &mut cursor).unwrap(),
        Value::Np(NpTerm::EndOfFile)
    ));
}

#[test]
fn trailing_bytes_are_a_malformed_stream() {
    let registry = Registry::new();
    let mut bytes = to_bytes(&registry, &Value::from(1i32)).unwrap();
    bytes.push(0xff);
    let err = from_bytes(&registry, &bytes).unwrap_err();
    assert!(err.is_malformed_stream());
}

#[test]
fn truncation_inside_a_payload_is_a_malformed_stream() {
    let registry = Registry::new();
    let bytes = to_bytes(&registry, &array_of([1i32, 2, 3])).unwrap();
    // Chop anywhere strictly inside the encoding.
    for cut in 1..bytes.len() {
        let err = from_bytes(&registry, &bytes[..cut]).unwrap_err();
        assert!(
            err.is_malformed_stream(),
            "cut at {cut} gave {err:?} instead of a malformed stream"
        );
    }
}

#[test]
fn unknown_tag_bytes_are_rejected() {
    let registry = Registry::new();
    // Top-level code 0 with an out-of-range singleton tag.
    let err = from_bytes(&registry, &[0, 0xfe]).unwrap_err();
    assert!(err.is_malformed_stream());
    // Unknown top-level code.
    let err = from_bytes(&registry, &[9]).unwrap_err();
    assert!(err.is_malformed_stream());
}

#[test]
fn undersupplied_element_count_is_a_malformed_stream() {
    let registry = Registry::new();
    let mut bytes = to_bytes(&registry, &array_of([1i32, 2])).unwrap();
    // Drop the final element's encoding entirely (1 + 2 + 4 bytes).
    bytes.truncate(bytes.len() - 7);
    let err = from_bytes(&registry, &bytes).unwrap_err();
    assert!(err.is_malformed_stream());
}
