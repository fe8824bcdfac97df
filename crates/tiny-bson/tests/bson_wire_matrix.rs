use chrono::{TimeZone, Utc};
use tiny_bson::wire::WireWriter;
use tiny_bson::{
    bson_object, BsonValue, Codec, CodecOptions, DecodeError, DecodePolicy, DiagnosticKind,
    Document, TypeRegistry,
};

fn doc(fields: &[(&str, BsonValue)]) -> Document {
    fields
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[derive(Debug, Default, PartialEq)]
struct Person {
    name: String,
    age: i32,
}

bson_object!(Person { name, age });

#[derive(Debug, Default, PartialEq)]
struct Blob {
    data: Vec<u8>,
}

bson_object!(Blob { data });

#[derive(Debug, Default, PartialEq)]
struct Series {
    points: Vec<i32>,
}

bson_object!(Series { points });

#[test]
fn wire_document_round_trip_matrix() {
    let registry = TypeRegistry::new();
    let codec = Codec::new(&registry);
    let when = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();

    let docs = vec![
        doc(&[]),
        doc(&[("null", BsonValue::Null)]),
        doc(&[
            ("bool", BsonValue::Boolean(true)),
            ("no", BsonValue::Boolean(false)),
        ]),
        doc(&[
            ("i32", BsonValue::Int32(-123)),
            ("i64", BsonValue::Int64(12_321_321_123)),
            ("f64", BsonValue::Double(123.456)),
        ]),
        doc(&[
            ("str", BsonValue::Str("hello".into())),
            ("unicode", BsonValue::Str("grüße 👍".into())),
            ("empty", BsonValue::Str(String::new())),
        ]),
        doc(&[(
            "arr",
            BsonValue::Array(vec![
                BsonValue::Int32(1),
                BsonValue::Null,
                BsonValue::Str("x".into()),
            ]),
        )]),
        doc(&[(
            "obj",
            BsonValue::Document(doc(&[
                ("foo", BsonValue::Str("bar".into())),
                (
                    "nested",
                    BsonValue::Document(doc(&[("deep", BsonValue::Int32(1))])),
                ),
            ])),
        )]),
        doc(&[
            ("bin", BsonValue::Binary(vec![1, 2, 3])),
            ("nobin", BsonValue::Binary(vec![])),
        ]),
        doc(&[("when", BsonValue::DateTime(when))]),
    ];

    for original in docs {
        let bytes = WireWriter::new().encode(&original).unwrap();
        let decoded = codec.decode_document(&bytes).unwrap();
        assert!(decoded.is_clean(), "{original:?}");
        assert_eq!(decoded.value, original);
    }
}

#[test]
fn scenario_person_round_trip() {
    let alice = Person {
        name: "Alice".into(),
        age: 30,
    };
    let bytes = tiny_bson::encode(&alice).unwrap();
    let decoded = tiny_bson::decode::<Person>(&bytes).unwrap();
    assert_eq!(decoded.value.name, "Alice");
    assert_eq!(decoded.value.age, 30);
}

#[test]
fn scenario_int32_payload() {
    let bytes = WireWriter::new()
        .encode(&doc(&[("n", BsonValue::Int32(123))]))
        .unwrap();
    assert_eq!(bytes[4], 0x10);
    assert_eq!(&bytes[5..7], b"n\0");
    assert_eq!(&bytes[7..11], &[0x7b, 0x00, 0x00, 0x00]);
}

#[test]
fn scenario_string_payload() {
    let bytes = WireWriter::new()
        .encode(&doc(&[("s", BsonValue::Str("hi".into()))]))
        .unwrap();
    assert_eq!(bytes[4], 0x02);
    assert_eq!(read_i32(&bytes, 7), 3);
    assert_eq!(&bytes[11..14], &[0x68, 0x69, 0x00]);
}

#[test]
fn scenario_int_array() {
    let bytes = WireWriter::new()
        .encode(&doc(&[(
            "a",
            BsonValue::Array(vec![1.into(), 2.into(), 3.into()]),
        )]))
        .unwrap();
    assert_eq!(bytes[4], 0x04);
    let inner = &bytes[7..];
    let inner_len = read_i32(inner, 0) as usize;
    assert_eq!(inner_len, 3 * 7 + 1);
    assert_eq!(&inner[4..7], &[0x10, b'0', 0]);
    assert_eq!(&inner[11..14], &[0x10, b'1', 0]);
    assert_eq!(&inner[18..21], &[0x10, b'2', 0]);
    assert_eq!(inner[4 + inner_len - 1], 0);
}

#[test]
fn scenario_duplicate_key() {
    let bytes = [
        15, 0, 0, 0, //
        0x10, b'x', 0, 1, 0, 0, 0, //
        0x10, b'x', 0, 2, 0, 0, 0, //
        0,
    ];
    let registry = TypeRegistry::new();
    let decoded = Codec::new(&registry).decode_document(&bytes).unwrap();
    assert_eq!(decoded.value, doc(&[("x", BsonValue::Int32(2))]));
    assert_eq!(
        decoded.diagnostics[0].kind,
        DiagnosticKind::DuplicateKey { key: "x".into() }
    );
}

#[test]
fn length_field_counts_payload_plus_terminator() {
    let nested = doc(&[
        ("a", BsonValue::Str("xyz".into())),
        ("b", BsonValue::Document(doc(&[("c", BsonValue::Int64(1))]))),
    ]);
    let bytes = WireWriter::new().encode(&nested).unwrap();
    assert_eq!(read_i32(&bytes, 0) as usize, bytes.len() - 4);
    assert_eq!(*bytes.last().unwrap(), 0);

    // b's frame starts after: tag(1) + "a\0"(2) + len(4) + "xyz\0"(4) + tag(1) + "b\0"(2)
    let b_at = 4 + 1 + 2 + 4 + 4 + 1 + 2;
    let b_len = read_i32(&bytes, b_at) as usize;
    assert_eq!(b_len, 1 + 2 + 8 + 1);
}

#[test]
fn unknown_tags_fail_the_whole_document() {
    let registry = TypeRegistry::new();
    let codec = Codec::new(&registry);
    for tag in [0x00u8, 0x06, 0x07, 0x0b, 0x11, 0x13, 0x7f, 0xff] {
        let bytes = [
            12, 0, 0, 0, //
            0x10, b'a', 0, 1, 0, 0, 0, //
            tag, b'b', 0, //
            0,
        ];
        let bytes = {
            let mut bytes = bytes.to_vec();
            bytes[0] = (bytes.len() - 4) as u8;
            bytes
        };
        let err = codec.decode_document(&bytes).unwrap_err();
        if tag == 0 {
            assert!(err.is_format_violation(), "{err}");
        } else {
            assert_eq!(err, DecodeError::UnknownTag { tag, offset: 11 });
        }
        assert!(codec.decode::<Person>(&bytes).is_err());
    }
}

#[test]
fn strict_policy_rejects_duplicates_and_trailing_bytes() {
    let registry = TypeRegistry::new();
    let strict = Codec::with_options(
        &registry,
        CodecOptions {
            policy: DecodePolicy::Strict,
            ..CodecOptions::default()
        },
    );
    let duplicate = [
        15, 0, 0, 0, //
        0x10, b'x', 0, 1, 0, 0, 0, //
        0x10, b'x', 0, 2, 0, 0, 0, //
        0,
    ];
    assert!(matches!(
        strict.decode_document(&duplicate),
        Err(DecodeError::Rejected(_))
    ));
    assert!(matches!(
        strict.decode_document(&[1, 0, 0, 0, 0, 9]),
        Err(DecodeError::Rejected(_))
    ));
}

#[test]
fn depth_limit_from_options() {
    let mut value = BsonValue::Document(Document::new());
    for _ in 0..10 {
        value = BsonValue::Document(doc(&[("d", value)]));
    }
    let BsonValue::Document(deep) = value else {
        unreachable!()
    };
    let bytes = WireWriter::new().encode(&deep).unwrap();
    let registry = TypeRegistry::new();

    let shallow = Codec::with_options(
        &registry,
        CodecOptions {
            max_depth: 5,
            ..CodecOptions::default()
        },
    );
    assert_eq!(
        shallow.decode_document(&bytes).unwrap_err(),
        DecodeError::DepthLimit(5)
    );
    assert!(Codec::new(&registry).decode_document(&bytes).is_ok());
}

#[test]
fn writer_rejects_unencodable_names_and_strings() {
    assert!(WireWriter::new()
        .encode(&doc(&[("", BsonValue::Null)]))
        .is_err());
    assert!(WireWriter::new()
        .encode(&doc(&[("s", BsonValue::Str("a\0".into()))]))
        .is_err());
}

#[test]
fn byte_vectors_take_the_binary_tag() {
    let blob = Blob {
        data: vec![1, 2, 3],
    };
    let bytes = tiny_bson::encode(&blob).unwrap();
    // length(4) + tag(1) + "data\0"(5) + len(4) + subtype(1) + 3 bytes + terminator(1)
    assert_eq!(bytes.len(), 19);
    assert_eq!(bytes[4], 0x05);
    assert_eq!(read_i32(&bytes, 10), 3);
    assert_eq!(bytes[14], 0);
    assert_eq!(&bytes[15..18], &[1, 2, 3]);

    let decoded = tiny_bson::decode::<Blob>(&bytes).unwrap();
    assert!(decoded.is_clean());
    assert_eq!(decoded.value, blob);
}

#[test]
fn scenario_host_int_array_field() {
    let bytes = tiny_bson::encode(&Series {
        points: vec![1, 2, 3],
    })
    .unwrap();
    assert_eq!(bytes[4], 0x04);
    assert_eq!(&bytes[5..12], b"points\0");
    let inner = &bytes[12..];
    assert_eq!(read_i32(inner, 0), 22);
    for (index, key) in [b'0', b'1', b'2'].into_iter().enumerate() {
        let at = 4 + index * 7;
        assert_eq!(&inner[at..at + 3], &[0x10, key, 0]);
        assert_eq!(read_i32(inner, at + 3), index as i32 + 1);
    }

    let decoded = tiny_bson::decode::<Series>(&bytes).unwrap();
    assert_eq!(decoded.value.points, [1, 2, 3]);
}
