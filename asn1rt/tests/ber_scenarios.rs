//! End-to-end BER scenarios through the public API

use asn1rt::{
    decode, dump, encode, walk, AsnClass, AsnValue, Asn1Error, Asn1Result, BerDecoder,
    BerEncoder, BerWriter, FromAsnValue, TlvNode, ToAsnValue,
};
use num_bigint_dig::BigInt;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BookCover {
    HardCover,
    PaperBack,
}

impl ToAsnValue for BookCover {
    fn to_asn_value(&self) -> AsnValue {
        match self {
            BookCover::HardCover => AsnValue::integer(0),
            BookCover::PaperBack => AsnValue::integer(1),
        }
    }
}

impl FromAsnValue for BookCover {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        match i64::from_asn_value(value)? {
            0 => Ok(BookCover::HardCover),
            1 => Ok(BookCover::PaperBack),
            other => Err(Asn1Error::UnexpectedValue(format!("book cover {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Book {
    pages: i64,
    cover: BookCover,
    price: f64,
    in_print: bool,
}

impl ToAsnValue for Book {
    fn to_asn_value(&self) -> AsnValue {
        AsnValue::SequenceOf(vec![
            self.pages.to_asn_value(),
            self.cover.to_asn_value(),
            self.price.to_asn_value(),
            self.in_print.to_asn_value(),
        ])
    }
}

impl FromAsnValue for Book {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        match value {
            AsnValue::SequenceOf(fields) if fields.len() == 4 => Ok(Book {
                pages: i64::from_asn_value(&fields[0])?,
                cover: BookCover::from_asn_value(&fields[1])?,
                price: f64::from_asn_value(&fields[2])?,
                in_print: bool::from_asn_value(&fields[3])?,
            }),
            other => Err(Asn1Error::UnexpectedValue(format!(
                "expected Book, found {}",
                other.kind()
            ))),
        }
    }
}

/// CHOICE { book [1] Book, nothing [2] NULL }
#[derive(Debug, Clone, PartialEq)]
enum Item {
    Book(Book),
    Nothing,
}

impl ToAsnValue for Item {
    fn to_asn_value(&self) -> AsnValue {
        match self {
            Item::Book(book) => AsnValue::choice(1, book.to_asn_value()),
            Item::Nothing => AsnValue::choice(2, AsnValue::Null),
        }
    }
}

impl FromAsnValue for Item {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        match value {
            AsnValue::Choice {
                class: AsnClass::ContextSpecific,
                number: 1,
                value,
            } => Ok(Item::Book(Book::from_asn_value(value)?)),
            AsnValue::Choice {
                class: AsnClass::ContextSpecific,
                number: 2,
                value,
            } => {
                <()>::from_asn_value(value)?;
                Ok(Item::Nothing)
            }
            other => Err(Asn1Error::UnexpectedValue(format!(
                "expected Item, found {}",
                other.kind()
            ))),
        }
    }
}

fn sample_books() -> Vec<Item> {
    vec![
        Item::Book(Book {
            pages: 320,
            cover: BookCover::PaperBack,
            price: 12.5,
            in_print: true,
        }),
        Item::Nothing,
        Item::Book(Book {
            pages: 1,
            cover: BookCover::HardCover,
            price: 0.0,
            in_print: false,
        }),
    ]
}

#[test]
fn test_scalar_stream_vector() {
    let mut encoder = BerEncoder::new();
    encoder
        .encode_boolean(false)
        .encode_boolean(true)
        .encode_null()
        .encode_integer(5256);
    let bytes = encoder.into_bytes();

    assert_eq!(bytes.len(), 12);
    assert_eq!(&bytes[..5], &[0x01, 0x01, 0x00, 0x01, 0x01]);
    assert_ne!(bytes[5], 0x00);
    assert_eq!(&bytes[6..], &[0x05, 0x00, 0x02, 0x02, 0x14, 0x88]);

    let mut decoder = BerDecoder::new(&bytes);
    assert!(!decoder.decode_boolean().unwrap());
    assert!(decoder.decode_boolean().unwrap());
    decoder.decode_null().unwrap();
    assert_eq!(decoder.decode_integer().unwrap(), 5256);
    assert!(!decoder.has_remaining());
}

#[test]
fn test_model_types_round_trip() {
    let items = sample_books();
    let bytes = encode(&items);
    let decoded: Vec<Item> = decode(&bytes).unwrap();
    assert_eq!(decoded, items);
}

#[test]
fn test_model_dump() {
    let bytes = encode(&Item::Nothing);
    assert_eq!(
        dump(&bytes),
        "a2 02 [CONTEXT CONSTRUCTED 2] {\n  05 00 [UNIVERSAL PRIMITIVE 5]\n}\n"
    );
}

#[test]
fn test_decode_rejects_trailing_octets() {
    let mut bytes = encode(&true);
    bytes.push(0x00);
    let err = decode::<bool>(&bytes).unwrap_err();
    assert!(matches!(err, Asn1Error::Malformed { offset: 3, .. }));
}

#[test]
fn test_decode_rejects_wrong_shape() {
    let bytes = encode(&AsnValue::choice(9, AsnValue::Null));
    assert!(matches!(
        decode::<Item>(&bytes),
        Err(Asn1Error::UnexpectedValue(_))
    ));
}

#[test]
fn test_big_integer_through_value_model() {
    let big = BigInt::from(u64::MAX) * BigInt::from(1000);
    let bytes = encode(&big);
    let back: BigInt = decode(&bytes).unwrap();
    assert_eq!(back, big);
    assert!(decode::<i64>(&bytes).is_err());
}

/// Re-encode a walked node from its parsed tag, length and content
fn reencode(node: &TlvNode<'_>) -> BerWriter {
    let content = if node.tag().is_constructed() {
        node.children().iter().map(reencode).collect()
    } else {
        BerWriter::octets(node.content().as_slice().to_vec())
    };
    node.tag().encode().then(node.length().encode()).then(content)
}

#[test]
fn test_walk_reencodes_to_same_octets() {
    let bytes = encode(&sample_books());
    let tree = walk(&bytes);
    assert!(tree.is_complete());
    let again: BerWriter = tree.nodes().iter().map(reencode).collect();
    assert_eq!(again.into_bytes().to_vec(), bytes);
}

#[test]
fn test_dump_of_truncated_stream_keeps_prefix() {
    let bytes = encode(&sample_books());
    let cut = &bytes[..bytes.len() - 3];
    let out = dump(cut);
    assert!(out.starts_with("30 "));
    assert!(out.contains("[CONTEXT CONSTRUCTED 1] {"));
    assert!(out.contains("<parse error: "));
}

fn leaf_value() -> impl Strategy<Value = AsnValue> {
    prop_oneof![
        any::<bool>().prop_map(AsnValue::Boolean),
        Just(AsnValue::Null),
        any::<i64>().prop_map(|i| AsnValue::integer(i)),
        any::<f64>()
            .prop_filter("NaN never compares equal", |r| !r.is_nan())
            .prop_map(AsnValue::Real),
    ]
}

fn any_value() -> impl Strategy<Value = AsnValue> {
    leaf_value().prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(AsnValue::SequenceOf),
            (0u64..200, inner).prop_map(|(number, value)| AsnValue::choice(number, value)),
        ]
    })
}

proptest! {
    #[test]
    fn prop_value_round_trip(value in any_value()) {
        let bytes = asn1rt::encode_value(&value);
        let tree = walk(&bytes);
        prop_assert!(tree.is_complete());
        prop_assert_eq!(tree.nodes().len(), 1);
        prop_assert_eq!(tree.nodes()[0].encoded_len(), bytes.len());

        let decoded = BerDecoder::new(&bytes).decode_value().unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn prop_walk_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let tree = walk(&bytes);
        let out = dump(&bytes);
        if tree.is_complete() {
            prop_assert!(!out.contains("<parse error"));
        } else {
            prop_assert!(out.contains("<parse error"));
        }
    }
}
