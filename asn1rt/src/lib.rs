//! asn1rt - Rust ASN.1 runtime with BER encoding
//!
//! Generated ASN.1 types convert to and from the closed [`AsnValue`] model;
//! this runtime turns those values into BER octets and back, and dumps raw
//! BER as an indented TLV tree for inspection.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `asn1rt-core`: error type, zero-copy byte windows, tag class/form, value model
//! - `asn1rt-ber`: BER writer, encoders, REAL codec, decoder, TLV walker and dump
//!
//! # Usage
//!
//! ```
//! use asn1rt::{AsnValue, BerDecoder};
//!
//! let value = AsnValue::SequenceOf(vec![AsnValue::Boolean(true), AsnValue::integer(5256)]);
//! let bytes = asn1rt::encode_value(&value);
//! assert_eq!(bytes, vec![0x30, 0x07, 0x01, 0x01, 0xff, 0x02, 0x02, 0x14, 0x88]);
//!
//! assert_eq!(BerDecoder::new(&bytes).decode_value()?, value);
//! println!("{}", asn1rt::dump(&bytes));
//! # Ok::<(), asn1rt::Asn1Error>(())
//! ```

// Re-export core types
pub use asn1rt_core::datatypes::*;
pub use asn1rt_core::{Asn1Error, Asn1Result, ByteWindow, ByteWindowMut, TlvField};

// Re-export BER API
pub use asn1rt_ber::ber::{decoder, encoder, real, tlv};
pub use asn1rt_ber::{
    dump, dump_with, walk, walk_window, BerDecoder, BerEncoder, BerLength, BerTag, BerWriter,
    DiagnosticSink, IndentScope, IndentWriter, TlvNode, TlvTree, WalkerConfig,
};

/// Encode a value of the value model to BER octets
pub fn encode_value(value: &AsnValue) -> Vec<u8> {
    asn1rt_ber::ber::encoder::encode_value(value).into_bytes().to_vec()
}

/// Encode any model type to BER octets
pub fn encode<T: ToAsnValue>(value: &T) -> Vec<u8> {
    encode_value(&value.to_asn_value())
}

/// Decode exactly one TLV from `bytes` into a model type
///
/// # Errors
/// Fails on malformed input, on a value of the wrong shape, or when octets
/// remain after the first TLV.
pub fn decode<T: FromAsnValue>(bytes: &[u8]) -> Asn1Result<T> {
    let mut decoder = BerDecoder::new(bytes);
    let value = decoder.decode()?;
    if decoder.has_remaining() {
        return Err(Asn1Error::malformed(
            decoder.position(),
            format!("{} trailing octets after value", decoder.remaining()),
        ));
    }
    Ok(value)
}
