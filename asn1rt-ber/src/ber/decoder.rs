//! BER decoder for ASN.1 values
//!
//! Reads consecutive TLVs from a byte window and converts them to Rust
//! values or to the [`AsnValue`] model. Unlike the TLV walker, the decoder
//! is strict: the first fault anywhere inside a TLV is returned as the error.
//!
//! # Usage Example
//!
//! ```
//! use asn1rt_ber::BerDecoder;
//!
//! let data = [0x01, 0x01, 0xff, 0x02, 0x02, 0x14, 0x88];
//! let mut decoder = BerDecoder::new(&data);
//! assert!(decoder.decode_boolean()?);
//! assert_eq!(decoder.decode_integer()?, 5256);
//! assert!(!decoder.has_remaining());
//! # Ok::<(), asn1rt_core::Asn1Error>(())
//! ```

use crate::ber::encoder::trim_twos_complement;
use crate::ber::real::decode_real_content;
use crate::ber::tlv::{self, TlvNode, WalkerConfig};
use crate::ber::types::BerTag;
use crate::error::{Asn1Error, Asn1Result};
use asn1rt_core::{AsnClass, AsnValue, ByteWindow, FromAsnValue};
use num_bigint_dig::{BigInt, Sign};

/// Sequential BER decoder
///
/// The decoder keeps a position that advances past every TLV it reads, so
/// consecutive values can be decoded from one buffer. Nested content is
/// bounded by [`WalkerConfig::max_depth`].
#[derive(Debug, Clone)]
pub struct BerDecoder<'a> {
    window: ByteWindow<'a>,
    position: usize,
    config: WalkerConfig,
}

impl<'a> BerDecoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::from_window(ByteWindow::new(buffer))
    }

    pub fn from_window(window: ByteWindow<'a>) -> Self {
        Self::with_config(window, WalkerConfig::default())
    }

    pub fn with_config(window: ByteWindow<'a>, config: WalkerConfig) -> Self {
        Self {
            window,
            position: 0,
            config,
        }
    }

    /// Position relative to the start of the window
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.window.len().saturating_sub(self.position)
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// Read the next complete TLV, children included
    ///
    /// The position only advances when the whole TLV decoded cleanly.
    pub fn read_node(&mut self) -> Asn1Result<TlvNode<'a>> {
        let rest = self.window.from(self.position)?;
        let mut node = tlv::read_node(rest, 0, &self.config)?;
        if let Some(fault) = node.take_fault() {
            return Err(fault);
        }
        self.position += node.encoded_len();
        Ok(node)
    }

    /// Decode a TLV triplet
    ///
    /// Returns `(tag, content, total_octets_consumed)`. For the indefinite
    /// form the content excludes the end-of-contents marker and the count
    /// includes it.
    pub fn decode_tlv(&mut self) -> Asn1Result<(BerTag, ByteWindow<'a>, usize)> {
        let node = self.read_node()?;
        Ok((node.tag(), node.content(), node.encoded_len()))
    }

    /// Decode the next TLV, which must carry `expected`
    pub fn decode_expected(&mut self, expected: BerTag) -> Asn1Result<ByteWindow<'a>> {
        let start = self.position;
        let (tag, content, _) = self.decode_tlv()?;
        if tag != expected {
            self.position = start;
            return Err(unexpected_tag(&expected.to_string(), tag));
        }
        Ok(content)
    }

    pub fn decode_boolean(&mut self) -> Asn1Result<bool> {
        let content = self.decode_expected(BerTag::BOOLEAN)?;
        decode_boolean_content(&content)
    }

    pub fn decode_null(&mut self) -> Asn1Result<()> {
        let content = self.decode_expected(BerTag::NULL)?;
        decode_null_content(&content)
    }

    /// Decode an INTEGER that fits in `i64`
    pub fn decode_integer(&mut self) -> Asn1Result<i64> {
        let content = self.decode_expected(BerTag::INTEGER)?;
        decode_integer_content(&content)
    }

    pub fn decode_big_integer(&mut self) -> Asn1Result<BigInt> {
        let content = self.decode_expected(BerTag::INTEGER)?;
        decode_big_integer_content(&content)
    }

    pub fn decode_real(&mut self) -> Asn1Result<f64> {
        let content = self.decode_expected(BerTag::REAL)?;
        decode_real_content(&content)
    }

    /// Decode the next TLV into the value model
    pub fn decode_value(&mut self) -> Asn1Result<AsnValue> {
        let node = self.read_node()?;
        value_from_node(&node)
    }

    /// Decode the next TLV and convert it to a model type
    pub fn decode<T: FromAsnValue>(&mut self) -> Asn1Result<T> {
        let value = self.decode_value()?;
        T::from_asn_value(&value)
    }
}

fn unexpected_tag(expected: &str, found: BerTag) -> Asn1Error {
    Asn1Error::UnexpectedTag {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// BOOLEAN content: one octet, zero is false and anything else is true
pub fn decode_boolean_content(content: &ByteWindow<'_>) -> Asn1Result<bool> {
    match content.as_slice() {
        [octet] => Ok(*octet != 0),
        other => Err(Asn1Error::malformed(
            content.offset(),
            format!("BOOLEAN content must be 1 octet, got {}", other.len()),
        )),
    }
}

pub fn decode_null_content(content: &ByteWindow<'_>) -> Asn1Result<()> {
    if !content.is_empty() {
        return Err(Asn1Error::malformed(
            content.offset(),
            format!("NULL content must be empty, got {} octets", content.len()),
        ));
    }
    Ok(())
}

/// Two's complement big-endian content to `i64`
pub fn decode_integer_content(content: &ByteWindow<'_>) -> Asn1Result<i64> {
    let bytes = content.as_slice();
    if bytes.is_empty() {
        return Err(Asn1Error::malformed(content.offset(), "empty INTEGER content"));
    }
    // Padding such as `00 00 05` is valid BER and must not count toward the width
    let bytes = trim_twos_complement(bytes);
    if bytes.len() > 8 {
        return Err(Asn1Error::malformed(
            content.offset(),
            format!("INTEGER of {} octets does not fit in 64 bits", bytes.len()),
        ));
    }

    // Sign extend from the first octet
    let init: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(bytes
        .iter()
        .fold(init, |acc, &byte| (acc << 8) | i64::from(byte)))
}

pub fn decode_big_integer_content(content: &ByteWindow<'_>) -> Asn1Result<BigInt> {
    let bytes = content.as_slice();
    if bytes.is_empty() {
        return Err(Asn1Error::malformed(content.offset(), "empty INTEGER content"));
    }

    if bytes[0] & 0x80 == 0 {
        return Ok(BigInt::from_bytes_be(Sign::Plus, bytes));
    }

    // -x = !x + 1, so the magnitude of a negative value is !bytes + 1
    let inverted: Vec<u8> = bytes.iter().map(|b| !b).collect();
    let magnitude = BigInt::from_bytes_be(Sign::Plus, &inverted) + BigInt::from(1);
    Ok(-magnitude)
}

/// Convert a decoded TLV into the value model
///
/// Universal SEQUENCE becomes [`AsnValue::SequenceOf`]; any other
/// constructed TLV with exactly one child is read as an explicitly tagged
/// CHOICE alternative.
pub fn value_from_node(node: &TlvNode<'_>) -> Asn1Result<AsnValue> {
    let tag = node.tag();
    let content = node.content();

    if !tag.is_constructed() {
        return match (tag.class(), tag.number()) {
            (AsnClass::Universal, 1) => decode_boolean_content(&content).map(AsnValue::Boolean),
            (AsnClass::Universal, 2) => decode_big_integer_content(&content).map(AsnValue::Integer),
            (AsnClass::Universal, 5) => decode_null_content(&content).map(|_| AsnValue::Null),
            (AsnClass::Universal, 9) => decode_real_content(&content).map(AsnValue::Real),
            _ => Err(unexpected_tag("BOOLEAN, INTEGER, NULL or REAL", tag)),
        };
    }

    if tag == BerTag::SEQUENCE {
        let items = node
            .children()
            .iter()
            .map(value_from_node)
            .collect::<Asn1Result<Vec<_>>>()?;
        return Ok(AsnValue::SequenceOf(items));
    }

    match node.children() {
        [inner] => Ok(AsnValue::Choice {
            class: tag.class(),
            number: tag.number(),
            value: Box::new(value_from_node(inner)?),
        }),
        children => Err(Asn1Error::malformed(
            content.offset(),
            format!(
                "tagged alternative {} must wrap exactly one value, found {}",
                tag,
                children.len()
            ),
        )),
    }
}
