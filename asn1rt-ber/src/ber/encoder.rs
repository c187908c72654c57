//! BER encoder for ASN.1 values
//!
//! Every function here is pure: it returns a [`BerWriter`] and performs no
//! I/O. Draining the writer is a separate, later step, which lets an outer
//! TLV take its length from inner writers that are already built.
//!
//! # Usage Example
//!
//! ```rust
//! use asn1rt_ber::ber::encoder::{self, BerEncoder};
//!
//! let mut encoder = BerEncoder::new();
//! encoder.encode_boolean(false).encode_null().encode_integer(5256);
//! assert_eq!(
//!     &encoder.into_bytes()[..],
//!     &[0x01, 0x01, 0x00, 0x05, 0x00, 0x02, 0x02, 0x14, 0x88]
//! );
//!
//! let tag = encoder::tag(asn1rt_core::AsnClass::Universal, asn1rt_core::AsnForm::Primitive, 31)?;
//! assert_eq!(&tag.into_bytes()[..], &[0x1f, 0x1f]);
//! # Ok::<(), asn1rt_core::Asn1Error>(())
//! ```

use crate::ber::real::encode_real_content;
use crate::ber::types::{BerLength, BerTag};
use crate::ber::writer::BerWriter;
use crate::error::{Asn1Error, Asn1Result};
use asn1rt_core::{AsnClass, AsnForm, AsnValue};
use bytes::Bytes;
use num_bigint_dig::{BigInt, Sign};
use std::fmt;

/// Canonical content octet for TRUE
pub const TRUE_OCTET: u8 = 0xFF;

/// Identifier octets for `(class, form, number)`
///
/// # Errors
/// Returns `InvalidArgument` when `number` is negative or above `u64::MAX`.
/// No writer is built.
pub fn tag<N>(class: AsnClass, form: AsnForm, number: N) -> Asn1Result<BerWriter>
where
    N: TryInto<u64> + fmt::Display + PartialOrd + Default + Copy,
{
    let number = number
        .try_into()
        .map_err(|_| out_of_range("tag number", number, "u64"))?;
    Ok(BerTag::new(class, form, number).encode())
}

/// Definite length octets for a content length of `n`
///
/// # Errors
/// Returns `InvalidArgument` when `n` is negative or does not fit in `usize`.
pub fn length<N>(n: N) -> Asn1Result<BerWriter>
where
    N: TryInto<usize> + fmt::Display + PartialOrd + Default + Copy,
{
    let n = n.try_into().map_err(|_| out_of_range("length", n, "usize"))?;
    Ok(BerLength::new(n).encode())
}

/// Describe why `value` failed to convert to `target`
fn out_of_range<N>(what: &str, value: N, target: &str) -> Asn1Error
where
    N: fmt::Display + PartialOrd + Default,
{
    if value < N::default() {
        Asn1Error::InvalidArgument(format!("{} must be non-negative, got {}", what, value))
    } else {
        Asn1Error::InvalidArgument(format!("{} {} does not fit in {}", what, value, target))
    }
}

/// Drop leading octets that only repeat the sign of the next octet
pub(crate) fn trim_twos_complement(octets: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < octets.len() {
        let (lead, next) = (octets[start], octets[start + 1]);
        let redundant = (lead == 0x00 && next & 0x80 == 0) || (lead == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    &octets[start..]
}

/// Minimal big-endian two's complement octets of `value`
///
/// A leading `0x00` or `0xFF` is kept only when it is needed to carry the
/// sign, e.g. `128 -> 00 80`, `-129 -> FF 7F`, `0 -> 00`.
pub fn integer_octets(value: i64) -> Vec<u8> {
    trim_twos_complement(&value.to_be_bytes()).to_vec()
}

/// Minimal two's complement octets of an arbitrary-precision integer
pub fn big_integer_octets(value: &BigInt) -> Vec<u8> {
    let (sign, mut magnitude) = value.to_bytes_be();
    if magnitude.is_empty() {
        magnitude.push(0);
    }

    let mut octets = Vec::with_capacity(magnitude.len() + 1);
    if sign == Sign::Minus {
        // -m == !m + 1
        octets.push(0xFF);
        octets.extend(magnitude.iter().map(|b| !b));
        for octet in octets.iter_mut().rev() {
            let (sum, carry) = octet.overflowing_add(1);
            *octet = sum;
            if !carry {
                break;
            }
        }
    } else {
        octets.push(0x00);
        octets.extend_from_slice(&magnitude);
    }

    trim_twos_complement(&octets).to_vec()
}

/// Content octets of a BOOLEAN
pub fn encode_boolean_content(value: bool) -> BerWriter {
    BerWriter::octet(if value { TRUE_OCTET } else { 0x00 })
}

/// Content octets of a NULL (there are none)
pub fn encode_null_content() -> BerWriter {
    BerWriter::empty()
}

pub fn encode_integer_content(value: i64) -> BerWriter {
    BerWriter::octets(integer_octets(value))
}

pub fn encode_big_integer_content(value: &BigInt) -> BerWriter {
    BerWriter::octets(big_integer_octets(value))
}

/// Tag, definite length and content
pub fn encode_tlv(tag: &BerTag, content: BerWriter) -> BerWriter {
    BerWriter::concat([
        tag.encode(),
        BerLength::new(content.len()).encode(),
        content,
    ])
}

pub fn encode_boolean(value: bool) -> BerWriter {
    encode_tlv(&BerTag::BOOLEAN, encode_boolean_content(value))
}

pub fn encode_null() -> BerWriter {
    encode_tlv(&BerTag::NULL, encode_null_content())
}

pub fn encode_integer(value: i64) -> BerWriter {
    encode_tlv(&BerTag::INTEGER, encode_integer_content(value))
}

pub fn encode_big_integer(value: &BigInt) -> BerWriter {
    encode_tlv(&BerTag::INTEGER, encode_big_integer_content(value))
}

pub fn encode_real(value: f64) -> BerWriter {
    encode_tlv(&BerTag::REAL, encode_real_content(value))
}

/// SEQUENCE / SEQUENCE OF wrapping already-encoded elements
pub fn encode_sequence(elements: impl IntoIterator<Item = BerWriter>) -> BerWriter {
    encode_tlv(&BerTag::SEQUENCE, BerWriter::concat(elements))
}

/// Explicitly tagged CHOICE alternative `[class number]` around `inner`
pub fn encode_choice(class: AsnClass, number: u64, inner: BerWriter) -> BerWriter {
    encode_tlv(&BerTag::new(class, AsnForm::Constructed, number), inner)
}

/// Encode any value of the value model
pub fn encode_value(value: &AsnValue) -> BerWriter {
    match value {
        AsnValue::Boolean(b) => encode_boolean(*b),
        AsnValue::Null => encode_null(),
        AsnValue::Integer(i) => encode_big_integer(i),
        AsnValue::Real(r) => encode_real(*r),
        AsnValue::SequenceOf(items) => encode_sequence(items.iter().map(encode_value)),
        AsnValue::Choice {
            class,
            number,
            value,
        } => encode_choice(*class, *number, encode_value(value)),
    }
}

/// Accumulating BER encoder
///
/// Collects writers for consecutive values; [`into_writer`](Self::into_writer)
/// joins them into one writer whose length is known before draining.
#[derive(Debug, Clone, Default)]
pub struct BerEncoder {
    parts: Vec<BerWriter>,
}

impl BerEncoder {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Create a new BER encoder with room for `capacity` values
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parts: Vec::with_capacity(capacity),
        }
    }

    /// Append an already-built writer
    pub fn push(&mut self, writer: BerWriter) -> &mut Self {
        self.parts.push(writer);
        self
    }

    pub fn encode_tlv(&mut self, tag: &BerTag, content: BerWriter) -> &mut Self {
        self.push(encode_tlv(tag, content))
    }

    pub fn encode_boolean(&mut self, value: bool) -> &mut Self {
        self.push(encode_boolean(value))
    }

    pub fn encode_null(&mut self) -> &mut Self {
        self.push(encode_null())
    }

    pub fn encode_integer(&mut self, value: i64) -> &mut Self {
        self.push(encode_integer(value))
    }

    pub fn encode_big_integer(&mut self, value: &BigInt) -> &mut Self {
        self.push(encode_big_integer(value))
    }

    pub fn encode_real(&mut self, value: f64) -> &mut Self {
        self.push(encode_real(value))
    }

    pub fn encode_value(&mut self, value: &AsnValue) -> &mut Self {
        self.push(encode_value(value))
    }

    /// Wrap everything encoded by `elements` in a SEQUENCE
    pub fn encode_sequence(&mut self, elements: BerEncoder) -> &mut Self {
        self.push(encode_sequence(elements.parts))
    }

    /// Context-specific tag around already-encoded content
    pub fn encode_context_specific(&mut self, number: u64, form: AsnForm, content: BerWriter) -> &mut Self {
        self.encode_tlv(&BerTag::context_specific(form, number), content)
    }

    /// Application tag around already-encoded content
    pub fn encode_application(&mut self, number: u64, form: AsnForm, content: BerWriter) -> &mut Self {
        self.encode_tlv(&BerTag::application(form, number), content)
    }

    /// Total octets encoded so far
    pub fn len(&self) -> usize {
        self.parts.iter().map(BerWriter::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.parts.clear();
    }

    pub fn into_writer(self) -> BerWriter {
        BerWriter::concat(self.parts)
    }

    pub fn into_bytes(self) -> Bytes {
        self.into_writer().into_bytes()
    }
}
