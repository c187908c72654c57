//! BER encoding types (Tag, Length)

use crate::ber::writer::BerWriter;
use crate::error::{Asn1Error, Asn1Result, TlvField};
use asn1rt_core::{AsnClass, AsnForm, ByteWindow};
use std::fmt;

/// BER Tag
///
/// A BER tag identifies the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Form**: Primitive or Constructed
/// - **Tag Number**: 0-30 in the identifier octet, anything larger in
///   base-128 continuation octets
///
/// # Encoding Format
///
/// Low tag number form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C F T T T T T
/// ```
///
/// High tag number form (tag number >= 31):
/// ```text
/// First byte:  C C F 1 1 1 1 1
/// Following:   1 T T T T T T T ... 0 T T T T T T T
/// ```
/// The continuation groups are big-endian, 7 bits each, with bit 8 set on
/// every group except the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerTag {
    class: AsnClass,
    form: AsnForm,
    number: u64,
}

/// Largest tag number that fits in the identifier octet
pub const MAX_LOW_TAG_NUMBER: u64 = 30;

const HIGH_TAG_SENTINEL: u8 = 0x1F;

impl BerTag {
    pub const END_OF_CONTENTS: BerTag = BerTag::universal(AsnForm::Primitive, 0);
    pub const BOOLEAN: BerTag = BerTag::universal(AsnForm::Primitive, 1);
    pub const INTEGER: BerTag = BerTag::universal(AsnForm::Primitive, 2);
    pub const NULL: BerTag = BerTag::universal(AsnForm::Primitive, 5);
    pub const REAL: BerTag = BerTag::universal(AsnForm::Primitive, 9);
    pub const SEQUENCE: BerTag = BerTag::universal(AsnForm::Constructed, 16);

    pub const fn new(class: AsnClass, form: AsnForm, number: u64) -> Self {
        Self {
            class,
            form,
            number,
        }
    }

    /// Create a Universal class tag
    pub const fn universal(form: AsnForm, number: u64) -> Self {
        Self::new(AsnClass::Universal, form, number)
    }

    /// Create an Application class tag
    pub const fn application(form: AsnForm, number: u64) -> Self {
        Self::new(AsnClass::Application, form, number)
    }

    /// Create a Context-specific class tag
    pub const fn context_specific(form: AsnForm, number: u64) -> Self {
        Self::new(AsnClass::ContextSpecific, form, number)
    }

    /// Create a Private class tag
    pub const fn private(form: AsnForm, number: u64) -> Self {
        Self::new(AsnClass::Private, form, number)
    }

    pub fn class(&self) -> AsnClass {
        self.class
    }

    pub fn form(&self) -> AsnForm {
        self.form
    }

    pub fn is_constructed(&self) -> bool {
        self.form.is_constructed()
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// Encode the identifier octets
    pub fn encode(&self) -> BerWriter {
        let leading = self.class.to_bits() | self.form.to_bits();

        if self.number <= MAX_LOW_TAG_NUMBER {
            return BerWriter::octet(leading | self.number as u8);
        }

        log::trace!("high tag number form for {}", self.number);
        let mut octets = Vec::with_capacity(11);
        octets.push(leading | HIGH_TAG_SENTINEL);
        push_base128(&mut octets, self.number);
        BerWriter::octets(octets)
    }

    /// Decode identifier octets from the front of `window`
    ///
    /// # Returns
    /// Returns `Ok((BerTag, bytes_consumed))` if successful.
    ///
    /// # Error Handling
    /// - `Truncated` if the window ends before the last continuation octet
    /// - `Malformed` if the tag number does not fit in 64 bits
    pub fn decode(window: &ByteWindow<'_>) -> Asn1Result<(Self, usize)> {
        let truncated = |pos: usize| Asn1Error::Truncated {
            offset: window.offset() + pos,
            field: TlvField::Tag,
        };

        let first = window.get(0).map_err(|_| truncated(0))?;
        let class = AsnClass::from_bits(first);
        let form = AsnForm::from_bits(first);
        let low = first & HIGH_TAG_SENTINEL;

        if low != HIGH_TAG_SENTINEL {
            return Ok((Self::new(class, form, low as u64), 1));
        }

        let mut number: u64 = 0;
        let mut pos = 1;
        loop {
            let octet = window.get(pos).map_err(|_| truncated(pos))?;
            if number > (u64::MAX >> 7) {
                return Err(Asn1Error::malformed(
                    window.offset() + pos,
                    "tag number overflows 64 bits",
                ));
            }
            number = (number << 7) | (octet & 0x7F) as u64;
            pos += 1;
            if octet & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, form, number), pos))
    }
}

impl fmt::Display for BerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {}]", self.class, self.form, self.number)
    }
}

/// Append `value` as big-endian base-128 groups, continuation bit on all but the last
pub(crate) fn push_base128(out: &mut Vec<u8>, value: u64) {
    let groups = ((64 - value.leading_zeros()).max(1)).div_ceil(7);
    for i in (0..groups).rev() {
        let group = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            out.push(group | 0x80);
        } else {
            out.push(group);
        }
    }
}

/// BER Length encoding
///
/// BER length can be encoded in three forms:
/// - **Short form**: For lengths 0-127 (1 byte)
/// - **Long form**: For lengths > 127, length-of-length byte followed by
///   the fewest big-endian bytes that hold the value
/// - **Indefinite form**: `0x80` alone; content runs until two zero octets.
///   Only ever produced by decoding.
///
/// # Encoding Format
///
/// Short form:
/// ```text
/// Byte: 0 L L L L L L L
/// ```
///
/// Long form:
/// ```text
/// First byte:  1 N N N N N N N  (N = number of length bytes)
/// Following bytes: L L L L L L L L  (big-endian length value)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    /// Short form: length 0-127
    Short(u8),
    /// Long form: length > 127, encoded with length-of-length
    Long(usize),
    /// Indefinite form, terminated by an end-of-contents marker
    Indefinite,
}

impl BerLength {
    /// Create a definite length, choosing short or long form
    pub fn new(length: usize) -> Self {
        if length < 128 {
            BerLength::Short(length as u8)
        } else {
            BerLength::Long(length)
        }
    }

    /// The definite length value, `None` for the indefinite form
    pub fn value(&self) -> Option<usize> {
        match self {
            BerLength::Short(l) => Some(*l as usize),
            BerLength::Long(l) => Some(*l),
            BerLength::Indefinite => None,
        }
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, BerLength::Indefinite)
    }

    /// Encode the length octets
    ///
    /// The form follows the value, not the variant: a `Short` above 127 or
    /// a `Long` below 128 still encodes minimally.
    pub fn encode(&self) -> BerWriter {
        let Some(length) = self.value() else {
            return BerWriter::octet(0x80);
        };
        if length < 128 {
            return BerWriter::octet(length as u8);
        }

        let value = length as u64;
        let num_bytes = ((64 - value.leading_zeros()) as usize).div_ceil(8);
        log::trace!("long form length {} in {} octets", length, num_bytes);

        let mut octets = Vec::with_capacity(1 + num_bytes);
        octets.push(0x80 | num_bytes as u8);
        for i in (0..num_bytes).rev() {
            octets.push((value >> (i * 8)) as u8);
        }
        BerWriter::octets(octets)
    }

    /// Decode length octets from the front of `window`
    ///
    /// # Returns
    /// Returns `Ok((BerLength, bytes_consumed))` if successful.
    ///
    /// # Error Handling
    /// - `Truncated` if the window ends inside the length octets
    /// - `Malformed` for the reserved `0xFF` first octet or a value beyond `usize`
    pub fn decode(window: &ByteWindow<'_>) -> Asn1Result<(Self, usize)> {
        let truncated = |pos: usize| Asn1Error::Truncated {
            offset: window.offset() + pos,
            field: TlvField::Length,
        };

        let first = window.get(0).map_err(|_| truncated(0))?;

        if first & 0x80 == 0 {
            return Ok((BerLength::Short(first), 1));
        }

        let num_bytes = (first & 0x7F) as usize;
        if num_bytes == 0 {
            return Ok((BerLength::Indefinite, 1));
        }
        if num_bytes == 0x7F {
            return Err(Asn1Error::malformed(
                window.offset(),
                "reserved length octet 0xff",
            ));
        }

        let mut length: usize = 0;
        for pos in 1..=num_bytes {
            let octet = window.get(pos).map_err(|_| truncated(pos))?;
            length = length
                .checked_mul(256)
                .map(|l| l | octet as usize)
                .ok_or_else(|| {
                    Asn1Error::malformed(window.offset(), "length does not fit in usize")
                })?;
        }

        Ok((BerLength::Long(length), 1 + num_bytes))
    }
}
