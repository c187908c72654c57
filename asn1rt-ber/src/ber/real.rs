//! REAL (X.690 §8.5) content encoding and decoding
//!
//! Doubles are sent in the binary form with base 2 and scale factor 0:
//!
//! ```text
//! first octet:  1 S 0 0 0 0 E E   (S = sign, EE = exponent format)
//! exponent:     1-3 octets, two's complement
//! mantissa:     remaining octets, unsigned, big-endian
//! ```
//!
//! The significand is shifted right until it is odd and the exponent is
//! raised by the same amount, so `1.0` is sent as mantissa `1`, exponent `0`
//! rather than as a 53-bit integer.

use crate::ber::encoder::integer_octets;
use crate::ber::writer::BerWriter;
use crate::error::{Asn1Error, Asn1Result};
use asn1rt_core::ByteWindow;

const SPECIAL_PLUS_INFINITY: u8 = 0x40;
const SPECIAL_MINUS_INFINITY: u8 = 0x41;
const SPECIAL_NOT_A_NUMBER: u8 = 0x42;
const SPECIAL_MINUS_ZERO: u8 = 0x43;

const BINARY_FORM: u8 = 0x80;
const SIGN_BIT: u8 = 0x40;

const FRACTION_BITS: u32 = 52;
const EXPONENT_BIAS: i32 = 1023;

/// Number of trailing zero bits within the low `2^log2_width` bits of `value`
///
/// Returns `2^log2_width` when all of those bits are zero. `log2_width` is
/// clamped to 6 (a full 64-bit word).
///
/// ```
/// use asn1rt_ber::ber::real::trailing_zeros_within;
///
/// assert_eq!(trailing_zeros_within(0x8, 2), 3);
/// assert_eq!(trailing_zeros_within(0x10, 2), 4); // low nibble is empty
/// ```
pub fn trailing_zeros_within(value: u64, log2_width: u32) -> u32 {
    let width = 1u32 << log2_width.min(6);
    let mut value = if width == 64 {
        value
    } else {
        value & ((1u64 << width) - 1)
    };

    if value == 0 {
        return width;
    }

    // Halve the search window each round; a zero lower half is counted and shifted out.
    let mut count = 0;
    let mut half = width / 2;
    while half > 0 {
        if value & ((1u64 << half) - 1) == 0 {
            count += half;
            value >>= half;
        }
        half /= 2;
    }
    count
}

/// Number of trailing zero bits in `value`, 64 for zero
pub fn trailing_zeros(value: u64) -> u32 {
    trailing_zeros_within(value, 6)
}

/// Content octets of a REAL
pub fn encode_real_content(value: f64) -> BerWriter {
    if value.is_nan() {
        return BerWriter::octet(SPECIAL_NOT_A_NUMBER);
    }
    if value.is_infinite() {
        return BerWriter::octet(if value > 0.0 {
            SPECIAL_PLUS_INFINITY
        } else {
            SPECIAL_MINUS_INFINITY
        });
    }
    if value == 0.0 {
        return if value.is_sign_negative() {
            BerWriter::octet(SPECIAL_MINUS_ZERO)
        } else {
            BerWriter::empty()
        };
    }

    let bits = value.to_bits();
    let negative = bits >> 63 != 0;
    let biased = ((bits >> FRACTION_BITS) & 0x7FF) as i32;
    let fraction = bits & ((1u64 << FRACTION_BITS) - 1);

    // Subnormals have no implicit leading one and a fixed exponent.
    let (mut mantissa, mut exponent) = if biased == 0 {
        (fraction, 1 - EXPONENT_BIAS - FRACTION_BITS as i32)
    } else {
        (
            fraction | (1u64 << FRACTION_BITS),
            biased - EXPONENT_BIAS - FRACTION_BITS as i32,
        )
    };

    let shift = trailing_zeros(mantissa);
    mantissa >>= shift;
    exponent += shift as i32;

    let exponent_octets = integer_octets(exponent as i64);
    let mantissa_len = (((64 - mantissa.leading_zeros()) as usize).div_ceil(8)).max(1);

    log::trace!(
        "REAL {} -> mantissa {:#x} exponent {} ({} exponent octets)",
        value,
        mantissa,
        exponent,
        exponent_octets.len()
    );

    let mut first = BINARY_FORM | (exponent_octets.len() as u8 - 1);
    if negative {
        first |= SIGN_BIT;
    }

    let mut octets = Vec::with_capacity(1 + exponent_octets.len() + mantissa_len);
    octets.push(first);
    octets.extend_from_slice(&exponent_octets);
    for i in (0..mantissa_len).rev() {
        octets.push((mantissa >> (i * 8)) as u8);
    }
    BerWriter::octets(octets)
}

/// Decode the content octets of a REAL
///
/// Accepts every binary form (bases 2, 8 and 16, any scale factor and
/// exponent format), the special values and the ISO 6093 decimal forms.
pub fn decode_real_content(content: &ByteWindow<'_>) -> Asn1Result<f64> {
    let octets = content.as_slice();
    let Some(&first) = octets.first() else {
        return Ok(0.0);
    };

    if first & BINARY_FORM != 0 {
        return decode_binary(content.offset(), first, &octets[1..]);
    }

    if first & SIGN_BIT != 0 {
        if octets.len() != 1 {
            return Err(Asn1Error::malformed(
                content.offset(),
                "special REAL value must be a single octet",
            ));
        }
        return match first {
            SPECIAL_PLUS_INFINITY => Ok(f64::INFINITY),
            SPECIAL_MINUS_INFINITY => Ok(f64::NEG_INFINITY),
            SPECIAL_NOT_A_NUMBER => Ok(f64::NAN),
            SPECIAL_MINUS_ZERO => Ok(-0.0),
            other => Err(Asn1Error::malformed(
                content.offset(),
                format!("unknown special REAL value {:#04x}", other),
            )),
        };
    }

    decode_decimal(content.offset(), first, &octets[1..])
}

fn decode_binary(offset: usize, first: u8, rest: &[u8]) -> Asn1Result<f64> {
    let bits_per_digit: i64 = match (first >> 4) & 0x03 {
        0 => 1,
        1 => 3,
        2 => 4,
        _ => return Err(Asn1Error::malformed(offset, "reserved REAL base")),
    };
    let scale = ((first >> 2) & 0x03) as i64;

    let (exponent_len, exponent_start) = match first & 0x03 {
        3 => {
            let count = *rest
                .first()
                .ok_or_else(|| Asn1Error::malformed(offset, "missing REAL exponent length"))?;
            (count as usize, 1)
        }
        n => (n as usize + 1, 0),
    };
    if exponent_len == 0 || exponent_len > 8 {
        return Err(Asn1Error::malformed(
            offset,
            format!("unsupported REAL exponent length {}", exponent_len),
        ));
    }
    let exponent_end = exponent_start + exponent_len;
    if rest.len() < exponent_end {
        return Err(Asn1Error::malformed(offset, "REAL exponent runs past content"));
    }

    let exponent = rest[exponent_start..exponent_end]
        .iter()
        .fold(if rest[exponent_start] & 0x80 != 0 { -1i64 } else { 0 }, |acc, &b| {
            (acc << 8) | b as i64
        });

    let Some(mantissa) = Mantissa::from_octets(&rest[exponent_end..]) else {
        return Ok(if first & SIGN_BIT != 0 { -0.0 } else { 0.0 });
    };

    let power = exponent
        .saturating_mul(bits_per_digit)
        .saturating_add(scale)
        .saturating_add(mantissa.shift);
    let magnitude = mantissa.scale(power);
    Ok(if first & SIGN_BIT != 0 {
        -magnitude
    } else {
        magnitude
    })
}

/// Nonzero mantissa reduced to at most 64 significant bits
///
/// `bits * 2^shift` equals the sent mantissa, except that bits dropped past
/// the 64th are folded into a sticky low bit so rounding still sees them.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Mantissa {
    bits: u64,
    shift: i64,
}

impl Mantissa {
    fn from_octets(octets: &[u8]) -> Option<Self> {
        let start = octets.iter().position(|&b| b != 0)?;
        let end = octets.iter().rposition(|&b| b != 0)? + 1;
        let significant = &octets[start..end];
        let mut shift = 8 * (octets.len() - end) as i64;

        let kept = significant.len().min(8);
        let mut bits = significant[..kept]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        let dropped = &significant[kept..];
        if !dropped.is_empty() {
            shift = shift.saturating_add(8 * dropped.len() as i64);
            // the last dropped octet is nonzero by construction
            bits |= 1;
        }
        Some(Self { bits, shift })
    }

    /// `bits * 2^power` rounded once to the nearest double, ties to even
    fn scale(self, power: i64) -> f64 {
        let bit_len = i64::from(64 - self.bits.leading_zeros());
        // Bits below the result's last place: 53 significant bits for a
        // normal result, fewer once it is subnormal
        let excess = (bit_len - 53).max(MIN_SUBNORMAL_EXPONENT.saturating_sub(power));
        if excess <= 0 {
            return scale_by_power_of_two(self.bits as f64, power);
        }
        if excess > 64 {
            return 0.0;
        }
        let rounded = round_shift(self.bits, excess as u32);
        scale_by_power_of_two(rounded as f64, power.saturating_add(excess))
    }
}

/// Exponent of the least significant bit of the smallest subnormal
const MIN_SUBNORMAL_EXPONENT: i64 = -1074;

/// `value >> shift` rounded to nearest, ties to even, for `1..=64`
fn round_shift(value: u64, shift: u32) -> u64 {
    let wide = u128::from(value);
    let quotient = wide >> shift;
    let remainder = wide & ((1u128 << shift) - 1);
    let half = 1u128 << (shift - 1);
    let round_up = remainder > half || (remainder == half && quotient & 1 == 1);
    (quotient + u128::from(round_up)) as u64
}

/// `value * 2^power`, stepping so intermediate powers stay representable
fn scale_by_power_of_two(mut value: f64, mut power: i64) -> f64 {
    const STEP: i32 = 1000;
    while power > STEP as i64 && value.is_finite() {
        value *= 2f64.powi(STEP);
        power -= STEP as i64;
    }
    while power < -(STEP as i64) && value != 0.0 {
        value *= 2f64.powi(-STEP);
        power += STEP as i64;
    }
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    value * 2f64.powi(power as i32)
}

fn decode_decimal(offset: usize, first: u8, rest: &[u8]) -> Asn1Result<f64> {
    let form = first & 0x3F;
    if !(1..=3).contains(&form) {
        return Err(Asn1Error::malformed(
            offset,
            format!("unknown decimal REAL form {}", form),
        ));
    }
    let text = std::str::from_utf8(rest)
        .map_err(|_| Asn1Error::malformed(offset, "decimal REAL is not ASCII"))?;
    let number = text.trim_start_matches(' ');
    if !is_decimal_form(number, form) {
        return Err(Asn1Error::malformed(
            offset,
            format!("decimal REAL {:?} is not in NR{} form", text, form),
        ));
    }
    number
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|e| Asn1Error::malformed(offset, format!("decimal REAL {:?}: {}", text, e)))
}

/// ISO 6093 shape check, leading spaces already removed
///
/// NR1 is `[+-]digits`, NR2 adds exactly one `.` or `,` mark and NR3 adds
/// an `E` exponent to an NR2 mantissa.
fn is_decimal_form(number: &str, form: u8) -> bool {
    fn unsigned(s: &str) -> &str {
        s.strip_prefix(|c| c == '+' || c == '-').unwrap_or(s)
    }
    fn digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }
    fn with_mark(s: &str) -> bool {
        match s.split_once(|c| c == '.' || c == ',') {
            Some((whole, fraction)) => {
                (whole.is_empty() || digits(whole))
                    && (fraction.is_empty() || digits(fraction))
                    && !(whole.is_empty() && fraction.is_empty())
            }
            None => false,
        }
    }

    let body = unsigned(number);
    match form {
        1 => digits(body),
        2 => with_mark(body),
        3 => match body.split_once(|c| c == 'E' || c == 'e') {
            Some((mantissa, exponent)) => with_mark(mantissa) && digits(unsigned(exponent)),
            None => false,
        },
        _ => false,
    }
}
