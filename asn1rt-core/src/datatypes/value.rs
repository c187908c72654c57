//! Closed value model for ASN.1 data
//!
//! Generated ASN.1 types do not carry encode/decode logic of their own.
//! Each one converts to and from [`AsnValue`], and the encoding rules only
//! ever see that small set of variants.

use crate::datatypes::tag::AsnClass;
use crate::error::{Asn1Error, Asn1Result};
use num_bigint_dig::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A value of one of the kinds the runtime knows how to encode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AsnValue {
    /// BOOLEAN
    Boolean(bool),
    /// NULL
    Null,
    /// INTEGER (arbitrary precision; also carries ENUMERATED values)
    Integer(BigInt),
    /// REAL (IEEE-754 double)
    Real(f64),
    /// SEQUENCE OF / SEQUENCE, elements in order
    SequenceOf(Vec<AsnValue>),
    /// One alternative of a CHOICE, identified by its tag
    Choice {
        class: AsnClass,
        number: u64,
        value: Box<AsnValue>,
    },
}

impl AsnValue {
    pub fn integer(value: impl Into<BigInt>) -> Self {
        AsnValue::Integer(value.into())
    }

    /// Context-specific CHOICE alternative `[number]`
    pub fn choice(number: u64, value: AsnValue) -> Self {
        AsnValue::Choice {
            class: AsnClass::ContextSpecific,
            number,
            value: Box::new(value),
        }
    }

    /// Short name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            AsnValue::Boolean(_) => "BOOLEAN",
            AsnValue::Null => "NULL",
            AsnValue::Integer(_) => "INTEGER",
            AsnValue::Real(_) => "REAL",
            AsnValue::SequenceOf(_) => "SEQUENCE OF",
            AsnValue::Choice { .. } => "CHOICE",
        }
    }

    fn mismatch(&self, expected: &str) -> Asn1Error {
        Asn1Error::UnexpectedValue(format!("expected {}, got {}", expected, self.kind()))
    }
}

/// Conversion of a model type into the value model
pub trait ToAsnValue {
    fn to_asn_value(&self) -> AsnValue;
}

/// Conversion of a decoded value back into a model type
pub trait FromAsnValue: Sized {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self>;
}

impl ToAsnValue for AsnValue {
    fn to_asn_value(&self) -> AsnValue {
        self.clone()
    }
}

impl FromAsnValue for AsnValue {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        Ok(value.clone())
    }
}

impl ToAsnValue for bool {
    fn to_asn_value(&self) -> AsnValue {
        AsnValue::Boolean(*self)
    }
}

impl FromAsnValue for bool {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        match value {
            AsnValue::Boolean(b) => Ok(*b),
            other => Err(other.mismatch("BOOLEAN")),
        }
    }
}

impl ToAsnValue for () {
    fn to_asn_value(&self) -> AsnValue {
        AsnValue::Null
    }
}

impl FromAsnValue for () {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        match value {
            AsnValue::Null => Ok(()),
            other => Err(other.mismatch("NULL")),
        }
    }
}

impl ToAsnValue for i64 {
    fn to_asn_value(&self) -> AsnValue {
        AsnValue::Integer(BigInt::from(*self))
    }
}

impl FromAsnValue for i64 {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        match value {
            AsnValue::Integer(i) => i.to_i64().ok_or_else(|| {
                Asn1Error::UnexpectedValue(format!("INTEGER {} does not fit in i64", i))
            }),
            other => Err(other.mismatch("INTEGER")),
        }
    }
}

impl ToAsnValue for BigInt {
    fn to_asn_value(&self) -> AsnValue {
        AsnValue::Integer(self.clone())
    }
}

impl FromAsnValue for BigInt {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        match value {
            AsnValue::Integer(i) => Ok(i.clone()),
            other => Err(other.mismatch("INTEGER")),
        }
    }
}

impl ToAsnValue for f64 {
    fn to_asn_value(&self) -> AsnValue {
        AsnValue::Real(*self)
    }
}

impl FromAsnValue for f64 {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        match value {
            AsnValue::Real(r) => Ok(*r),
            other => Err(other.mismatch("REAL")),
        }
    }
}

impl<T: ToAsnValue> ToAsnValue for Vec<T> {
    fn to_asn_value(&self) -> AsnValue {
        AsnValue::SequenceOf(self.iter().map(ToAsnValue::to_asn_value).collect())
    }
}

impl<T: FromAsnValue> FromAsnValue for Vec<T> {
    fn from_asn_value(value: &AsnValue) -> Asn1Result<Self> {
        match value {
            AsnValue::SequenceOf(items) => items.iter().map(T::from_asn_value).collect(),
            other => Err(other.mismatch("SEQUENCE OF")),
        }
    }
}
