//! Tag class and form

use serde::{Deserialize, Serialize};
use std::fmt;

/// ASN.1 tag class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (BOOLEAN, INTEGER, REAL, ...)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (fields of SEQUENCE/CHOICE)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsnClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl AsnClass {
    /// Get tag class from an identifier octet (bits 8-7)
    pub fn from_bits(octet: u8) -> Self {
        match (octet >> 6) & 0x03 {
            0 => AsnClass::Universal,
            1 => AsnClass::Application,
            2 => AsnClass::ContextSpecific,
            _ => AsnClass::Private,
        }
    }

    /// Class bits positioned for the identifier octet
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }

    /// Label used by the diagnostic dump
    pub fn label(self) -> &'static str {
        match self {
            AsnClass::Universal => "UNIVERSAL",
            AsnClass::Application => "APPLICATION",
            AsnClass::ContextSpecific => "CONTEXT",
            AsnClass::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for AsnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Primitive or constructed encoding (bit 6 of the identifier octet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsnForm {
    Primitive,
    Constructed,
}

impl AsnForm {
    pub fn from_bits(octet: u8) -> Self {
        if octet & 0x20 != 0 {
            AsnForm::Constructed
        } else {
            AsnForm::Primitive
        }
    }

    pub fn to_bits(self) -> u8 {
        match self {
            AsnForm::Primitive => 0x00,
            AsnForm::Constructed => 0x20,
        }
    }

    pub fn is_constructed(self) -> bool {
        self == AsnForm::Constructed
    }

    pub fn label(self) -> &'static str {
        match self {
            AsnForm::Primitive => "PRIMITIVE",
            AsnForm::Constructed => "CONSTRUCTED",
        }
    }
}

impl fmt::Display for AsnForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
