use std::fmt;
use thiserror::Error;

/// The TLV field a decoder was reading when the input ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlvField {
    /// Identifier octets (including high tag number continuations)
    Tag,
    /// Length octets
    Length,
    /// Content octets
    Content,
    /// The two-zero-octet marker closing an indefinite length
    EndOfContents,
}

impl fmt::Display for TlvField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TlvField::Tag => "tag",
            TlvField::Length => "length",
            TlvField::Content => "content",
            TlvField::EndOfContents => "end-of-contents",
        };
        f.write_str(name)
    }
}

/// Main error type for asn1rt operations
#[derive(Error, Debug)]
pub enum Asn1Error {
    /// Caller contract violation (negative tag number, negative length)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Index {index} out of range for window of length {length}")]
    OutOfRange { index: usize, length: usize },

    /// Input ended before a field could be read completely
    #[error("Truncated input: incomplete {field} at offset {offset}")]
    Truncated { offset: usize, field: TlvField },

    /// Input is complete but not a legal encoding
    #[error("Malformed encoding at offset {offset}: {reason}")]
    Malformed { offset: usize, reason: String },

    #[error("Constructed nesting exceeds maximum depth {max}")]
    DepthExceeded { max: usize },

    #[error("Unexpected tag: expected {expected}, found {found}")]
    UnexpectedTag { expected: String, found: String },

    #[error("Unexpected value: {0}")]
    UnexpectedValue(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Asn1Error {
    /// Shorthand for a [`Asn1Error::Malformed`] error
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Asn1Error::Malformed {
            offset,
            reason: reason.into(),
        }
    }

    /// Byte offset the error refers to, when it has one
    pub fn offset(&self) -> Option<usize> {
        match self {
            Asn1Error::Truncated { offset, .. } | Asn1Error::Malformed { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        }
    }
}

/// Result type alias for asn1rt operations
pub type Asn1Result<T> = Result<T, Asn1Error>;
