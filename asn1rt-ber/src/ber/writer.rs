//! Lazily-sized BER output
//!
//! A BER length prefix has to be known before the content it describes is
//! written. [`BerWriter`] is a tree of byte-producing nodes that reports its
//! total length without materializing anything, so an outer TLV can compute
//! its length octets from already-built inner writers. The tree is drained
//! once, front to back, into a sink.

use crate::error::{Asn1Error, Asn1Result};
use asn1rt_core::ByteWindowMut;
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Empty,
    Octet(u8),
    Octets(Bytes),
    Concat { parts: Vec<BerWriter>, length: usize },
}

/// Immutable, composable producer of BER octets
///
/// # Example
/// ```
/// use asn1rt_ber::BerWriter;
///
/// let writer = BerWriter::octet(0x05).then(BerWriter::octet(0x00));
/// assert_eq!(writer.len(), 2);
/// assert_eq!(&writer.into_bytes()[..], &[0x05, 0x00]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BerWriter {
    node: Node,
}

impl BerWriter {
    /// Writer producing no octets
    pub fn empty() -> Self {
        Self { node: Node::Empty }
    }

    pub fn octet(value: u8) -> Self {
        Self {
            node: Node::Octet(value),
        }
    }

    pub fn octets(value: impl Into<Bytes>) -> Self {
        let bytes = value.into();
        if bytes.is_empty() {
            return Self::empty();
        }
        Self {
            node: Node::Octets(bytes),
        }
    }

    /// Concatenate writers, in order
    pub fn concat(parts: impl IntoIterator<Item = BerWriter>) -> Self {
        let parts: Vec<BerWriter> = parts.into_iter().filter(|p| !p.is_empty()).collect();
        match parts.len() {
            0 => Self::empty(),
            1 => parts.into_iter().next().unwrap_or_default(),
            _ => {
                let length = parts.iter().map(BerWriter::len).sum();
                Self {
                    node: Node::Concat { parts, length },
                }
            }
        }
    }

    /// `self` followed by `next`
    pub fn then(self, next: BerWriter) -> Self {
        Self::concat([self, next])
    }

    /// Number of octets this writer produces
    pub fn len(&self) -> usize {
        match &self.node {
            Node::Empty => 0,
            Node::Octet(_) => 1,
            Node::Octets(bytes) => bytes.len(),
            Node::Concat { length, .. } => *length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every octet, in order, into `sink`
    pub fn drain_to<B: BufMut>(self, sink: &mut B) {
        match self.node {
            Node::Empty => {}
            Node::Octet(value) => sink.put_u8(value),
            Node::Octets(bytes) => sink.put_slice(&bytes),
            Node::Concat { parts, .. } => {
                for part in parts {
                    part.drain_to(sink);
                }
            }
        }
    }

    /// Drain into a freshly allocated buffer of exactly [`len`](Self::len) bytes
    pub fn into_bytes(self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.len());
        self.drain_to(&mut buffer);
        buffer.freeze()
    }

    /// Drain into an `io::Write` sink
    pub fn write_to<W: Write>(self, sink: &mut W) -> Asn1Result<()> {
        match self.node {
            Node::Empty => {}
            Node::Octet(value) => sink.write_all(&[value])?,
            Node::Octets(bytes) => sink.write_all(&bytes)?,
            Node::Concat { parts, .. } => {
                for part in parts {
                    part.write_to(sink)?;
                }
            }
        }
        Ok(())
    }

    /// Drain into a caller-owned buffer through its write cursor
    ///
    /// Returns the cursor positioned after the written octets.
    ///
    /// # Errors
    /// Returns `OutOfRange` before writing anything when the cursor is too short.
    pub fn write_into<'a>(self, mut cursor: ByteWindowMut<'a>) -> Asn1Result<ByteWindowMut<'a>> {
        if self.len() > cursor.len() {
            return Err(Asn1Error::OutOfRange {
                index: self.len(),
                length: cursor.len(),
            });
        }
        self.put_into(&mut cursor)?;
        Ok(cursor)
    }

    fn put_into(self, cursor: &mut ByteWindowMut<'_>) -> Asn1Result<()> {
        match self.node {
            Node::Empty => Ok(()),
            Node::Octet(value) => cursor.put(&[value]),
            Node::Octets(bytes) => cursor.put(&bytes),
            Node::Concat { parts, .. } => {
                for part in parts {
                    part.put_into(cursor)?;
                }
                Ok(())
            }
        }
    }
}

impl Default for BerWriter {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<BerWriter> for BerWriter {
    fn from_iter<I: IntoIterator<Item = BerWriter>>(iter: I) -> Self {
        Self::concat(iter)
    }
}

impl From<Vec<u8>> for BerWriter {
    fn from(value: Vec<u8>) -> Self {
        Self::octets(value)
    }
}
