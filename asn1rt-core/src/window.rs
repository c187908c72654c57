//! Zero-copy windows over a backing byte buffer
//!
//! A window is an `(offset, length)` view into a buffer that outlives it.
//! Deriving a narrower window never copies; it only re-validates the bounds.
//!
//! Two flavours exist:
//! - [`ByteWindow`] is a read-only view and is `Copy`, so many of them can
//!   point into the same buffer at once (the TLV walker hands them out for
//!   tag, length and content octets of every node).
//! - [`ByteWindowMut`] is the exclusive write cursor over a buffer the caller
//!   owns. It cannot be aliased by a read window while it is alive.

use crate::error::{Asn1Error, Asn1Result};
use std::fmt;

/// Read-only view over `buffer[start..start + length]`
///
/// # Invariant
/// `start + length <= buffer.len()` holds for every window, including all
/// windows derived through [`from`](Self::from) and [`until`](Self::until).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteWindow<'a> {
    buffer: &'a [u8],
    start: usize,
    length: usize,
}

impl<'a> ByteWindow<'a> {
    /// Window covering the whole buffer
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            start: 0,
            length: buffer.len(),
        }
    }

    /// Window over `buffer[start..start + length]`
    ///
    /// # Errors
    /// Returns `OutOfRange` if the bounds do not fit inside `buffer`.
    pub fn with_bounds(buffer: &'a [u8], start: usize, length: usize) -> Asn1Result<Self> {
        match start.checked_add(length) {
            Some(end) if end <= buffer.len() => Ok(Self {
                buffer,
                start,
                length,
            }),
            _ => Err(Asn1Error::OutOfRange {
                index: start.saturating_add(length),
                length: buffer.len(),
            }),
        }
    }

    /// Absolute position of this window's first byte in the backing buffer
    pub fn offset(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Window starting `offset` bytes later, with the same end
    pub fn from(&self, offset: usize) -> Asn1Result<Self> {
        if offset > self.length {
            return Err(Asn1Error::OutOfRange {
                index: offset,
                length: self.length,
            });
        }
        Ok(Self {
            buffer: self.buffer,
            start: self.start + offset,
            length: self.length - offset,
        })
    }

    /// Window over the first `offset` bytes
    pub fn until(&self, offset: usize) -> Asn1Result<Self> {
        if offset > self.length {
            return Err(Asn1Error::OutOfRange {
                index: offset,
                length: self.length,
            });
        }
        Ok(Self {
            buffer: self.buffer,
            start: self.start,
            length: offset,
        })
    }

    /// Split into `[0, mid)` and `[mid, len)`
    pub fn split_at(&self, mid: usize) -> Asn1Result<(Self, Self)> {
        Ok((self.until(mid)?, self.from(mid)?))
    }

    /// Byte at `index`, relative to the window start
    pub fn get(&self, index: usize) -> Asn1Result<u8> {
        if index >= self.length {
            return Err(Asn1Error::OutOfRange {
                index,
                length: self.length,
            });
        }
        Ok(self.buffer[self.start + index])
    }

    pub fn as_slice(&self) -> &'a [u8] {
        &self.buffer[self.start..self.start + self.length]
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'a, u8>> {
        self.as_slice().iter().copied()
    }
}

impl fmt::Debug for ByteWindow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteWindow@{}[", self.start)?;
        for (i, byte) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        f.write_str("]")
    }
}

/// Exclusive write cursor over `buffer[start..start + length]`
///
/// Writes through [`put`](Self::put) land at the front of the window and
/// shrink it, so the cursor only ever moves forward.
pub struct ByteWindowMut<'a> {
    buffer: &'a mut [u8],
    start: usize,
    length: usize,
}

impl<'a> ByteWindowMut<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let length = buffer.len();
        Self {
            buffer,
            start: 0,
            length,
        }
    }

    pub fn offset(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn from(self, offset: usize) -> Asn1Result<Self> {
        if offset > self.length {
            return Err(Asn1Error::OutOfRange {
                index: offset,
                length: self.length,
            });
        }
        Ok(Self {
            buffer: self.buffer,
            start: self.start + offset,
            length: self.length - offset,
        })
    }

    pub fn until(self, offset: usize) -> Asn1Result<Self> {
        if offset > self.length {
            return Err(Asn1Error::OutOfRange {
                index: offset,
                length: self.length,
            });
        }
        Ok(Self {
            buffer: self.buffer,
            start: self.start,
            length: offset,
        })
    }

    pub fn get(&self, index: usize) -> Asn1Result<u8> {
        if index >= self.length {
            return Err(Asn1Error::OutOfRange {
                index,
                length: self.length,
            });
        }
        Ok(self.buffer[self.start + index])
    }

    pub fn set(&mut self, index: usize, value: u8) -> Asn1Result<()> {
        if index >= self.length {
            return Err(Asn1Error::OutOfRange {
                index,
                length: self.length,
            });
        }
        self.buffer[self.start + index] = value;
        Ok(())
    }

    /// Copy `octets` to the front of the window and advance past them
    ///
    /// # Errors
    /// Returns `OutOfRange` without writing anything when `octets` does not fit.
    pub fn put(&mut self, octets: &[u8]) -> Asn1Result<()> {
        if octets.len() > self.length {
            return Err(Asn1Error::OutOfRange {
                index: octets.len(),
                length: self.length,
            });
        }
        self.buffer[self.start..self.start + octets.len()].copy_from_slice(octets);
        self.start += octets.len();
        self.length -= octets.len();
        Ok(())
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buffer[self.start..self.start + self.length]
    }

    /// Give up write access and turn the cursor into a read window
    pub fn freeze(self) -> ByteWindow<'a> {
        let ByteWindowMut {
            buffer,
            start,
            length,
        } = self;
        ByteWindow {
            buffer,
            start,
            length,
        }
    }
}

impl fmt::Debug for ByteWindowMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteWindowMut")
            .field("start", &self.start)
            .field("length", &self.length)
            .finish()
    }
}
