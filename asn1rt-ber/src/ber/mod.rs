//! BER (Basic Encoding Rules) for ASN.1
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C F T T T T T
//! ```
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - F = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 followed by base-128 groups
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: `0x80 | k` followed by `k` big-endian length bytes
//! - **Indefinite form** (`0x80`): constructed content runs until an
//!   end-of-contents marker `00 00`; accepted when decoding, never produced
//!
//! # Modules
//!
//! - [`writer`]: lazily-sized output that knows its length before draining
//! - [`types`]: tag and length octets
//! - [`encoder`]: TLV encoders for BOOLEAN, NULL, INTEGER, REAL and nesting
//! - [`real`]: X.690 binary REAL encoding
//! - [`decoder`]: strict sequential decoding to Rust values
//! - [`tlv`]: tolerant structure walker for diagnostics
//! - [`dump`]: indented text rendering of walked structure

pub mod decoder;
pub mod dump;
pub mod encoder;
pub mod real;
pub mod tlv;
pub mod types;
pub mod writer;

pub use decoder::BerDecoder;
pub use dump::{dump, dump_with, DiagnosticSink, IndentScope, IndentWriter};
pub use encoder::BerEncoder;
pub use tlv::{walk, walk_window, TlvNode, TlvTree, WalkerConfig};
pub use types::{BerLength, BerTag};
pub use writer::BerWriter;
