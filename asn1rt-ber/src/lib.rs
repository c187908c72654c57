//! BER encoding rules for the asn1rt runtime
//!
//! Encoding goes through [`BerWriter`], a writer tree whose length is known
//! before any octet is produced, so nested TLVs are built inside out without
//! copying. Decoding reads from a zero-copy [`ByteWindow`]: [`BerDecoder`]
//! strictly, the [`ber::tlv`] walker tolerantly for diagnostics.

pub mod ber;
pub mod error;

pub use asn1rt_core::{AsnClass, AsnForm, AsnValue, ByteWindow, ByteWindowMut, FromAsnValue, ToAsnValue};
pub use ber::{
    dump, dump_with, walk, walk_window, BerDecoder, BerEncoder, BerLength, BerTag, BerWriter,
    DiagnosticSink, IndentScope, IndentWriter, TlvNode, TlvTree, WalkerConfig,
};
pub use error::{Asn1Error, Asn1Result, TlvField};
