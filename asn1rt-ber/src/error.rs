//! Error types for BER processing
//!
//! The error type lives in `asn1rt-core` so every crate reports the same kinds.

pub use asn1rt_core::error::{Asn1Error, Asn1Result, TlvField};
