//! Core types for the asn1rt ASN.1 runtime
//!
//! This crate provides the pieces every encoding rule shares: the error
//! type, zero-copy byte windows, tag class/form enums and the closed
//! value model that generated ASN.1 types convert to and from.

pub mod error;
pub mod window;
pub mod datatypes;

pub use error::{Asn1Error, Asn1Result, TlvField};
pub use window::{ByteWindow, ByteWindowMut};
pub use datatypes::*;
