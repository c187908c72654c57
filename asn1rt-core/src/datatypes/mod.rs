//! Data types shared by the asn1rt encoders and decoders

pub mod tag;
pub mod value;

pub use tag::{AsnClass, AsnForm};
pub use value::{AsnValue, FromAsnValue, ToAsnValue};
