use thiserror::Error;

use crate::datagram::DatagramError;

/// Errors that can occur packing or unpacking dclass field values
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DcError {
    /// Wrong number of arguments for a field
    #[error("field `{field}` expects {expected} arguments, got {got}")]
    ArityMismatch {
        field: String,
        expected: usize,
        got: usize,
    },
    /// An argument's value variant does not match the declared parameter type
    #[error("field `{field}` argument {index} expects {expected}, got {got}")]
    TypeMismatch {
        field: String,
        index: usize,
        expected: &'static str,
        got: &'static str,
    },
    /// A float argument routed through a divisor was NaN or infinite
    #[error("field `{field}` argument {index} is not a finite number")]
    NonFinite { field: String, index: usize },
    /// A scaled numeric value does not fit its wire width
    #[error("field `{field}` argument {index} value {value} does not fit {ty}")]
    ValueOutOfRange {
        field: String,
        index: usize,
        value: f64,
        ty: &'static str,
    },
    /// An array payload length is not a multiple of the element width
    #[error("field `{field}` array of {len} bytes is not a multiple of {width}-byte elements")]
    BadArrayLength {
        field: String,
        len: usize,
        width: usize,
    },
    /// Underlying datagram read/write failure
    #[error(transparent)]
    Datagram(#[from] DatagramError),
}
