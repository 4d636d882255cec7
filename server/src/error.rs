use std::fmt;

use strix_shared::{AllocError, DatagramError, DcError, ObjectError, UnknownMsgType};

/// An error that can occur on the server repository
#[derive(Debug)]
pub enum StrixServerError {
    /// The named class is not in the schema
    UnknownClassName(String),
    /// A generate supplied the wrong number of required values
    RequiredArity {
        class: String,
        expected: usize,
        got: usize,
    },
    Alloc(AllocError),
    Object(ObjectError),
    Dc(DcError),
    Datagram(DatagramError),
    UnknownMsg(UnknownMsgType),
}

impl fmt::Display for StrixServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownClassName(name) => write!(f, "unknown class `{name}`"),
            Self::RequiredArity {
                class,
                expected,
                got,
            } => write!(
                f,
                "class `{class}` has {expected} required fields, got {got} values"
            ),
            Self::Alloc(e) => e.fmt(f),
            Self::Object(e) => e.fmt(f),
            Self::Dc(e) => e.fmt(f),
            Self::Datagram(e) => e.fmt(f),
            Self::UnknownMsg(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for StrixServerError {}

impl From<AllocError> for StrixServerError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

impl From<ObjectError> for StrixServerError {
    fn from(e: ObjectError) -> Self {
        Self::Object(e)
    }
}

impl From<DcError> for StrixServerError {
    fn from(e: DcError) -> Self {
        Self::Dc(e)
    }
}

impl From<DatagramError> for StrixServerError {
    fn from(e: DatagramError) -> Self {
        Self::Datagram(e)
    }
}

impl From<UnknownMsgType> for StrixServerError {
    fn from(e: UnknownMsgType) -> Self {
        Self::UnknownMsg(e)
    }
}
