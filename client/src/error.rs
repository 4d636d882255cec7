use std::fmt;

use strix_shared::{AllocError, DatagramError, DcError, DoId, ObjectError, UnknownMsgType};

/// An error that can occur on the client repository
#[derive(Debug)]
pub enum StrixClientError {
    /// No transport is connected
    NotConnected,
    /// The server has not granted a doId range yet
    NoDoIdRange,
    /// The named class is not in the schema
    UnknownClassName(String),
    /// A create supplied the wrong number of required values
    RequiredArity {
        class: String,
        expected: usize,
        got: usize,
    },
    /// The doId was not created by this session
    NotOwned(DoId),
    /// The transport refused a packet
    SendError,
    /// The transport failed while receiving
    RecvError,
    Alloc(AllocError),
    Object(ObjectError),
    Dc(DcError),
    Datagram(DatagramError),
    UnknownMsg(UnknownMsgType),
}

impl fmt::Display for StrixClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected to a server"),
            Self::NoDoIdRange => write!(f, "no doId range has been granted"),
            Self::UnknownClassName(name) => write!(f, "unknown class `{name}`"),
            Self::RequiredArity {
                class,
                expected,
                got,
            } => write!(
                f,
                "class `{class}` has {expected} required fields, got {got} values"
            ),
            Self::NotOwned(do_id) => write!(f, "doId {do_id} was not created by this session"),
            Self::SendError => write!(f, "transport refused the outgoing packet"),
            Self::RecvError => write!(f, "transport failed while receiving"),
            Self::Alloc(e) => e.fmt(f),
            Self::Object(e) => e.fmt(f),
            Self::Dc(e) => e.fmt(f),
            Self::Datagram(e) => e.fmt(f),
            Self::UnknownMsg(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for StrixClientError {}

impl From<AllocError> for StrixClientError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

impl From<ObjectError> for StrixClientError {
    fn from(e: ObjectError) -> Self {
        Self::Object(e)
    }
}

impl From<DcError> for StrixClientError {
    fn from(e: DcError) -> Self {
        Self::Dc(e)
    }
}

impl From<DatagramError> for StrixClientError {
    fn from(e: DatagramError) -> Self {
        Self::Datagram(e)
    }
}

impl From<UnknownMsgType> for StrixClientError {
    fn from(e: UnknownMsgType) -> Self {
        Self::UnknownMsg(e)
    }
}
