use thiserror::Error;

use crate::alloc::DoId;
use crate::dclass::{ClassId, DcError, FieldId};

/// Errors raised by object construction, dispatch, and lifecycle calls
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ObjectError {
    /// No constructor registered for the class id
    #[error("no constructor registered for class id {0}")]
    UnknownClass(ClassId),
    /// No live or disabled object with the doId
    #[error("no object with doId {0}")]
    UnknownObject(DoId),
    /// The doId was deleted earlier; deletes are terminal
    #[error("doId {0} is already deleted")]
    AlreadyDeleted(DoId),
    /// The named field does not exist on the class
    #[error("unknown field `{name}` on class `{class}`")]
    UnknownField { class: String, name: String },
    /// A wire update named a field id no schema field carries
    #[error("unknown field id {0}")]
    UnknownFieldId(FieldId),
    /// A client tried to send a field it neither owns nor may clsend
    #[error("field `{field}` is not sendable from this endpoint")]
    FieldNotSendable { field: String },
    /// Packing or unpacking the field's arguments failed
    #[error(transparent)]
    Dc(#[from] DcError),
}
