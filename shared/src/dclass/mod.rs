//! The dclass system: class schemas describing the fields a distributed
//! object replicates, and the packing rules for their arguments.

mod class;
mod error;
mod field;
mod schema;
mod subatomic;
mod value;

pub use class::{ClassId, DcClass, DcClassDef};
pub use error::DcError;
pub use field::{DcField, DcFieldDef, DcKeywords, DcParameter, FieldId};
pub use schema::{DcSchema, SchemaError};
pub use subatomic::DcSubatomicType;
pub use value::DcValue;
