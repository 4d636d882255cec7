//! The distributed object model: the replication component, the object
//! trait repositories dispatch through, and the class-id constructor
//! registry.

mod distributed_object;
mod error;
mod factory;
mod state;

pub use distributed_object::{
    DistributedObject, HeadlessScene, ObjectContext, SceneGraph, UpdateOutbox,
};
pub use error::ObjectError;
pub use factory::ObjectFactory;
pub use state::{ActiveState, DelayDelete, DeleteDecision, ReleaseOutcome, ReplicationState};
