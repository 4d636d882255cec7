//! # Strix Server
//! The authoritative endpoint of a strix deployment: it owns the object
//! table, grants doId blocks to connecting clients, tracks each session's
//! zone interest, and relays field updates between sessions.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;
pub mod shared {
    pub use strix_shared::{
        begin_message, try_now_seconds, ActiveState, AllocError, ClassId, Datagram,
        DatagramError, DatagramIterator, DcClass, DcClassDef, DcError, DcField, DcFieldDef,
        DcKeywords, DcParameter, DcSchema, DcSubatomicType, DcValue, DelayDelete,
        DeleteDecision, DistributedObject, DoId, DoIdAllocator, EntId, Entity, EntityRegistry,
        EntitySpec, Event, FieldId, FuncInterval, HeadlessScene, Interval, IntervalPlayer,
        LerpFunctionInterval, Level, LevelSpec, Messenger, MsgType, ObjectContext, ObjectError,
        ObjectFactory, ParallelInterval, ReleaseOutcome, ReplicationState, SceneGraph,
        SequenceInterval, TaskContext, TaskManager, TaskStep, TimeError, Timer, UnknownMsgType,
        UpdateOutbox, WaitInterval, ZoneAllocator, ZoneId, UBER_ZONE,
    };
}

mod error;
mod events;
mod repository;
mod server_config;

pub use error::StrixServerError;
pub use events::{ServerEvent, ServerEvents};
pub use repository::ServerRepository;
pub use server_config::ServerConfig;
