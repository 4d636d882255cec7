//! # Strix Client
//! A client that connects to a strix server, builds and maintains the
//! distributed objects replicated into its interest, and sends field
//! updates, interest changes, and creates of its own.

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
        DeleteDecision, DistributedObject, DoId, EntId, Entity, EntityRegistry, EntitySpec,
        Event, FieldId, FuncInterval, HeadlessScene, Interval, IntervalPlayer,
        LerpFunctionInterval, Level, LevelSpec, Messenger, MsgType, ObjectContext, ObjectError,
        ObjectFactory, ParallelInterval, ReleaseOutcome, ReplicationState, SceneGraph,
        SequenceInterval, TaskContext, TaskManager, TaskStep, TimeError, Timer, UnknownMsgType,
        UpdateOutbox, WaitInterval, ZoneId, UBER_ZONE,
    };
}

mod client_config;
mod error;
mod events;
mod level;
mod repository;

pub use client_config::{ClientConfig, UnknownUpdatePolicy};
pub use error::StrixClientError;
pub use events::{ClientEvent, ClientEvents};
pub use level::DistributedLevel;
pub use repository::ClientRepository;
