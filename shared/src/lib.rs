//! # Strix Shared
//! Common functionality shared between strix-server & strix-client crates:
//! the datagram codec, the dclass schema, the distributed object model,
//! allocators, the task scheduler, intervals, the messenger, and the
//! level system.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

mod alloc;
mod datagram;
mod dclass;
mod interval;
mod level;
mod messenger;
mod object;
mod task;
mod time;
mod wire;

pub use alloc::{AllocError, DoId, DoIdAllocator, ZoneAllocator, ZoneId, UBER_ZONE};
pub use datagram::{Datagram, DatagramError, DatagramIterator};
pub use dclass::{
    ClassId, DcClass, DcClassDef, DcError, DcField, DcFieldDef, DcKeywords, DcParameter, DcSchema,
    DcSubatomicType, DcValue, FieldId, SchemaError,
};
pub use interval::{
    FuncInterval, Interval, IntervalPlayer, LerpFunctionInterval, ParallelInterval,
    SequenceInterval, WaitInterval,
};
pub use level::{
    EditMgr, EntId, Entity, EntityRegistry, EntitySpec, Level, LevelMgr, LevelSpec,
    VisibilityExtender, ZoneEntity, EDIT_MGR_ENT_ID, LEVEL_MGR_ENT_ID, UBER_ZONE_ENT_ID,
};
pub use messenger::{Event, Messenger};
pub use object::{
    ActiveState, DelayDelete, DeleteDecision, DistributedObject, HeadlessScene, ObjectContext,
    ObjectError, ObjectFactory, ReleaseOutcome, ReplicationState, SceneGraph, UpdateOutbox,
};
pub use task::{TaskContext, TaskFn, TaskManager, TaskStep};
pub use time::{try_now_seconds, TimeError, Timer};
pub use wire::{begin_message, MsgType, UnknownMsgType};
