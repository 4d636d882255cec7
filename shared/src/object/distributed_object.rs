use std::any::Any;

use crate::alloc::DoId;
use crate::dclass::{DcField, DcValue};
use crate::messenger::Messenger;

use super::error::ObjectError;
use super::state::ReplicationState;

/// Minimal scene-side surface an object sees during lifecycle hooks.
/// Render-layer implementations attach real nodes; `HeadlessScene` serves
/// servers and tests.
pub trait SceneGraph {
    fn attach(&mut self, node: &str, parent: &str);
    fn detach(&mut self, node: &str);
}

/// A scene graph that ignores everything.
pub struct HeadlessScene;

impl SceneGraph for HeadlessScene {
    fn attach(&mut self, _node: &str, _parent: &str) {}

    fn detach(&mut self, _node: &str) {}
}

/// Outgoing field updates queued by object code during a hook or field
/// handler. The owning repository drains, packs, and sends them after the
/// dispatch that produced them.
#[derive(Debug, Default)]
pub struct UpdateOutbox {
    queue: Vec<(DoId, String, Vec<DcValue>)>,
}

impl UpdateOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send_update(&mut self, do_id: DoId, field: &str, args: Vec<DcValue>) {
        self.queue.push((do_id, field.to_string(), args));
    }

    pub fn drain(&mut self) -> Vec<(DoId, String, Vec<DcValue>)> {
        std::mem::take(&mut self.queue)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Capabilities handed to object hooks. Everything an object may touch is
/// here, passed by the repository that owns the object; objects hold no
/// references of their own between calls.
pub struct ObjectContext<'a> {
    pub scene: &'a mut dyn SceneGraph,
    pub messenger: &'a mut Messenger,
    pub outbox: &'a mut UpdateOutbox,
    pub now: f64,
}

/// A replicated object. Concrete types embed a [`ReplicationState`] and
/// expose it through `repl`/`repl_mut`; repositories drive the lifecycle
/// and route field updates through `receive_field`.
///
/// Lifecycle order: `generate` (wiring; may run again on regeneration,
/// gate one-time work on `repl().initialized()`), then required fields
/// arrive, then `announce_generate` exactly once when the last required
/// field is in. `disable` detaches but keeps the instance for possible
/// regeneration; `delete` is terminal.
pub trait DistributedObject {
    fn repl(&self) -> &ReplicationState;

    fn repl_mut(&mut self) -> &mut ReplicationState;

    fn generate(&mut self, _ctx: &mut ObjectContext<'_>) {}

    fn announce_generate(&mut self, _ctx: &mut ObjectContext<'_>) {}

    fn disable(&mut self, _ctx: &mut ObjectContext<'_>) {}

    fn delete(&mut self, _ctx: &mut ObjectContext<'_>) {}

    /// Typed dispatch: match on `field.id()` (or name) and apply the
    /// unpacked arguments. Unhandled fields should return
    /// `ObjectError::UnknownField` so the repository can log the drop.
    fn receive_field(
        &mut self,
        field: &DcField,
        args: &[DcValue],
        ctx: &mut ObjectContext<'_>,
    ) -> Result<(), ObjectError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
