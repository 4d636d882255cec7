use std::collections::{HashMap, HashSet};

use log::warn;

use crate::alloc::{DoId, ZoneId};
use crate::dclass::{ClassId, DcClass, FieldId};

/// Where an object is in its lifecycle.
///
/// `Generating` covers the window between `generate` and
/// `announce_generate`, while required fields are still arriving. Disabled
/// objects stay resident and may re-enter `Generating` when their doId
/// reappears in interest. `Deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveState {
    Initial,
    Generating,
    Generated,
    Disabled,
    Deleted,
}

/// A held reference that defers deletion. Release it through the same
/// repository that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayDelete {
    pub do_id: DoId,
    pub(crate) token: u32,
}

/// What a delay-delete release means for the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Other holders remain
    Retained,
    /// Last holder gone, no deletion pending
    Released,
    /// Last holder gone and a deferred delete is due now
    DeleteNow,
}

/// Result of a delete request against the current delay-delete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDecision {
    /// No holders; delete immediately
    DeleteNow,
    /// Holders present; delete when the last one releases
    Deferred,
    /// The object was already deleted; log and ignore
    AlreadyDeleted,
}

/// The replication component every distributed object carries.
///
/// Holds identity, lifecycle state, the required-field gate that fires
/// announce-generate, and the delay-delete ledger. Concrete object types
/// embed one and expose it through the `DistributedObject` trait; the
/// repositories drive all transitions.
#[derive(Debug)]
pub struct ReplicationState {
    do_id: DoId,
    class_id: ClassId,
    zone_id: ZoneId,
    state: ActiveState,
    initialized: bool,
    never_disable: bool,
    pending_required: HashSet<FieldId>,
    announced: bool,
    tokens: HashMap<u32, String>,
    next_token: u32,
    delete_requested: bool,
}

impl ReplicationState {
    pub fn new(do_id: DoId, class_id: ClassId, zone_id: ZoneId) -> Self {
        Self {
            do_id,
            class_id,
            zone_id,
            state: ActiveState::Initial,
            initialized: false,
            never_disable: false,
            pending_required: HashSet::new(),
            announced: false,
            tokens: HashMap::new(),
            next_token: 0,
            delete_requested: false,
        }
    }

    pub fn do_id(&self) -> DoId {
        self.do_id
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn set_zone_id(&mut self, zone: ZoneId) {
        self.zone_id = zone;
    }

    pub fn state(&self) -> ActiveState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.state, ActiveState::Generating | ActiveState::Generated)
    }

    /// Set once the object's one-time wiring has run; regeneration checks
    /// this instead of probing for side effects of the first generate.
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub fn never_disable(&self) -> bool {
        self.never_disable
    }

    pub fn set_never_disable(&mut self, value: bool) {
        self.never_disable = value;
    }

    /// Arms the required-field gate and enters `Generating`. Called for
    /// the first generate and again on every regeneration.
    pub fn begin_generate(&mut self, class: &DcClass) {
        debug_assert_ne!(self.state, ActiveState::Deleted, "generate after delete");
        self.state = ActiveState::Generating;
        self.announced = false;
        self.pending_required = class.required_fields().map(|f| f.id()).collect();
    }

    /// Records a required field arriving, from a create body or a separate
    /// update. Returns true exactly when this arrival completed the set
    /// and announce-generate should fire; repeats of an already-seen field
    /// never re-fire.
    pub fn note_required(&mut self, field: FieldId) -> bool {
        let was_pending = self.pending_required.remove(&field);
        was_pending
            && self.pending_required.is_empty()
            && !self.announced
            && self.state == ActiveState::Generating
    }

    /// Whether every required field has been seen.
    pub fn required_complete(&self) -> bool {
        self.pending_required.is_empty()
    }

    pub fn announced(&self) -> bool {
        self.announced
    }

    pub fn mark_announced(&mut self) {
        debug_assert!(!self.announced, "announce-generate fired twice");
        self.announced = true;
        self.state = ActiveState::Generated;
    }

    pub fn mark_disabled(&mut self) {
        self.state = ActiveState::Disabled;
    }

    pub fn mark_deleted(&mut self) {
        self.state = ActiveState::Deleted;
        self.tokens.clear();
        self.delete_requested = false;
    }

    /// Takes a delay-delete reference. While any are held the object must
    /// not be destroyed.
    pub fn acquire_delay(&mut self, reason: &str) -> DelayDelete {
        let token = self.next_token;
        self.next_token += 1;
        self.tokens.insert(token, reason.to_string());
        DelayDelete {
            do_id: self.do_id,
            token,
        }
    }

    /// Releases a held reference. `DeleteNow` means the caller must run
    /// the deferred delete.
    pub fn release_delay(&mut self, handle: DelayDelete) -> ReleaseOutcome {
        if self.tokens.remove(&handle.token).is_none() {
            warn!(
                "doId {}: released delay-delete token {} which is not held",
                self.do_id, handle.token
            );
            return ReleaseOutcome::Retained;
        }
        if !self.tokens.is_empty() {
            return ReleaseOutcome::Retained;
        }
        if self.delete_requested {
            ReleaseOutcome::DeleteNow
        } else {
            ReleaseOutcome::Released
        }
    }

    pub fn delay_count(&self) -> usize {
        self.tokens.len()
    }

    /// Reasons currently holding the object alive, for diagnostics.
    pub fn delay_reasons(&self) -> impl Iterator<Item = &str> {
        self.tokens.values().map(|s| s.as_str())
    }

    /// Decides how a delete request resolves against held references.
    pub fn request_delete(&mut self) -> DeleteDecision {
        if self.state == ActiveState::Deleted {
            return DeleteDecision::AlreadyDeleted;
        }
        if self.tokens.is_empty() {
            DeleteDecision::DeleteNow
        } else {
            self.delete_requested = true;
            DeleteDecision::Deferred
        }
    }

    pub fn delete_requested(&self) -> bool {
        self.delete_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dclass::{DcClassDef, DcFieldDef, DcSchema, DcSubatomicType};

    fn two_required_schema() -> DcSchema {
        let mut schema = DcSchema::builder();
        schema.add_class(
            DcClassDef::new("Avatar")
                .field(
                    DcFieldDef::new("setPos")
                        .param(DcSubatomicType::Float64)
                        .required(),
                )
                .field(DcFieldDef::new("setName").param(DcSubatomicType::Str).required())
                .field(DcFieldDef::new("setChat").param(DcSubatomicType::Str)),
        );
        schema.build()
    }

    #[test]
    fn announce_gate_completes_on_last_required() {
        let schema = two_required_schema();
        let class = schema.class_by_name("Avatar").unwrap();
        let ids: Vec<_> = class.required_fields().map(|f| f.id()).collect();

        let mut st = ReplicationState::new(100, class.id(), 5);
        st.begin_generate(class);
        assert_eq!(st.state(), ActiveState::Generating);
        assert!(!st.note_required(ids[0]));
        assert!(st.note_required(ids[1]));
        st.mark_announced();
        assert_eq!(st.state(), ActiveState::Generated);
        // A repeated required update after announce does not re-fire.
        assert!(!st.note_required(ids[0]));
    }

    #[test]
    fn non_required_fields_do_not_open_the_gate() {
        let schema = two_required_schema();
        let class = schema.class_by_name("Avatar").unwrap();
        let chat = class.field_by_name("setChat").unwrap().id();

        let mut st = ReplicationState::new(100, class.id(), 5);
        st.begin_generate(class);
        assert!(!st.note_required(chat));
        assert!(!st.required_complete());
    }

    #[test]
    fn regeneration_re_arms_the_gate_but_keeps_initialized() {
        let schema = two_required_schema();
        let class = schema.class_by_name("Avatar").unwrap();
        let ids: Vec<_> = class.required_fields().map(|f| f.id()).collect();

        let mut st = ReplicationState::new(100, class.id(), 5);
        st.begin_generate(class);
        st.mark_initialized();
        for &id in &ids {
            st.note_required(id);
        }
        st.mark_announced();
        st.mark_disabled();
        assert_eq!(st.state(), ActiveState::Disabled);

        st.begin_generate(class);
        assert!(st.initialized());
        assert!(!st.announced());
        assert!(!st.note_required(ids[0]));
        assert!(st.note_required(ids[1]));
    }

    #[test]
    fn delay_delete_defers_until_last_release() {
        let mut st = ReplicationState::new(7, 0, 0);
        let a = st.acquire_delay("camera");
        let b = st.acquire_delay("script");
        assert_eq!(st.delay_count(), 2);

        assert_eq!(st.request_delete(), DeleteDecision::Deferred);
        assert!(st.delete_requested());

        assert_eq!(st.release_delay(a), ReleaseOutcome::Retained);
        assert_eq!(st.release_delay(b), ReleaseOutcome::DeleteNow);
    }

    #[test]
    fn release_without_pending_delete_just_releases() {
        let mut st = ReplicationState::new(7, 0, 0);
        let a = st.acquire_delay("camera");
        assert_eq!(st.release_delay(a), ReleaseOutcome::Released);
    }

    #[test]
    fn unknown_token_release_is_harmless() {
        let mut st = ReplicationState::new(7, 0, 0);
        let a = st.acquire_delay("camera");
        assert_eq!(st.release_delay(a), ReleaseOutcome::Released);
        // Double release of the same handle.
        assert_eq!(st.release_delay(a), ReleaseOutcome::Retained);
    }

    #[test]
    fn delete_with_no_holders_is_immediate() {
        let mut st = ReplicationState::new(7, 0, 0);
        assert_eq!(st.request_delete(), DeleteDecision::DeleteNow);
        st.mark_deleted();
        assert_eq!(st.request_delete(), DeleteDecision::AlreadyDeleted);
    }
}
