use std::any::Any;

use log::warn;

use crate::alloc::ZoneId;
use crate::dclass::DcValue;

use super::entity::Entity;
use super::spec::{EntId, EntitySpec};

/// Extends its parent zone's visibility with extra zones while a switch is
/// on: a door opening makes the room beyond visible, closing hides it.
///
/// The switch is driven by messenger events named by the `event` attrib,
/// carrying a bool argument. `set_extended` is idempotent so repeated
/// events are harmless; the direct `extend`/`retract` calls assert the
/// flag in debug builds.
pub struct VisibilityExtender {
    ent_id: EntId,
    parent_zone: Option<EntId>,
    event_name: String,
    new_zones: Vec<ZoneId>,
    extended: bool,
}

impl VisibilityExtender {
    pub fn new(ent_id: EntId, spec: &EntitySpec) -> Self {
        let event_name = spec
            .get_attrib("event")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| {
                warn!("visibilityExtender {ent_id}: missing `event` attrib");
                ""
            })
            .to_string();
        let new_zones = match spec.get_attrib("newZones") {
            Some(DcValue::List(zones)) => zones.iter().filter_map(|z| z.as_u32()).collect(),
            _ => Vec::new(),
        };
        Self {
            ent_id,
            parent_zone: spec.parent,
            event_name,
            new_zones,
            extended: false,
        }
    }

    pub fn parent_zone(&self) -> Option<EntId> {
        self.parent_zone
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn new_zones(&self) -> &[ZoneId] {
        &self.new_zones
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Idempotent switch. Returns true when the state actually changed
    /// and the zone counts need adjusting.
    pub fn set_extended(&mut self, extended: bool) -> bool {
        if self.extended == extended {
            return false;
        }
        if extended {
            self.extend()
        } else {
            self.retract()
        }
        true
    }

    pub fn extend(&mut self) {
        debug_assert!(!self.extended, "extend while already extended");
        self.extended = true;
    }

    pub fn retract(&mut self) {
        debug_assert!(self.extended, "retract while not extended");
        self.extended = false;
    }
}

impl Entity for VisibilityExtender {
    fn ent_id(&self) -> EntId {
        self.ent_id
    }

    fn ent_type(&self) -> &str {
        "visibilityExtender"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
