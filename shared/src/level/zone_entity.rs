use std::any::Any;
use std::collections::HashMap;

use log::warn;

use crate::alloc::{ZoneId, UBER_ZONE};
use crate::dclass::DcValue;

use super::entity::Entity;
use super::spec::{EntId, EntitySpec};

/// A zone inside a level: the entity id doubles as the zone number.
///
/// Other zones visible from here carry a reference count. The baseline
/// visibility list from the entity spec counts as one reference per zone;
/// visibility extenders add and remove further references. A zone is
/// visible while its count is positive.
///
/// The UberZone is never listed here: it is visible from everywhere and
/// handled by the interest layer, not per-zone bookkeeping.
pub struct ZoneEntity {
    ent_id: EntId,
    visible: HashMap<ZoneId, u32>,
}

impl ZoneEntity {
    pub fn new(ent_id: EntId, spec: &EntitySpec) -> Self {
        let mut visible = HashMap::new();
        if let Some(DcValue::List(zones)) = spec.get_attrib("visibility") {
            for zone in zones {
                match zone.as_u32() {
                    Some(UBER_ZONE) => {
                        warn!("zone {ent_id}: UberZone listed in visibility, ignoring")
                    }
                    Some(z) => {
                        *visible.entry(z).or_insert(0) += 1;
                    }
                    None => warn!("zone {ent_id}: non-integer visibility entry, ignoring"),
                }
            }
        }
        Self { ent_id, visible }
    }

    pub fn zone_num(&self) -> ZoneId {
        self.ent_id
    }

    /// Zones currently visible from here, ascending, not including this
    /// zone itself or the UberZone.
    pub fn visible_zone_nums(&self) -> Vec<ZoneId> {
        let mut zones: Vec<_> = self
            .visible
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&zone, _)| zone)
            .collect();
        zones.sort_unstable();
        zones
    }

    pub fn visibility_count(&self, zone: ZoneId) -> u32 {
        self.visible.get(&zone).copied().unwrap_or(0)
    }

    /// Adds one reference to `zone`'s visibility from here. Returns true
    /// if the zone just became visible.
    pub fn increment_visibility(&mut self, zone: ZoneId) -> bool {
        debug_assert_ne!(zone, UBER_ZONE, "UberZone visibility is implicit");
        let count = self.visible.entry(zone).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Drops one reference. Returns true if the zone just became hidden.
    /// Counts never go negative; the debug build asserts, release logs
    /// and ignores.
    pub fn decrement_visibility(&mut self, zone: ZoneId) -> bool {
        match self.visible.get_mut(&zone) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.visible.remove(&zone);
                    true
                } else {
                    false
                }
            }
            _ => {
                debug_assert!(false, "zone {} visibility count underflow", zone);
                warn!(
                    "zone {}: decrement of zone {zone} with no visibility references",
                    self.ent_id
                );
                false
            }
        }
    }
}

impl Entity for ZoneEntity {
    fn ent_id(&self) -> EntId {
        self.ent_id
    }

    fn ent_type(&self) -> &str {
        "zone"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
