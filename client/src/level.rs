use std::any::Any;
use std::rc::Rc;

use log::{debug, warn};

use strix_shared::{
    ClassId, DcField, DcValue, DistributedObject, DoId, EntityRegistry, Level, LevelSpec,
    ObjectContext, ObjectError, ReplicationState, ZoneId,
};

/// A replicated level: a distributed object whose announce builds a
/// [`Level`] from a local spec, and whose `setZoneIds` required field maps
/// the level's zone entities onto network zones.
///
/// Interest is driven by the application, not the object: move the avatar
/// with [`set_current_zone`](Self::set_current_zone), forward door-style
/// messenger events through [`handle_event`](Self::handle_event), then ask
/// [`take_interest_change`](Self::take_interest_change) each tick and pass
/// any change to `ClientRepository::set_interest`.
pub struct DistributedLevel {
    repl: ReplicationState,
    level: Level,
    spec: LevelSpec,
    registry: Rc<EntityRegistry>,
    zone_ids: Vec<ZoneId>,
    curr_zone_num: Option<ZoneId>,
    dirty: bool,
}

impl DistributedLevel {
    pub fn new(
        do_id: DoId,
        class_id: ClassId,
        zone: ZoneId,
        name: &str,
        spec: LevelSpec,
        registry: Rc<EntityRegistry>,
    ) -> Self {
        Self {
            repl: ReplicationState::new(do_id, class_id, zone),
            level: Level::new(name),
            spec,
            registry,
            zone_ids: Vec::new(),
            curr_zone_num: None,
            dirty: false,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    /// The network zone behind a level zone number. Zone numbers pair with
    /// the delivered zone ids in ascending order.
    pub fn network_zone(&self, zone_num: ZoneId) -> Option<ZoneId> {
        let nums = self.level.zone_nums();
        let index = nums.iter().position(|&z| z == zone_num)?;
        self.zone_ids.get(index).copied()
    }

    pub fn current_zone(&self) -> Option<ZoneId> {
        self.curr_zone_num
    }

    /// Moves the avatar to a level zone. The next
    /// [`take_interest_change`](Self::take_interest_change) reflects it.
    pub fn set_current_zone(&mut self, zone_num: ZoneId) {
        if self.curr_zone_num != Some(zone_num) {
            self.curr_zone_num = Some(zone_num);
            self.dirty = true;
        }
    }

    /// Forwards one messenger event to the level's visibility extenders.
    pub fn handle_event(&mut self, name: &str, args: &[DcValue]) {
        if self.level.handle_event(name, args) {
            self.dirty = true;
        }
    }

    /// The interest change to send, if visibility moved since the last
    /// call: the current zone's network zone plus the network zones
    /// visible from it.
    pub fn take_interest_change(&mut self) -> Option<(ZoneId, Vec<ZoneId>)> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        let zone_num = self.curr_zone_num?;
        let Some(primary) = self.network_zone(zone_num) else {
            warn!(
                "level `{}`: zone {zone_num} has no network zone",
                self.level.name()
            );
            return None;
        };
        let extras: Vec<ZoneId> = self
            .level
            .visible_zones_from(zone_num)
            .into_iter()
            .filter(|&z| z != zone_num)
            .filter_map(|z| self.network_zone(z))
            .collect();
        Some((primary, extras))
    }
}

impl DistributedObject for DistributedLevel {
    fn repl(&self) -> &ReplicationState {
        &self.repl
    }

    fn repl_mut(&mut self) -> &mut ReplicationState {
        &mut self.repl
    }

    fn announce_generate(&mut self, ctx: &mut ObjectContext<'_>) {
        self.level
            .initialize(self.spec.clone(), &self.registry, ctx.scene, ctx.messenger);
        let zone_count = self.level.zone_nums().len();
        if zone_count != self.zone_ids.len() {
            warn!(
                "level `{}`: {zone_count} zone entities but {} network zones delivered",
                self.level.name(),
                self.zone_ids.len()
            );
        }
        self.dirty = true;
    }

    fn disable(&mut self, ctx: &mut ObjectContext<'_>) {
        if self.level.is_initialized() {
            self.level.destroy(ctx.scene);
        }
        self.curr_zone_num = None;
        self.dirty = false;
    }

    fn delete(&mut self, ctx: &mut ObjectContext<'_>) {
        if self.level.is_initialized() {
            self.level.destroy(ctx.scene);
        }
    }

    fn receive_field(
        &mut self,
        field: &DcField,
        args: &[DcValue],
        _ctx: &mut ObjectContext<'_>,
    ) -> Result<(), ObjectError> {
        match field.name() {
            "setZoneIds" => {
                let Some(items) = args.first().and_then(|v| v.as_list()) else {
                    return Err(ObjectError::UnknownField {
                        class: "DistributedLevel".to_string(),
                        name: field.name().to_string(),
                    });
                };
                self.zone_ids = items.iter().filter_map(|v| v.as_u32()).collect();
                Ok(())
            }
            other => {
                // Level dclasses carry more than this object models.
                debug!("level `{}` ignores field `{other}`", self.level.name());
                Ok(())
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
