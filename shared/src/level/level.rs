use std::collections::{BTreeSet, HashMap};

use log::warn;

use crate::alloc::ZoneId;
use crate::dclass::DcValue;
use crate::messenger::Messenger;
use crate::object::SceneGraph;

use super::entity::{Entity, EntityRegistry};
use super::spec::{EntId, EntitySpec, LevelSpec};
use super::visibility::VisibilityExtender;
use super::zone_entity::ZoneEntity;

/// A live level built from a [`LevelSpec`].
///
/// Creation runs in phases: the level manager first, then the edit
/// manager, then every zone entity, then the rest, each phase in
/// ascending ent_id order. Each creation announces itself on the
/// messenger as `{level}-entity-create-{entId}`. Entities whose parent
/// has not been created yet attach to the scene once the parent appears.
pub struct Level {
    name: String,
    spec: LevelSpec,
    entities: HashMap<EntId, Box<dyn Entity>>,
    created_order: Vec<EntId>,
    pending_children: HashMap<EntId, Vec<EntId>>,
    initialized: bool,
}

impl Level {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            spec: LevelSpec::new(),
            entities: HashMap::new(),
            created_order: Vec::new(),
            pending_children: HashMap::new(),
            initialized: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn spec(&self) -> &LevelSpec {
        &self.spec
    }

    /// The messenger event announcing an entity's creation.
    pub fn entity_create_event(&self, ent_id: EntId) -> String {
        format!("{}-entity-create-{}", self.name, ent_id)
    }

    fn root_node(&self) -> String {
        format!("level-{}", self.name)
    }

    /// Builds every entity the [`LevelSpec`] names. Entities with no
    /// registered constructor are skipped with an error log; the rest
    /// still load.
    pub fn initialize(
        &mut self,
        spec: LevelSpec,
        registry: &EntityRegistry,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
    ) {
        debug_assert!(!self.initialized, "level initialized twice");
        self.spec = spec;

        let mut phases: Vec<Vec<EntId>> = vec![
            self.spec.ent_ids_of_type("levelMgr"),
            self.spec.ent_ids_of_type("editMgr"),
            self.spec.ent_ids_of_type("zone"),
        ];
        let staged: BTreeSet<EntId> = phases.iter().flatten().copied().collect();
        phases.push(
            self.spec
                .entities()
                .map(|(id, _)| id)
                .filter(|id| !staged.contains(id))
                .collect(),
        );
        if phases[0].is_empty() {
            warn!("level `{}` has no levelMgr entity", self.name);
        }

        for ent_id in phases.into_iter().flatten() {
            let Some(ent_spec) = self.spec.entity(ent_id).cloned() else {
                continue;
            };
            self.create_entity(ent_id, &ent_spec, registry, scene, messenger);
        }

        // Parents that never appeared; attach strays at the root so they
        // are not lost.
        for (parent, children) in std::mem::take(&mut self.pending_children) {
            for child in children {
                warn!(
                    "entity {child}: parent {parent} was never created, attaching at level root"
                );
                scene.attach(&node_name(child), &self.root_node());
            }
        }
        self.initialized = true;
    }

    fn create_entity(
        &mut self,
        ent_id: EntId,
        ent_spec: &EntitySpec,
        registry: &EntityRegistry,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
    ) {
        let Some(entity) = registry.construct(ent_id, ent_spec) else {
            return;
        };
        self.entities.insert(ent_id, entity);
        self.created_order.push(ent_id);

        match ent_spec.parent {
            Some(parent) if !self.entities.contains_key(&parent) => {
                self.pending_children.entry(parent).or_default().push(ent_id);
            }
            Some(parent) => scene.attach(&node_name(ent_id), &node_name(parent)),
            None => scene.attach(&node_name(ent_id), &self.root_node()),
        }

        // Children constructed earlier were waiting for this parent.
        if let Some(children) = self.pending_children.remove(&ent_id) {
            for child in children {
                scene.attach(&node_name(child), &node_name(ent_id));
            }
        }

        messenger.send(&self.entity_create_event(ent_id), vec![]);
    }

    pub fn entity(&self, ent_id: EntId) -> Option<&dyn Entity> {
        self.entities.get(&ent_id).map(|e| e.as_ref())
    }

    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn zone_entity(&self, zone: ZoneId) -> Option<&ZoneEntity> {
        self.entity(zone)?.as_any().downcast_ref()
    }

    pub fn zone_entity_mut(&mut self, zone: ZoneId) -> Option<&mut ZoneEntity> {
        self.entities.get_mut(&zone)?.as_any_mut().downcast_mut()
    }

    /// Zone numbers of every zone entity, ascending.
    pub fn zone_nums(&self) -> Vec<ZoneId> {
        let mut zones: Vec<_> = self
            .entities
            .values()
            .filter(|e| e.ent_type() == "zone")
            .map(|e| e.ent_id())
            .collect();
        zones.sort_unstable();
        zones
    }

    /// The zones visible while standing in `zone_num`: the zone itself
    /// plus every zone its reference counts show. The UberZone is not
    /// included; interest always carries it separately.
    pub fn visible_zones_from(&self, zone_num: ZoneId) -> BTreeSet<ZoneId> {
        let mut out = BTreeSet::new();
        out.insert(zone_num);
        match self.zone_entity(zone_num) {
            Some(zone) => out.extend(zone.visible_zone_nums()),
            None => warn!("level `{}`: no zone entity {zone_num}", self.name),
        }
        out
    }

    /// Routes one messenger event to the visibility extenders listening
    /// for it. Returns true if any zone's visibility changed.
    pub fn handle_event(&mut self, name: &str, args: &[DcValue]) -> bool {
        let matching: Vec<EntId> = self
            .entities
            .values()
            .filter_map(|e| e.as_any().downcast_ref::<VisibilityExtender>())
            .filter(|ext| ext.event_name() == name)
            .map(|ext| ext.ent_id())
            .collect();
        if matching.is_empty() {
            return false;
        }
        let Some(desired) = args.first().and_then(|v| v.as_bool()) else {
            warn!("visibility event `{name}` without a bool argument, ignoring");
            return false;
        };

        let mut changed = false;
        for ent_id in matching {
            let Some(ext) = self
                .entities
                .get_mut(&ent_id)
                .and_then(|e| e.as_any_mut().downcast_mut::<VisibilityExtender>())
            else {
                continue;
            };
            if !ext.set_extended(desired) {
                continue;
            }
            let Some(parent) = ext.parent_zone() else {
                warn!("visibilityExtender {ent_id} has no parent zone");
                continue;
            };
            let zones = ext.new_zones().to_vec();
            let Some(zone) = self.zone_entity_mut(parent) else {
                warn!("visibilityExtender {ent_id}: parent {parent} is not a zone");
                continue;
            };
            for z in zones {
                if desired {
                    zone.increment_visibility(z);
                } else {
                    zone.decrement_visibility(z);
                }
            }
            changed = true;
        }
        changed
    }

    /// Tears the level down in reverse creation order.
    pub fn destroy(&mut self, scene: &mut dyn SceneGraph) {
        for ent_id in std::mem::take(&mut self.created_order).into_iter().rev() {
            if let Some(mut entity) = self.entities.remove(&ent_id) {
                entity.destroy();
                scene.detach(&node_name(ent_id));
            }
        }
        self.entities.clear();
        self.initialized = false;
    }
}

fn node_name(ent_id: EntId) -> String {
    format!("ent-{ent_id}")
}
