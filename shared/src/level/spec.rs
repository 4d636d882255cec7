use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::dclass::DcValue;

pub type EntId = u32;

/// The level manager entity every level carries.
pub const LEVEL_MGR_ENT_ID: EntId = 1000;
/// The edit manager entity, present for in-place spec editing.
pub const EDIT_MGR_ENT_ID: EntId = 1001;
/// The entity id mirroring the always-visible UberZone.
pub const UBER_ZONE_ENT_ID: EntId = 0;

/// Declarative description of one entity: its type name, optional parent
/// entity, and free-form attributes the constructor reads.
#[derive(Debug, Clone)]
pub struct EntitySpec {
    pub ent_type: String,
    pub parent: Option<EntId>,
    pub attribs: HashMap<String, DcValue>,
}

impl EntitySpec {
    pub fn new(ent_type: &str) -> Self {
        Self {
            ent_type: ent_type.to_string(),
            parent: None,
            attribs: HashMap::new(),
        }
    }

    pub fn parent(mut self, ent_id: EntId) -> Self {
        self.parent = Some(ent_id);
        self
    }

    pub fn attrib(mut self, name: &str, value: DcValue) -> Self {
        self.attribs.insert(name.to_string(), value);
        self
    }

    pub fn get_attrib(&self, name: &str) -> Option<&DcValue> {
        self.attribs.get(name)
    }
}

/// The declarative model a level is built from: entity ids mapped to
/// their specs. Iteration order is ascending ent_id, which the level's
/// creation phases rely on.
#[derive(Debug, Clone, Default)]
pub struct LevelSpec {
    entities: BTreeMap<EntId, EntitySpec>,
}

impl LevelSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, ent_id: EntId, spec: EntitySpec) -> Self {
        self.insert(ent_id, spec);
        self
    }

    pub fn insert(&mut self, ent_id: EntId, spec: EntitySpec) {
        self.entities.insert(ent_id, spec);
    }

    pub fn entity(&self, ent_id: EntId) -> Option<&EntitySpec> {
        self.entities.get(&ent_id)
    }

    /// All entities in ascending ent_id order.
    pub fn entities(&self) -> impl Iterator<Item = (EntId, &EntitySpec)> {
        self.entities.iter().map(|(&id, spec)| (id, spec))
    }

    /// Ids of entities of one type, ascending.
    pub fn ent_ids_of_type(&self, ent_type: &str) -> Vec<EntId> {
        self.entities
            .iter()
            .filter(|(_, spec)| spec.ent_type == ent_type)
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
