use std::any::Any;
use std::collections::HashMap;

use log::{debug, error};

use crate::dclass::DcValue;

use super::spec::{EntId, EntitySpec};

/// One live entity inside a level.
pub trait Entity {
    fn ent_id(&self) -> EntId;

    fn ent_type(&self) -> &str;

    /// Applies a late attribute change. Unknown attributes are ignored
    /// with a debug log; the level editor sends plenty an entity does not
    /// model.
    fn set_attrib(&mut self, name: &str, _value: &DcValue) {
        debug!("entity ignores attrib `{name}`");
    }

    fn destroy(&mut self) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

type EntityConstructor = Box<dyn Fn(EntId, &EntitySpec) -> Box<dyn Entity>>;

/// Maps entity type names to constructors.
///
/// An unknown type is not fatal: `construct` logs an error and returns
/// `None`, and the level skips that entity while the rest still load.
#[derive(Default)]
pub struct EntityRegistry {
    ctors: HashMap<String, EntityConstructor>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the entity types every level uses:
    /// `levelMgr`, `editMgr`, `zone`, and `visibilityExtender`.
    pub fn with_builtins() -> Self {
        use super::visibility::VisibilityExtender;
        use super::zone_entity::ZoneEntity;

        let mut registry = Self::new();
        registry.register("levelMgr", |ent_id, _spec| {
            Box::new(LevelMgr { ent_id })
        });
        registry.register("editMgr", |ent_id, _spec| Box::new(EditMgr { ent_id }));
        registry.register("zone", |ent_id, spec| Box::new(ZoneEntity::new(ent_id, spec)));
        registry.register("visibilityExtender", |ent_id, spec| {
            Box::new(VisibilityExtender::new(ent_id, spec))
        });
        registry
    }

    pub fn register(
        &mut self,
        ent_type: &str,
        ctor: impl Fn(EntId, &EntitySpec) -> Box<dyn Entity> + 'static,
    ) {
        self.ctors.insert(ent_type.to_string(), Box::new(ctor));
    }

    pub fn has_type(&self, ent_type: &str) -> bool {
        self.ctors.contains_key(ent_type)
    }

    pub fn construct(&self, ent_id: EntId, spec: &EntitySpec) -> Option<Box<dyn Entity>> {
        match self.ctors.get(&spec.ent_type) {
            Some(ctor) => Some(ctor(ent_id, spec)),
            None => {
                error!(
                    "no constructor for entity type `{}` (entId {ent_id}), skipping",
                    spec.ent_type
                );
                None
            }
        }
    }
}

/// Owns level-wide bookkeeping; always created first.
pub struct LevelMgr {
    ent_id: EntId,
}

impl Entity for LevelMgr {
    fn ent_id(&self) -> EntId {
        self.ent_id
    }

    fn ent_type(&self) -> &str {
        "levelMgr"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Hook point for in-place spec editing; created right after the level
/// manager.
pub struct EditMgr {
    ent_id: EntId,
}

impl Entity for EditMgr {
    fn ent_id(&self) -> EntId {
        self.ent_id
    }

    fn ent_type(&self) -> &str {
        "editMgr"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
