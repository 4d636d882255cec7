use std::collections::HashMap;

use crate::alloc::{DoId, ZoneId};
use crate::dclass::ClassId;

use super::distributed_object::DistributedObject;
use super::error::ObjectError;

type Constructor = Box<dyn Fn(DoId, ZoneId) -> Box<dyn DistributedObject>>;

/// Maps class ids to constructors. Populated once at startup, next to
/// schema registration; repositories construct through it when a create
/// arrives for a doId they do not know.
#[derive(Default)]
pub struct ObjectFactory {
    ctors: HashMap<ClassId, Constructor>,
}

impl ObjectFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        class_id: ClassId,
        ctor: impl Fn(DoId, ZoneId) -> Box<dyn DistributedObject> + 'static,
    ) {
        self.ctors.insert(class_id, Box::new(ctor));
    }

    pub fn has_class(&self, class_id: ClassId) -> bool {
        self.ctors.contains_key(&class_id)
    }

    pub fn construct(
        &self,
        class_id: ClassId,
        do_id: DoId,
        zone: ZoneId,
    ) -> Result<Box<dyn DistributedObject>, ObjectError> {
        let ctor = self
            .ctors
            .get(&class_id)
            .ok_or(ObjectError::UnknownClass(class_id))?;
        Ok(ctor(do_id, zone))
    }
}
