use std::collections::HashMap;

use log::warn;
use thiserror::Error;

use super::class::{ClassId, DcClass, DcClassDef};
use super::field::{DcField, DcFieldDef, FieldId};

/// Errors from the non-panicking schema mutation surface
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Mutation was attempted after the schema was locked
    #[error("schema is already locked")]
    AlreadyLocked,
    /// The u16 field id space was exhausted
    #[error("no field ids remain")]
    FieldIdsExhausted,
}

/// The class registry: name and id lookup for classes, schema-wide field id
/// lookup for updates arriving off the wire.
///
/// Build one at startup, `lock()` it, then share it read-only; field and
/// class ids never change while the schema lives. Mutation after lock is a
/// programmer error and panics; `try_*` variants return errors instead.
#[derive(Debug, Default)]
pub struct DcSchema {
    classes: Vec<DcClass>,
    names: HashMap<String, ClassId>,
    field_index: HashMap<FieldId, ClassId>,
    next_field_id: FieldId,
    locked: bool,
}

impl DcSchema {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Registers a class. Registering a name twice logs a warning and
    /// replaces the old definition; the class keeps its id, the fields get
    /// fresh ids.
    pub fn add_class(&mut self, def: DcClassDef) -> &mut Self {
        self.check_lock();
        self.try_add_class(def)
            .expect("field id space exhausted while adding class");
        self
    }

    pub fn try_add_class(&mut self, def: DcClassDef) -> Result<ClassId, SchemaError> {
        self.try_check_lock()?;
        let remaining = (FieldId::MAX - self.next_field_id) as usize;
        if def.fields.len() > remaining {
            return Err(SchemaError::FieldIdsExhausted);
        }

        let class_id = match self.names.get(&def.name) {
            Some(&existing) => {
                warn!(
                    "dclass `{}` registered twice, replacing previous definition",
                    def.name
                );
                for field in self.classes[existing as usize].fields() {
                    self.field_index.remove(&field.id());
                }
                existing
            }
            None => self.classes.len() as ClassId,
        };

        let fields = self.stamp_fields(def.fields, class_id);
        let class = DcClass::new(def.name.clone(), class_id, fields);
        if (class_id as usize) < self.classes.len() {
            self.classes[class_id as usize] = class;
        } else {
            self.classes.push(class);
            self.names.insert(def.name, class_id);
        }
        Ok(class_id)
    }

    fn stamp_fields(&mut self, defs: Vec<DcFieldDef>, class_id: ClassId) -> Vec<DcField> {
        defs.into_iter()
            .map(|def| {
                let id = self.next_field_id;
                self.next_field_id += 1;
                self.field_index.insert(id, class_id);
                DcField::from_def(def, id)
            })
            .collect()
    }

    pub fn try_lock(&mut self) -> Result<(), SchemaError> {
        self.try_check_lock()?;
        self.locked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    /// Checks the schema is still mutable without panicking.
    pub fn try_check_lock(&self) -> Result<(), SchemaError> {
        if self.locked {
            Err(SchemaError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Checks the schema is still mutable, panics otherwise.
    pub fn check_lock(&self) {
        if self.locked {
            panic!("schema already locked!");
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Asserts the schema has been locked; repositories call this once at
    /// construction so a mutable schema never reaches the wire.
    pub fn require_lock(&self) {
        if !self.locked {
            panic!("schema must be locked before use!");
        }
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn class_by_id(&self, id: ClassId) -> Option<&DcClass> {
        self.classes.get(id as usize)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&DcClass> {
        self.names.get(name).map(|&id| &self.classes[id as usize])
    }

    /// Schema-wide field lookup; field ids are unique across classes.
    pub fn field_by_id(&self, id: FieldId) -> Option<(&DcClass, &DcField)> {
        let &class_id = self.field_index.get(&id)?;
        let class = &self.classes[class_id as usize];
        let field = class.fields().iter().find(|f| f.id() == id)?;
        Some((class, field))
    }
}
