use std::collections::HashMap;

use super::field::{DcField, DcFieldDef};

pub type ClassId = u16;

/// Builder-side class description.
#[derive(Debug, Clone)]
pub struct DcClassDef {
    pub(crate) name: String,
    pub(crate) fields: Vec<DcFieldDef>,
}

impl DcClassDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, def: DcFieldDef) -> Self {
        self.fields.push(def);
        self
    }
}

/// A registered class: named, id-stamped, with its fields in declaration
/// order. The required fields, in that same order, define the body layout
/// of create messages.
#[derive(Debug, Clone)]
pub struct DcClass {
    name: String,
    id: ClassId,
    fields: Vec<DcField>,
    by_name: HashMap<String, usize>,
}

impl DcClass {
    pub(crate) fn new(name: String, id: ClassId, fields: Vec<DcField>) -> Self {
        let by_name = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name().to_string(), i))
            .collect();
        Self {
            name,
            id,
            fields,
            by_name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn fields(&self) -> &[DcField] {
        &self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<&DcField> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Required fields in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &DcField> {
        self.fields.iter().filter(|f| f.is_required())
    }

    pub fn num_required(&self) -> usize {
        self.required_fields().count()
    }
}
