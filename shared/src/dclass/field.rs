use crate::datagram::{Datagram, DatagramIterator};

use super::error::DcError;
use super::subatomic::DcSubatomicType;
use super::value::DcValue;

pub type FieldId = u16;

/// Keyword flags attached to a field declaration.
///
/// `required` fields form the body of create messages and gate
/// announce-generate. `ram` fields are stored server-side and re-delivered
/// on interest entry. `broadcast` fields are relayed to every interested
/// session. `clsend` fields may be sent by clients that do not own the
/// object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DcKeywords {
    pub required: bool,
    pub broadcast: bool,
    pub ram: bool,
    pub clsend: bool,
}

/// One declared parameter of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DcParameter {
    ptype: DcSubatomicType,
    divisor: u32,
}

impl DcParameter {
    pub fn new(ptype: DcSubatomicType) -> Self {
        Self { ptype, divisor: 1 }
    }

    /// A numeric parameter transported as a fixed-point integer: values are
    /// multiplied by `divisor` before packing and divided after unpacking.
    ///
    /// # Panics
    /// Panics if the type is not numeric or the divisor is zero. Both are
    /// schema-definition mistakes, caught at startup.
    pub fn with_divisor(ptype: DcSubatomicType, divisor: u32) -> Self {
        assert!(
            ptype.is_numeric(),
            "divisor declared on non-numeric type {}",
            ptype.name()
        );
        assert!(divisor > 0, "divisor must be nonzero");
        Self { ptype, divisor }
    }

    pub fn ptype(&self) -> DcSubatomicType {
        self.ptype
    }

    pub fn divisor(&self) -> u32 {
        self.divisor
    }
}

/// Builder-side field description; ids are assigned when the owning class
/// is added to a schema.
#[derive(Debug, Clone)]
pub struct DcFieldDef {
    pub(crate) name: String,
    pub(crate) params: Vec<DcParameter>,
    pub(crate) keywords: DcKeywords,
}

impl DcFieldDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            keywords: DcKeywords::default(),
        }
    }

    pub fn param(mut self, ptype: DcSubatomicType) -> Self {
        self.params.push(DcParameter::new(ptype));
        self
    }

    pub fn param_div(mut self, ptype: DcSubatomicType, divisor: u32) -> Self {
        self.params.push(DcParameter::with_divisor(ptype, divisor));
        self
    }

    pub fn required(mut self) -> Self {
        self.keywords.required = true;
        self
    }

    pub fn broadcast(mut self) -> Self {
        self.keywords.broadcast = true;
        self
    }

    pub fn ram(mut self) -> Self {
        self.keywords.ram = true;
        self
    }

    pub fn clsend(mut self) -> Self {
        self.keywords.clsend = true;
        self
    }
}

/// A field with its schema-assigned id. Ids are stable for the life of the
/// schema and unique schema-wide; updates on the wire name fields by id
/// only.
#[derive(Debug, Clone)]
pub struct DcField {
    name: String,
    id: FieldId,
    params: Vec<DcParameter>,
    keywords: DcKeywords,
}

impl DcField {
    pub(crate) fn from_def(def: DcFieldDef, id: FieldId) -> Self {
        Self {
            name: def.name,
            id,
            params: def.params,
            keywords: def.keywords,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn params(&self) -> &[DcParameter] {
        &self.params
    }

    pub fn keywords(&self) -> DcKeywords {
        self.keywords
    }

    pub fn is_required(&self) -> bool {
        self.keywords.required
    }

    pub fn is_broadcast(&self) -> bool {
        self.keywords.broadcast
    }

    pub fn is_ram(&self) -> bool {
        self.keywords.ram
    }

    pub fn is_clsend(&self) -> bool {
        self.keywords.clsend
    }

    /// Validates arity and per-argument type, then appends the packed
    /// arguments to the datagram. Divisors scale numerics on the way in.
    pub fn pack(&self, values: &[DcValue], dg: &mut Datagram) -> Result<(), DcError> {
        if values.len() != self.params.len() {
            return Err(DcError::ArityMismatch {
                field: self.name.clone(),
                expected: self.params.len(),
                got: values.len(),
            });
        }
        for (index, (param, value)) in self.params.iter().zip(values).enumerate() {
            self.pack_param(index, param, value, dg)?;
        }
        Ok(())
    }

    /// Reads one argument per declared parameter from the iterator.
    pub fn unpack(&self, di: &mut DatagramIterator) -> Result<Vec<DcValue>, DcError> {
        let mut out = Vec::with_capacity(self.params.len());
        for param in &self.params {
            out.push(self.unpack_param(param, di)?);
        }
        Ok(out)
    }

    fn pack_param(
        &self,
        index: usize,
        param: &DcParameter,
        value: &DcValue,
        dg: &mut Datagram,
    ) -> Result<(), DcError> {
        if let Some(elem) = param.ptype().array_element() {
            return self.pack_array(index, elem, param, value, dg);
        }
        match param.ptype() {
            DcSubatomicType::Str => match value {
                DcValue::Str(s) => Ok(dg.add_string(s)?),
                other => Err(self.type_mismatch(index, "string", other)),
            },
            DcSubatomicType::Blob => match value {
                DcValue::Blob(b) => Ok(dg.add_blob(b)?),
                other => Err(self.type_mismatch(index, "blob", other)),
            },
            DcSubatomicType::Blob32 => match value {
                DcValue::Blob(b) => Ok(dg.add_blob32(b)?),
                other => Err(self.type_mismatch(index, "blob32", other)),
            },
            DcSubatomicType::Float64 => match value {
                DcValue::Float64(v) => {
                    dg.add_float64(v * param.divisor() as f64);
                    Ok(())
                }
                other => Err(self.type_mismatch(index, "float64", other)),
            },
            int_ty => self.pack_int(index, int_ty, param.divisor(), value, dg),
        }
    }

    fn pack_array(
        &self,
        index: usize,
        elem: DcSubatomicType,
        param: &DcParameter,
        value: &DcValue,
        dg: &mut Datagram,
    ) -> Result<(), DcError> {
        let items = match value {
            DcValue::List(items) => items,
            other => Err(self.type_mismatch(index, param.ptype().name(), other))?,
        };
        // Elements pack into a scratch datagram so the byte-length prefix
        // can lead them on the wire.
        let mut body = Datagram::new();
        for item in items {
            if elem == DcSubatomicType::Float64 {
                match item {
                    DcValue::Float64(v) => body.add_float64(v * param.divisor() as f64),
                    other => return Err(self.type_mismatch(index, "float64", other)),
                }
            } else {
                self.pack_int(index, elem, param.divisor(), item, &mut body)?;
            }
        }
        dg.add_blob(body.bytes())?;
        Ok(())
    }

    fn pack_int(
        &self,
        index: usize,
        ty: DcSubatomicType,
        divisor: u32,
        value: &DcValue,
        dg: &mut Datagram,
    ) -> Result<(), DcError> {
        let scaled: i128 = if divisor == 1 {
            self.exact_int(index, ty, value)?
        } else {
            match value {
                DcValue::Float64(f) => {
                    if !f.is_finite() {
                        return Err(DcError::NonFinite {
                            field: self.name.clone(),
                            index,
                        });
                    }
                    let scaled = (f * divisor as f64).round();
                    if scaled < i128::MIN as f64 || scaled > i128::MAX as f64 {
                        return Err(DcError::ValueOutOfRange {
                            field: self.name.clone(),
                            index,
                            value: scaled,
                            ty: ty.name(),
                        });
                    }
                    scaled as i128
                }
                other => self.exact_int(index, ty, other)? * divisor as i128,
            }
        };
        let (lo, hi) = int_bounds(ty);
        if scaled < lo || scaled > hi {
            return Err(DcError::ValueOutOfRange {
                field: self.name.clone(),
                index,
                value: scaled as f64,
                ty: ty.name(),
            });
        }
        write_int(dg, ty, scaled);
        Ok(())
    }

    fn exact_int(&self, index: usize, ty: DcSubatomicType, value: &DcValue) -> Result<i128, DcError> {
        let matched = match (ty, value) {
            (DcSubatomicType::Int8, DcValue::Int8(v)) => Some(*v as i128),
            (DcSubatomicType::Int16, DcValue::Int16(v)) => Some(*v as i128),
            (DcSubatomicType::Int32, DcValue::Int32(v)) => Some(*v as i128),
            (DcSubatomicType::Int64, DcValue::Int64(v)) => Some(*v as i128),
            (DcSubatomicType::Uint8, DcValue::Uint8(v)) => Some(*v as i128),
            (DcSubatomicType::Uint16, DcValue::Uint16(v)) => Some(*v as i128),
            (DcSubatomicType::Uint32, DcValue::Uint32(v)) => Some(*v as i128),
            (DcSubatomicType::Uint64, DcValue::Uint64(v)) => Some(*v as i128),
            _ => None,
        };
        matched.ok_or_else(|| self.type_mismatch(index, ty.name(), value))
    }

    fn unpack_param(
        &self,
        param: &DcParameter,
        di: &mut DatagramIterator,
    ) -> Result<DcValue, DcError> {
        if let Some(elem) = param.ptype().array_element() {
            let width = elem.fixed_width().unwrap_or(1);
            let len = di.get_uint16()? as usize;
            if len % width != 0 {
                return Err(DcError::BadArrayLength {
                    field: self.name.clone(),
                    len,
                    width,
                });
            }
            let mut items = Vec::with_capacity(len / width);
            for _ in 0..len / width {
                items.push(unpack_scalar(elem, param.divisor(), di)?);
            }
            return Ok(DcValue::List(items));
        }
        match param.ptype() {
            DcSubatomicType::Str => Ok(DcValue::Str(di.get_string()?)),
            DcSubatomicType::Blob => Ok(DcValue::Blob(di.get_blob()?)),
            DcSubatomicType::Blob32 => Ok(DcValue::Blob(di.get_blob32()?)),
            scalar => unpack_scalar(scalar, param.divisor(), di),
        }
    }

    fn type_mismatch(&self, index: usize, expected: &'static str, got: &DcValue) -> DcError {
        DcError::TypeMismatch {
            field: self.name.clone(),
            index,
            expected,
            got: got.kind(),
        }
    }
}

fn int_bounds(ty: DcSubatomicType) -> (i128, i128) {
    match ty {
        DcSubatomicType::Int8 => (i8::MIN as i128, i8::MAX as i128),
        DcSubatomicType::Int16 => (i16::MIN as i128, i16::MAX as i128),
        DcSubatomicType::Int32 => (i32::MIN as i128, i32::MAX as i128),
        DcSubatomicType::Int64 => (i64::MIN as i128, i64::MAX as i128),
        DcSubatomicType::Uint8 => (0, u8::MAX as i128),
        DcSubatomicType::Uint16 => (0, u16::MAX as i128),
        DcSubatomicType::Uint32 => (0, u32::MAX as i128),
        DcSubatomicType::Uint64 => (0, u64::MAX as i128),
        other => unreachable!("not an integer type: {}", other.name()),
    }
}

fn write_int(dg: &mut Datagram, ty: DcSubatomicType, value: i128) {
    match ty {
        DcSubatomicType::Int8 => dg.add_int8(value as i8),
        DcSubatomicType::Int16 => dg.add_int16(value as i16),
        DcSubatomicType::Int32 => dg.add_int32(value as i32),
        DcSubatomicType::Int64 => dg.add_int64(value as i64),
        DcSubatomicType::Uint8 => dg.add_uint8(value as u8),
        DcSubatomicType::Uint16 => dg.add_uint16(value as u16),
        DcSubatomicType::Uint32 => dg.add_uint32(value as u32),
        DcSubatomicType::Uint64 => dg.add_uint64(value as u64),
        other => unreachable!("not an integer type: {}", other.name()),
    }
}

fn unpack_scalar(
    ty: DcSubatomicType,
    divisor: u32,
    di: &mut DatagramIterator,
) -> Result<DcValue, DcError> {
    if ty == DcSubatomicType::Float64 {
        let raw = di.get_float64()?;
        return Ok(DcValue::Float64(if divisor == 1 {
            raw
        } else {
            raw / divisor as f64
        }));
    }
    let raw: i128 = match ty {
        DcSubatomicType::Int8 => di.get_int8()? as i128,
        DcSubatomicType::Int16 => di.get_int16()? as i128,
        DcSubatomicType::Int32 => di.get_int32()? as i128,
        DcSubatomicType::Int64 => di.get_int64()? as i128,
        DcSubatomicType::Uint8 => di.get_uint8()? as i128,
        DcSubatomicType::Uint16 => di.get_uint16()? as i128,
        DcSubatomicType::Uint32 => di.get_uint32()? as i128,
        DcSubatomicType::Uint64 => di.get_uint64()? as i128,
        other => unreachable!("not a scalar type: {}", other.name()),
    };
    if divisor != 1 {
        return Ok(DcValue::Float64(raw as f64 / divisor as f64));
    }
    Ok(match ty {
        DcSubatomicType::Int8 => DcValue::Int8(raw as i8),
        DcSubatomicType::Int16 => DcValue::Int16(raw as i16),
        DcSubatomicType::Int32 => DcValue::Int32(raw as i32),
        DcSubatomicType::Int64 => DcValue::Int64(raw as i64),
        DcSubatomicType::Uint8 => DcValue::Uint8(raw as u8),
        DcSubatomicType::Uint16 => DcValue::Uint16(raw as u16),
        DcSubatomicType::Uint32 => DcValue::Uint32(raw as u32),
        DcSubatomicType::Uint64 => DcValue::Uint64(raw as u64),
        other => unreachable!("not a scalar type: {}", other.name()),
    })
}
