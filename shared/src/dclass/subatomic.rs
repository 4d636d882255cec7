/// The primitive wire types a field parameter can declare.
///
/// Scalars occupy a fixed little-endian width. `Str` and `Blob` carry a u16
/// byte-length prefix, `Blob32` a u32 prefix. Array forms carry a u16
/// byte-length prefix followed by packed elements of the nested scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DcSubatomicType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float64,
    Str,
    Blob,
    Blob32,
    Int8Array,
    Int16Array,
    Int32Array,
    Uint8Array,
    Uint16Array,
    Uint32Array,
}

impl DcSubatomicType {
    /// Wire width in bytes for fixed-width scalars, `None` for
    /// length-prefixed types.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Int8 | Self::Uint8 => Some(1),
            Self::Int16 | Self::Uint16 => Some(2),
            Self::Int32 | Self::Uint32 => Some(4),
            Self::Int64 | Self::Uint64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// The scalar type of an array's elements, `None` for non-arrays.
    pub fn array_element(self) -> Option<DcSubatomicType> {
        match self {
            Self::Int8Array => Some(Self::Int8),
            Self::Int16Array => Some(Self::Int16),
            Self::Int32Array => Some(Self::Int32),
            Self::Uint8Array => Some(Self::Uint8),
            Self::Uint16Array => Some(Self::Uint16),
            Self::Uint32Array => Some(Self::Uint32),
            _ => None,
        }
    }

    /// Whether a divisor may be declared on this type.
    pub fn is_numeric(self) -> bool {
        match self {
            Self::Str | Self::Blob | Self::Blob32 => false,
            other => other.array_element().map_or(true, |e| e.is_numeric()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float64 => "float64",
            Self::Str => "string",
            Self::Blob => "blob",
            Self::Blob32 => "blob32",
            Self::Int8Array => "int8array",
            Self::Int16Array => "int16array",
            Self::Int32Array => "int32array",
            Self::Uint8Array => "uint8array",
            Self::Uint16Array => "uint16array",
            Self::Uint32Array => "uint32array",
        }
    }
}
