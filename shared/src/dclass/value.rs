/// A runtime field argument, one variant per subatomic scalar plus `List`
/// for array parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum DcValue {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float64(f64),
    Str(String),
    Blob(Vec<u8>),
    List(Vec<DcValue>),
}

impl DcValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int8(_) => "int8",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Uint8(_) => "uint8",
            Self::Uint16(_) => "uint16",
            Self::Uint32(_) => "uint32",
            Self::Uint64(_) => "uint64",
            Self::Float64(_) => "float64",
            Self::Str(_) => "string",
            Self::Blob(_) => "blob",
            Self::List(_) => "list",
        }
    }

    /// Widening view of any integer variant.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int8(v) => Some(v as i64),
            Self::Int16(v) => Some(v as i64),
            Self::Int32(v) => Some(v as i64),
            Self::Int64(v) => Some(v),
            Self::Uint8(v) => Some(v as i64),
            Self::Uint16(v) => Some(v as i64),
            Self::Uint32(v) => Some(v as i64),
            Self::Uint64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DcValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness of a uint8-carried flag.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Uint8(v) => Some(v != 0),
            _ => None,
        }
    }
}

impl From<bool> for DcValue {
    fn from(v: bool) -> Self {
        Self::Uint8(v as u8)
    }
}

impl From<&str> for DcValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}
