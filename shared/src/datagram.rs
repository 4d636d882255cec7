use thiserror::Error;

/// Errors produced while writing or reading a datagram
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatagramError {
    /// Read past the end of the datagram
    #[error("datagram truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    /// A length-prefixed payload was too large for its prefix
    #[error("payload of {len} bytes exceeds {limit}-byte length prefix limit")]
    Oversized { len: usize, limit: usize },
    /// String bytes were not valid UTF-8
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}

/// A growable binary buffer with typed append operations.
///
/// All multi-byte integers are encoded little-endian with fixed widths.
/// Strings and blobs carry a u16 byte-length prefix; `add_blob32` uses a
/// u32 prefix for large payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Datagram {
    buf: Vec<u8>,
}

impl Datagram {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn iter(&self) -> DatagramIterator<'_> {
        DatagramIterator::new(&self.buf)
    }

    pub fn add_int8(&mut self, value: i8) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_int16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_int32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_int64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_uint8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn add_uint16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_uint32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_uint64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_float64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a u16 byte-length prefix followed by the UTF-8 bytes.
    pub fn add_string(&mut self, value: &str) -> Result<(), DatagramError> {
        self.add_sized(value.as_bytes())
    }

    /// Appends a u16 byte-length prefix followed by the raw bytes.
    pub fn add_blob(&mut self, value: &[u8]) -> Result<(), DatagramError> {
        self.add_sized(value)
    }

    /// Appends a u32 byte-length prefix followed by the raw bytes.
    pub fn add_blob32(&mut self, value: &[u8]) -> Result<(), DatagramError> {
        if value.len() > u32::MAX as usize {
            return Err(DatagramError::Oversized {
                len: value.len(),
                limit: u32::MAX as usize,
            });
        }
        self.add_uint32(value.len() as u32);
        self.buf.extend_from_slice(value);
        Ok(())
    }

    /// Appends raw bytes with no length prefix.
    pub fn add_data(&mut self, value: &[u8]) {
        self.buf.extend_from_slice(value);
    }

    /// Appends the full contents of another datagram, no prefix.
    pub fn add_datagram(&mut self, other: &Datagram) {
        self.buf.extend_from_slice(&other.buf);
    }

    fn add_sized(&mut self, value: &[u8]) -> Result<(), DatagramError> {
        if value.len() > u16::MAX as usize {
            return Err(DatagramError::Oversized {
                len: value.len(),
                limit: u16::MAX as usize,
            });
        }
        self.add_uint16(value.len() as u16);
        self.buf.extend_from_slice(value);
        Ok(())
    }
}

impl From<Vec<u8>> for Datagram {
    fn from(buf: Vec<u8>) -> Self {
        Self { buf }
    }
}

impl From<&[u8]> for Datagram {
    fn from(bytes: &[u8]) -> Self {
        Self {
            buf: bytes.to_vec(),
        }
    }
}

/// A checked read cursor over a datagram's bytes.
///
/// Every `get_*` verifies the remaining length before reading; undersized
/// input yields `DatagramError::Truncated` rather than a panic.
#[derive(Debug, Clone)]
pub struct DatagramIterator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> DatagramIterator<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Current read offset from the start of the datagram.
    pub fn tell(&self) -> usize {
        self.offset
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DatagramError> {
        self.check(n)?;
        self.offset += n;
        Ok(())
    }

    /// Reads `n` raw bytes with no length prefix.
    pub fn extract_bytes(&mut self, n: usize) -> Result<&'a [u8], DatagramError> {
        self.check(n)?;
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn get_int8(&mut self) -> Result<i8, DatagramError> {
        Ok(i8::from_le_bytes(self.take::<1>()?))
    }

    pub fn get_int16(&mut self) -> Result<i16, DatagramError> {
        Ok(i16::from_le_bytes(self.take::<2>()?))
    }

    pub fn get_int32(&mut self) -> Result<i32, DatagramError> {
        Ok(i32::from_le_bytes(self.take::<4>()?))
    }

    pub fn get_int64(&mut self) -> Result<i64, DatagramError> {
        Ok(i64::from_le_bytes(self.take::<8>()?))
    }

    pub fn get_uint8(&mut self) -> Result<u8, DatagramError> {
        Ok(u8::from_le_bytes(self.take::<1>()?))
    }

    pub fn get_uint16(&mut self) -> Result<u16, DatagramError> {
        Ok(u16::from_le_bytes(self.take::<2>()?))
    }

    pub fn get_uint32(&mut self) -> Result<u32, DatagramError> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    pub fn get_uint64(&mut self) -> Result<u64, DatagramError> {
        Ok(u64::from_le_bytes(self.take::<8>()?))
    }

    pub fn get_float64(&mut self) -> Result<f64, DatagramError> {
        Ok(f64::from_le_bytes(self.take::<8>()?))
    }

    pub fn get_string(&mut self) -> Result<String, DatagramError> {
        let len = self.get_uint16()? as usize;
        let bytes = self.extract_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DatagramError::InvalidUtf8)
    }

    pub fn get_blob(&mut self) -> Result<Vec<u8>, DatagramError> {
        let len = self.get_uint16()? as usize;
        Ok(self.extract_bytes(len)?.to_vec())
    }

    pub fn get_blob32(&mut self) -> Result<Vec<u8>, DatagramError> {
        let len = self.get_uint32()? as usize;
        Ok(self.extract_bytes(len)?.to_vec())
    }

    fn check(&self, needed: usize) -> Result<(), DatagramError> {
        if needed > self.remaining() {
            return Err(DatagramError::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DatagramError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        Ok(out)
    }
}
