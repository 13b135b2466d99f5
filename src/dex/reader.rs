use crate::dex::error::{DexError, DexErrorKind};
use crate::dex::leb::decode_uleb128;

/// Bounds-checked little-endian view over a DEX image.
///
/// Every read takes an absolute offset and never panics: running past the end of
/// the buffer is reported as [`DexErrorKind::OutOfBounds`].
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a>
{
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a>
{
    pub fn new(bytes: &'a [u8]) -> Self
    {
        ByteReader { bytes }
    }

    pub fn len(&self) -> usize
    {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.bytes.is_empty()
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&'a [u8], DexError>
    {
        match offset.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(&self.bytes[offset..end]),
            _ => Err(err!(
                OutOfBounds,
                "read of {} bytes at {:#x} past end of buffer ({:#x})",
                len, offset, self.bytes.len()
            )),
        }
    }

    fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], DexError>
    {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(offset, N)?);
        Ok(out)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, DexError>
    {
        Ok(self.read_array::<1>(offset)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, DexError>
    {
        Ok(u16::from_le_bytes(self.read_array(offset)?))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32, DexError>
    {
        Ok(u32::from_le_bytes(self.read_array(offset)?))
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64, DexError>
    {
        Ok(u64::from_le_bytes(self.read_array(offset)?))
    }

    /// Returns the decoded value and how many bytes it occupied.
    pub fn read_uleb128(&self, offset: usize) -> Result<(u32, usize), DexError>
    {
        if offset >= self.bytes.len() {
            fail!(OutOfBounds, "uleb128 at {:#x} past end of buffer ({:#x})", offset, self.bytes.len());
        }
        decode_uleb128(&self.bytes[offset..])
            .map_err(|e| DexError::with_context(e, format!("uleb128 at {:#x}", offset)))
    }

    /// Reads a `type_list`: a u32 count followed by that many u16 type indices.
    pub fn read_type_list(&self, offset: usize) -> Result<Vec<u16>, DexError>
    {
        let size = self.read_u32(offset)? as usize;
        let body = offset + 4;
        // Validate the whole list before allocating for it.
        let raw = match size.checked_mul(2) {
            Some(n) => self.read_bytes(body, n)?,
            None => fail!(OutOfBounds, "type_list at {:#x} claims {} entries", offset, size),
        };
        Ok(raw.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect())
    }

    /// Checks that `count` records of `stride` bytes starting at `offset` fit in the buffer.
    pub(crate) fn check_table(&self, offset: u32, count: u32, stride: usize) -> Result<(), DexError>
    {
        // An empty table reads nothing, wherever its offset points.
        if count == 0 {
            return Ok(());
        }
        match (count as usize).checked_mul(stride) {
            Some(len) => self.read_bytes(offset as usize, len).map(|_| ()),
            None => fail!(OutOfBounds, "table at {:#x} with {} entries overflows", offset, count),
        }
    }
}
