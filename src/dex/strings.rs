use serde::Serialize;

use crate::dex::diagnostics::{Diagnostic, Recorder, Table};
use crate::dex::error::{DexError, ResolveError};
use crate::dex::header::Header;
use crate::dex::reader::ByteReader;

/// One `string_id_item` with its decoded `string_data_item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringId
{
    pub string_data_off: u32,
    /// Length in UTF-16 code units, as stored in the data item.
    pub utf16_size: u32,
    pub value: String,
}

/// Finds the end of a modified UTF-8 body holding `units` UTF-16 code units.
///
/// Stops early at a NUL byte or the end of `bytes`.
fn mutf8_extent(bytes: &[u8], units: u32) -> usize
{
    let mut ix = 0;
    let mut remaining = units;
    while remaining > 0 {
        let (width, count) = match bytes.get(ix).copied() {
            None | Some(0) => break,
            Some(b) if b & 0x80 == 0 => (1, 1),
            Some(b) if b & 0xE0 == 0xC0 => (2, 1),
            Some(b) if b & 0xF0 == 0xE0 => (3, 1),
            // Plain UTF-8 supplementary character: a surrogate pair's worth of units.
            Some(b) if b & 0xF8 == 0xF0 => (4, 2),
            // Not a valid lead byte; take it alone and let decoding replace it.
            Some(_) => (1, 1),
        };
        ix = (ix + width).min(bytes.len());
        remaining = remaining.saturating_sub(count);
    }
    ix
}

/// Decodes modified UTF-8, falling back to replacement characters for invalid input.
pub(crate) fn decode_mutf8(bytes: &[u8]) -> String
{
    match cesu8::from_java_cesu8(bytes) {
        Ok(s) => s.into_owned(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Reads the `string_data_item` at `offset`.
pub fn read_string_data(r: &ByteReader<'_>, offset: usize) -> Result<(u32, String), DexError>
{
    let (utf16_size, len_bytes) = r.read_uleb128(offset)?;
    let start = offset + len_bytes;
    let rest = r.read_bytes(start, r.len().saturating_sub(start))?;
    let body = &rest[..mutf8_extent(rest, utf16_size)];
    Ok((utf16_size, decode_mutf8(body)))
}

/// Builds the string pool in string-id order.
///
/// A string whose data cannot be read is left empty; the rest of the pool still resolves.
pub(crate) fn resolve_strings(
    r: &ByteReader<'_>,
    header: &Header,
    diags: &mut Vec<Diagnostic>,
) -> Result<Vec<StringId>, DexError>
{
    let section = header.string_ids;
    r.check_table(section.off, section.size, 4)
        .map_err(|e| DexError::with_context(e, "string_ids".to_string()))?;

    let mut rec = Recorder::new(Table::Strings, diags);
    let mut strings = Vec::with_capacity(section.size as usize);
    for i in 0..section.size as usize {
        let string_data_off = r.read_u32(section.off as usize + i * 4)?;
        let data = read_string_data(r, string_data_off as usize).map_err(ResolveError::from);
        let (utf16_size, value) = rec.take(i, "string_data", data);
        strings.push(StringId { string_data_off, utf16_size, value });
    }
    Ok(strings)
}
