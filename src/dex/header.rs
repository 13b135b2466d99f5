use log::warn;
use serde::Serialize;

use crate::dex::error::{DexError, DexErrorKind};
use crate::dex::reader::ByteReader;

pub const DEX_MAGIC: [u8; 4] = [0x64, 0x65, 0x78, 0x0a];
pub const HEADER_SIZE: usize = 0x70;
pub const ENDIAN_CONSTANT: u32 = 0x12345678;
pub const REVERSE_ENDIAN_CONSTANT: u32 = 0x78563412;

/// DEX format versions this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DexVersion
{
    #[serde(rename = "035")]
    V035,
    #[serde(rename = "037")]
    V037,
    #[serde(rename = "038")]
    V038,
    #[serde(rename = "039")]
    V039,
}

impl DexVersion
{
    pub fn from_tag(tag: &[u8]) -> Option<DexVersion>
    {
        match tag {
            b"035\0" => Some(DexVersion::V035),
            b"037\0" => Some(DexVersion::V037),
            b"038\0" => Some(DexVersion::V038),
            b"039\0" => Some(DexVersion::V039),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str
    {
        match self {
            DexVersion::V035 => "035",
            DexVersion::V037 => "037",
            DexVersion::V038 => "038",
            DexVersion::V039 => "039",
        }
    }

    /// Lowest Android API level that produces this version.
    pub fn api_level(&self) -> u32
    {
        match self {
            DexVersion::V035 => 19,
            DexVersion::V037 => 21,
            DexVersion::V038 => 24,
            DexVersion::V039 => 26,
        }
    }
}

/// A (size, offset) pair naming one section of the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Section
{
    pub size: u32,
    pub off: u32,
}

/// The fixed 112-byte `header_item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: DexVersion,
    pub checksum: u32,
    pub signature: [u8; 20],
    pub file_size: u32,
    pub header_size: u32,
    pub endian_tag: u32,
    pub link: Section,
    pub map_off: u32,
    pub string_ids: Section,
    pub type_ids: Section,
    pub proto_ids: Section,
    pub field_ids: Section,
    pub method_ids: Section,
    pub class_defs: Section,
    pub data: Section,
}

/// Checks length, magic and version without decoding anything else.
pub fn validate(bytes: &[u8]) -> Result<DexVersion, DexError>
{
    if bytes.len() < HEADER_SIZE {
        fail!(TooShort, "Not enough bytes for header: {} < {}", bytes.len(), HEADER_SIZE);
    }
    if bytes[0..4] != DEX_MAGIC {
        fail!(BadMagic, "Invalid magic value {:02x?}", &bytes[0..4]);
    }
    match DexVersion::from_tag(&bytes[4..8]) {
        Some(v) => Ok(v),
        None => fail!(UnsupportedVersion, "Unsupported DEX version {:?}", String::from_utf8_lossy(&bytes[4..8])),
    }
}

impl Header
{
    pub fn decode(bytes: &[u8]) -> Result<Header, DexError>
    {
        let version = validate(bytes)?;
        let r = ByteReader::new(bytes);

        let mut signature = [0u8; 20];
        signature.copy_from_slice(r.read_bytes(12, 20)?);

        // Twenty u32 fields follow the signature in format order.
        let mut words = [0u32; 20];
        for (i, w) in words.iter_mut().enumerate() {
            *w = r.read_u32(32 + i * 4)?;
        }
        let section = |i: usize| Section { size: words[i], off: words[i + 1] };

        let header = Header {
            magic: DEX_MAGIC,
            version,
            checksum: r.read_u32(8)?,
            signature,
            file_size: words[0],
            header_size: words[1],
            endian_tag: words[2],
            link: Section { size: words[3], off: words[4] },
            map_off: words[5],
            string_ids: section(6),
            type_ids: section(8),
            proto_ids: section(10),
            field_ids: section(12),
            method_ids: section(14),
            class_defs: section(16),
            data: section(18),
        };
        header.check_layout(bytes.len());
        Ok(header)
    }

    /// Logs header values that disagree with the buffer. None of these stop the parse.
    fn check_layout(&self, buffer_len: usize)
    {
        match self.endian_tag {
            ENDIAN_CONSTANT => {}
            REVERSE_ENDIAN_CONSTANT => warn!("[header] reverse endian tag; reading as little-endian anyway"),
            tag => warn!("[header] unknown endian tag {:#010x}", tag),
        }
        if self.header_size as usize != HEADER_SIZE {
            warn!("[header] header_size {:#x} (expected {:#x})", self.header_size, HEADER_SIZE);
        }
        if self.file_size as usize > buffer_len {
            warn!("[header] file_size {:#x} exceeds buffer length {:#x}", self.file_size, buffer_len);
        }
    }
}
