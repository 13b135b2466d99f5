use bitflags::bitflags;
use serde::Serialize;

use crate::dex::diagnostics::{Diagnostic, Recorder, Table};
use crate::dex::error::{DexError, ResolveError};
use crate::dex::header::Section;
use crate::dex::ids::{string_at, type_at, TypeId, TypeLists, MAX_INTERFACES};
use crate::dex::reader::ByteReader;
use crate::dex::strings::StringId;

pub const CLASS_DEF_SIZE: usize = 32;
pub const NO_INDEX: u32 = 0xffffffff;

bitflags! {
    /// `access_flags` bits shared by classes, fields and methods.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x1;
        const PRIVATE = 0x2;
        const PROTECTED = 0x4;
        const STATIC = 0x8;
        const FINAL = 0x10;
        const SYNCHRONIZED = 0x20;
        const VOLATILE = 0x40;
        const BRIDGE = 0x40;
        const TRANSIENT = 0x80;
        const VARARGS = 0x80;
        const NATIVE = 0x100;
        const INTERFACE = 0x200;
        const ABSTRACT = 0x400;
        const STRICT = 0x800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const CONSTRUCTOR = 0x10000;
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

impl AccessFlags
{
    /// Smali keywords for a class's flags, e.g. `public final`.
    ///
    /// Member-only meanings of shared bits (bridge, varargs) are not rendered.
    pub fn class_keywords(&self) -> String
    {
        const KEYWORDS: [(AccessFlags, &str); 11] = [
            (AccessFlags::PUBLIC, "public"),
            (AccessFlags::PRIVATE, "private"),
            (AccessFlags::PROTECTED, "protected"),
            (AccessFlags::STATIC, "static"),
            (AccessFlags::FINAL, "final"),
            (AccessFlags::INTERFACE, "interface"),
            (AccessFlags::ABSTRACT, "abstract"),
            (AccessFlags::STRICT, "strict"),
            (AccessFlags::SYNTHETIC, "synthetic"),
            (AccessFlags::ANNOTATION, "annotation"),
            (AccessFlags::ENUM, "enum"),
        ];
        KEYWORDS.iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, kw)| *kw)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawClassDef
{
    pub class_idx: u32,
    pub access_flags: u32,
    pub superclass_idx: u32,
    pub interfaces_off: u32,
    pub source_file_idx: u32,
    pub annotations_off: u32,
    pub class_data_off: u32,
    pub static_values_off: u32,
}

impl RawClassDef
{
    pub fn read(r: &ByteReader<'_>, offset: usize) -> Result<RawClassDef, DexError>
    {
        let mut w = [0u32; 8];
        for (i, v) in w.iter_mut().enumerate() {
            *v = r.read_u32(offset + i * 4)?;
        }
        Ok(RawClassDef {
            class_idx: w[0],
            access_flags: w[1],
            superclass_idx: w[2],
            interfaces_off: w[3],
            source_file_idx: w[4],
            annotations_off: w[5],
            class_data_off: w[6],
            static_values_off: w[7],
        })
    }
}

/// A reference that may carry the `NO_INDEX` sentinel.
fn optional(idx: u32) -> Option<u32>
{
    (idx != NO_INDEX).then_some(idx)
}

/// A resolved `class_def_item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDef
{
    pub class_idx: u32,
    pub access_flags: u32,
    /// `None` when the file stores `NO_INDEX` (only `java.lang.Object` has no superclass).
    pub superclass_idx: Option<u32>,
    pub interfaces_off: u32,
    pub source_file_idx: Option<u32>,
    pub annotations_off: u32,
    pub class_data_off: u32,
    pub static_values_off: u32,
    pub class_name: String,
    pub superclass_name: Option<String>,
    pub interfaces: Vec<String>,
    pub source_file: Option<String>,
}

impl ClassDef
{
    pub fn access(&self) -> AccessFlags
    {
        AccessFlags::from_bits_retain(self.access_flags)
    }

    pub fn is_interface(&self) -> bool
    {
        self.access().contains(AccessFlags::INTERFACE)
    }
}

pub(crate) fn resolve_class_defs(
    r: &ByteReader<'_>,
    section: Section,
    strings: &[StringId],
    types: &[TypeId],
    diags: &mut Vec<Diagnostic>,
) -> Result<Vec<ClassDef>, DexError>
{
    r.check_table(section.off, section.size, CLASS_DEF_SIZE)
        .map_err(|e| DexError::with_context(e, "class_defs".to_string()))?;

    let mut rec = Recorder::new(Table::ClassDefs, diags);
    let mut lists = TypeLists::new(r, types, MAX_INTERFACES);
    let mut classes = Vec::with_capacity(section.size as usize);
    for i in 0..section.size as usize {
        let raw = RawClassDef::read(r, section.off as usize + i * CLASS_DEF_SIZE)?;
        let superclass_idx = optional(raw.superclass_idx);
        let source_file_idx = optional(raw.source_file_idx);

        // A failed lookup of a present reference still yields Some(""), unlike the sentinel.
        let superclass_name = superclass_idx
            .map(|idx| rec.take(i, "superclass", type_at(types, idx)));
        let source_file = source_file_idx
            .map(|idx| rec.take(i, "source_file", string_at(strings, idx)));

        classes.push(ClassDef {
            class_idx: raw.class_idx,
            access_flags: raw.access_flags,
            superclass_idx,
            interfaces_off: raw.interfaces_off,
            source_file_idx,
            annotations_off: raw.annotations_off,
            class_data_off: raw.class_data_off,
            static_values_off: raw.static_values_off,
            class_name: rec.take(i, "class", type_at(types, raw.class_idx)),
            superclass_name,
            interfaces: lists.resolve(r, raw.interfaces_off, &mut rec, i, "interfaces"),
            source_file,
        });
    }
    Ok(classes)
}

/// Resolution of a single reference, for callers that want the typed failure.
pub fn resolve_superclass(def: &RawClassDef, types: &[TypeId]) -> Result<Option<String>, ResolveError>
{
    optional(def.superclass_idx).map(|idx| type_at(types, idx)).transpose()
}
