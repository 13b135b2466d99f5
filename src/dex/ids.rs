/* Type, prototype, field and method identifier tables */

use serde::Serialize;

use crate::dex::diagnostics::{Diagnostic, Recorder, Table};
use crate::dex::error::{DexError, ResolveError};
use crate::dex::header::Section;
use crate::dex::reader::ByteReader;
use crate::dex::strings::StringId;
use crate::dex::lookup;

pub const TYPE_ID_SIZE: usize = 4;
pub const PROTO_ID_SIZE: usize = 12;
pub const FIELD_ID_SIZE: usize = 8;
pub const METHOD_ID_SIZE: usize = 8;

pub(crate) fn string_at(strings: &[StringId], idx: u32) -> Result<String, ResolveError>
{
    lookup(strings, idx).map(|s| s.value.clone())
}

pub(crate) fn type_at(types: &[TypeId], idx: u32) -> Result<String, ResolveError>
{
    lookup(types, idx).map(|t| t.descriptor.clone())
}

fn check(r: &ByteReader<'_>, section: Section, stride: usize, name: &str) -> Result<(), DexError>
{
    r.check_table(section.off, section.size, stride)
        .map_err(|e| DexError::with_context(e, name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTypeId
{
    pub descriptor_idx: u32,
}

impl RawTypeId
{
    pub fn read(r: &ByteReader<'_>, offset: usize) -> Result<RawTypeId, DexError>
    {
        Ok(RawTypeId { descriptor_idx: r.read_u32(offset)? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeId
{
    pub descriptor_idx: u32,
    pub descriptor: String,
}

pub(crate) fn resolve_types(
    r: &ByteReader<'_>,
    section: Section,
    strings: &[StringId],
    diags: &mut Vec<Diagnostic>,
) -> Result<Vec<TypeId>, DexError>
{
    check(r, section, TYPE_ID_SIZE, "type_ids")?;
    let mut rec = Recorder::new(Table::Types, diags);
    let mut types = Vec::with_capacity(section.size as usize);
    for i in 0..section.size as usize {
        let raw = RawTypeId::read(r, section.off as usize + i * TYPE_ID_SIZE)?;
        types.push(TypeId {
            descriptor_idx: raw.descriptor_idx,
            descriptor: rec.take(i, "descriptor", string_at(strings, raw.descriptor_idx)),
        });
    }
    Ok(types)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawProtoId
{
    pub shorty_idx: u32,
    pub return_type_idx: u32,
    pub parameters_off: u32,
}

impl RawProtoId
{
    pub fn read(r: &ByteReader<'_>, offset: usize) -> Result<RawProtoId, DexError>
    {
        Ok(RawProtoId {
            shorty_idx: r.read_u32(offset)?,
            return_type_idx: r.read_u32(offset + 4)?,
            parameters_off: r.read_u32(offset + 8)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtoId
{
    pub shorty_idx: u32,
    pub return_type_idx: u32,
    pub parameters_off: u32,
    pub shorty: String,
    pub return_type: String,
    pub parameters: Vec<String>,
}

impl ProtoId
{
    /// Method descriptor form, e.g. `(Ljava/lang/String;I)V`.
    pub fn descriptor(&self) -> String
    {
        let mut s = String::from("(");
        for p in &self.parameters { s.push_str(p); }
        s.push(')');
        s.push_str(&self.return_type);
        s
    }
}

/// A method takes at most 255 argument registers.
pub const MAX_PARAMETERS: u32 = 255;
/// `interfaces` entries are u16 type indices, so a class cannot name more than this.
pub const MAX_INTERFACES: u32 = u16::MAX as u32;

/// Resolves the `type_list`s referenced by one table.
///
/// Entries may share a list, so besides the per-list `max` the total number of
/// descriptors handed out is budgeted at the size of the buffer.
pub(crate) struct TypeLists<'t>
{
    types: &'t [TypeId],
    max: u32,
    budget: usize,
}

impl<'t> TypeLists<'t>
{
    pub(crate) fn new(r: &ByteReader<'_>, types: &'t [TypeId], max: u32) -> Self
    {
        TypeLists { types, max, budget: r.len() }
    }

    /// Resolves the list at `offset` (0 meaning none) into descriptors.
    ///
    /// Individual out-of-range entries become empty strings and are reported through `rec`.
    pub(crate) fn resolve(
        &mut self,
        r: &ByteReader<'_>,
        offset: u32,
        rec: &mut Recorder<'_>,
        entry: usize,
        field: &'static str,
    ) -> Vec<String>
    {
        if offset == 0 {
            return vec![];
        }
        let limit = self.max.min(u32::try_from(self.budget).unwrap_or(u32::MAX));
        let list = r.read_u32(offset as usize)
            .map_err(ResolveError::from)
            .and_then(|len| match len > limit {
                true => Err(ResolveError::ListTooLong { len, max: limit }),
                false => r.read_type_list(offset as usize).map_err(ResolveError::from),
            });
        let list = rec.take(entry, field, list);
        self.budget -= list.len();
        list.into_iter()
            .map(|idx| rec.take(entry, field, type_at(self.types, idx as u32)))
            .collect()
    }
}

pub(crate) fn resolve_protos(
    r: &ByteReader<'_>,
    section: Section,
    strings: &[StringId],
    types: &[TypeId],
    diags: &mut Vec<Diagnostic>,
) -> Result<Vec<ProtoId>, DexError>
{
    check(r, section, PROTO_ID_SIZE, "proto_ids")?;
    let mut rec = Recorder::new(Table::Protos, diags);
    let mut lists = TypeLists::new(r, types, MAX_PARAMETERS);
    let mut protos = Vec::with_capacity(section.size as usize);
    for i in 0..section.size as usize {
        let raw = RawProtoId::read(r, section.off as usize + i * PROTO_ID_SIZE)?;
        protos.push(ProtoId {
            shorty_idx: raw.shorty_idx,
            return_type_idx: raw.return_type_idx,
            parameters_off: raw.parameters_off,
            shorty: rec.take(i, "shorty", string_at(strings, raw.shorty_idx)),
            return_type: rec.take(i, "return_type", type_at(types, raw.return_type_idx)),
            parameters: lists.resolve(r, raw.parameters_off, &mut rec, i, "parameters"),
        });
    }
    Ok(protos)
}

/// Shared layout of `field_id_item` and `method_id_item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMemberId
{
    pub class_idx: u16,
    /// Type index for fields, prototype index for methods.
    pub type_or_proto_idx: u16,
    pub name_idx: u32,
}

impl RawMemberId
{
    pub fn read(r: &ByteReader<'_>, offset: usize) -> Result<RawMemberId, DexError>
    {
        Ok(RawMemberId {
            class_idx: r.read_u16(offset)?,
            type_or_proto_idx: r.read_u16(offset + 2)?,
            name_idx: r.read_u32(offset + 4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldId
{
    pub class_idx: u16,
    pub type_idx: u16,
    pub name_idx: u32,
    pub class_name: String,
    pub type_name: String,
    pub field_name: String,
}

impl FieldId
{
    /// Smali field reference, e.g. `Lcom/example/Foo;->count:I`.
    pub fn descriptor(&self) -> String
    {
        format!("{}->{}:{}", self.class_name, self.field_name, self.type_name)
    }
}

pub(crate) fn resolve_fields(
    r: &ByteReader<'_>,
    section: Section,
    strings: &[StringId],
    types: &[TypeId],
    diags: &mut Vec<Diagnostic>,
) -> Result<Vec<FieldId>, DexError>
{
    check(r, section, FIELD_ID_SIZE, "field_ids")?;
    let mut rec = Recorder::new(Table::Fields, diags);
    let mut fields = Vec::with_capacity(section.size as usize);
    for i in 0..section.size as usize {
        let raw = RawMemberId::read(r, section.off as usize + i * FIELD_ID_SIZE)?;
        fields.push(FieldId {
            class_idx: raw.class_idx,
            type_idx: raw.type_or_proto_idx,
            name_idx: raw.name_idx,
            class_name: rec.take(i, "class", type_at(types, raw.class_idx as u32)),
            type_name: rec.take(i, "type", type_at(types, raw.type_or_proto_idx as u32)),
            field_name: rec.take(i, "name", string_at(strings, raw.name_idx)),
        });
    }
    Ok(fields)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodId
{
    pub class_idx: u16,
    pub proto_idx: u16,
    pub name_idx: u32,
    pub class_name: String,
    /// Shorty descriptor of the prototype, e.g. `VLI`.
    pub prototype: String,
    /// Full parameter and return descriptor, e.g. `(Ljava/lang/String;I)V`.
    pub signature: String,
    pub method_name: String,
}

impl MethodId
{
    /// Smali method reference, e.g. `Lcom/example/Foo;->run(I)V`.
    pub fn descriptor(&self) -> String
    {
        format!("{}->{}{}", self.class_name, self.method_name, self.signature)
    }
}

pub(crate) fn resolve_methods(
    r: &ByteReader<'_>,
    section: Section,
    strings: &[StringId],
    types: &[TypeId],
    protos: &[ProtoId],
    diags: &mut Vec<Diagnostic>,
) -> Result<Vec<MethodId>, DexError>
{
    check(r, section, METHOD_ID_SIZE, "method_ids")?;
    let mut rec = Recorder::new(Table::Methods, diags);
    let mut methods = Vec::with_capacity(section.size as usize);
    for i in 0..section.size as usize {
        let raw = RawMemberId::read(r, section.off as usize + i * METHOD_ID_SIZE)?;
        let (prototype, signature) = rec.take(
            i,
            "proto",
            lookup(protos, raw.type_or_proto_idx as u32).map(|p| (p.shorty.clone(), p.descriptor())),
        );
        methods.push(MethodId {
            class_idx: raw.class_idx,
            proto_idx: raw.type_or_proto_idx,
            name_idx: raw.name_idx,
            class_name: rec.take(i, "class", type_at(types, raw.class_idx as u32)),
            prototype,
            signature,
            method_name: rec.take(i, "name", string_at(strings, raw.name_idx)),
        });
    }
    Ok(methods)
}
