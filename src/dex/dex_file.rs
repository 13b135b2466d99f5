/* Staged DEX parse: header, strings, types, protos, fields, methods, class defs */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use serde::Serialize;

use crate::dex::class_def::{resolve_class_defs, ClassDef};
use crate::dex::diagnostics::Diagnostic;
use crate::dex::error::{DexError, DexErrorKind};
use crate::dex::header::Header;
use crate::dex::ids::{resolve_fields, resolve_methods, resolve_protos, resolve_types, FieldId, MethodId, ProtoId, TypeId};
use crate::dex::reader::ByteReader;
use crate::dex::strings::{resolve_strings, StringId};

/// First stage: a buffer whose header has been validated and decoded.
pub struct HeaderStage<'a>
{
    reader: ByteReader<'a>,
    header: Header,
}

impl<'a> HeaderStage<'a>
{
    pub fn decode(bytes: &'a [u8]) -> Result<HeaderStage<'a>, DexError>
    {
        let header = Header::decode(bytes)?;
        debug!("[dex] version {} header decoded, {} bytes", header.version.as_str(), bytes.len());
        Ok(HeaderStage { reader: ByteReader::new(bytes), header })
    }

    pub fn header(&self) -> &Header
    {
        &self.header
    }

    pub fn resolve_strings(self) -> Result<StringStage<'a>, DexError>
    {
        let mut diagnostics = vec![];
        let strings = resolve_strings(&self.reader, &self.header, &mut diagnostics)?;
        debug!("[dex] {} strings", strings.len());
        Ok(StringStage { reader: self.reader, header: self.header, diagnostics, strings })
    }
}

pub struct StringStage<'a>
{
    reader: ByteReader<'a>,
    header: Header,
    diagnostics: Vec<Diagnostic>,
    strings: Vec<StringId>,
}

impl<'a> StringStage<'a>
{
    pub fn strings(&self) -> &[StringId]
    {
        &self.strings
    }

    pub fn resolve_types(mut self) -> Result<TypeStage<'a>, DexError>
    {
        let types = resolve_types(&self.reader, self.header.type_ids, &self.strings, &mut self.diagnostics)?;
        debug!("[dex] {} types", types.len());
        Ok(TypeStage { prev: self, types })
    }
}

pub struct TypeStage<'a>
{
    prev: StringStage<'a>,
    types: Vec<TypeId>,
}

impl<'a> TypeStage<'a>
{
    pub fn types(&self) -> &[TypeId]
    {
        &self.types
    }

    pub fn resolve_protos(mut self) -> Result<ProtoStage<'a>, DexError>
    {
        let p = &mut self.prev;
        let protos = resolve_protos(&p.reader, p.header.proto_ids, &p.strings, &self.types, &mut p.diagnostics)?;
        debug!("[dex] {} prototypes", protos.len());
        Ok(ProtoStage { prev: self, protos })
    }
}

pub struct ProtoStage<'a>
{
    prev: TypeStage<'a>,
    protos: Vec<ProtoId>,
}

impl<'a> ProtoStage<'a>
{
    pub fn protos(&self) -> &[ProtoId]
    {
        &self.protos
    }

    pub fn resolve_fields(mut self) -> Result<FieldStage<'a>, DexError>
    {
        let t = &mut self.prev;
        let s = &mut t.prev;
        let fields = resolve_fields(&s.reader, s.header.field_ids, &s.strings, &t.types, &mut s.diagnostics)?;
        debug!("[dex] {} fields", fields.len());
        Ok(FieldStage { prev: self, fields })
    }
}

pub struct FieldStage<'a>
{
    prev: ProtoStage<'a>,
    fields: Vec<FieldId>,
}

impl<'a> FieldStage<'a>
{
    pub fn fields(&self) -> &[FieldId]
    {
        &self.fields
    }

    pub fn resolve_methods(mut self) -> Result<MethodStage<'a>, DexError>
    {
        let p = &mut self.prev;
        let t = &mut p.prev;
        let s = &mut t.prev;
        let methods = resolve_methods(&s.reader, s.header.method_ids, &s.strings, &t.types, &p.protos, &mut s.diagnostics)?;
        debug!("[dex] {} methods", methods.len());
        Ok(MethodStage { prev: self, methods })
    }
}

pub struct MethodStage<'a>
{
    prev: FieldStage<'a>,
    methods: Vec<MethodId>,
}

impl<'a> MethodStage<'a>
{
    pub fn methods(&self) -> &[MethodId]
    {
        &self.methods
    }

    /// Final stage; consumes the pipeline into an owned [`DexFile`].
    pub fn resolve_class_defs(self) -> Result<DexFile, DexError>
    {
        let MethodStage { prev: FieldStage { prev: ProtoStage { prev: TypeStage { prev: s, types }, protos }, fields }, methods } = self;
        let StringStage { reader, header, mut diagnostics, strings } = s;
        let class_defs = resolve_class_defs(&reader, header.class_defs, &strings, &types, &mut diagnostics)?;
        debug!("[dex] {} class defs, {} diagnostics", class_defs.len(), diagnostics.len());
        Ok(DexFile {
            header,
            strings,
            types,
            prototypes: protos,
            fields,
            methods,
            class_defs,
            diagnostics,
            path: None,
        })
    }
}

/// A fully resolved DEX file. Nothing here borrows from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DexFile {
    header: Header,
    strings: Vec<StringId>,
    types: Vec<TypeId>,
    prototypes: Vec<ProtoId>,
    fields: Vec<FieldId>,
    methods: Vec<MethodId>,
    class_defs: Vec<ClassDef>,
    diagnostics: Vec<Diagnostic>,
    path: Option<PathBuf>,
}

fn checkpoint(cancel: Option<&AtomicBool>, next: &str) -> Result<(), DexError>
{
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => fail!(Cancelled, "parse cancelled before {}", next),
        _ => Ok(()),
    }
}

impl DexFile {

    fn read(bytes: &[u8], cancel: Option<&AtomicBool>) -> Result<DexFile, DexError>
    {
        let stage = HeaderStage::decode(bytes)?;
        checkpoint(cancel, "string_ids")?;
        let stage = stage.resolve_strings()?;
        checkpoint(cancel, "type_ids")?;
        let stage = stage.resolve_types()?;
        checkpoint(cancel, "proto_ids")?;
        let stage = stage.resolve_protos()?;
        checkpoint(cancel, "field_ids")?;
        let stage = stage.resolve_fields()?;
        checkpoint(cancel, "method_ids")?;
        let stage = stage.resolve_methods()?;
        checkpoint(cancel, "class_defs")?;
        stage.resolve_class_defs()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<DexFile, DexError>
    {
        DexFile::read(bytes, None)
    }

    /// Like [`DexFile::from_bytes`], but gives up with [`DexErrorKind::Cancelled`] once `cancel`
    /// is set. The flag is only checked between stages.
    pub fn parse_cancellable(bytes: &[u8], cancel: &AtomicBool) -> Result<DexFile, DexError>
    {
        DexFile::read(bytes, Some(cancel))
    }

    pub fn from_file(path: &Path) -> Result<DexFile, DexError>
    {
        let bytes = fs::read(path)
            .map_err(|e| DexError::with_context(e.into(), path.display().to_string()))?;
        let dex = DexFile::from_bytes(&bytes)
            .map_err(|e| DexError::with_context(e, path.display().to_string()))?;
        Ok(DexFile { path: Some(path.to_path_buf()), ..dex })
    }

    pub fn header(&self) -> &Header { &self.header }
    pub fn strings(&self) -> &[StringId] { &self.strings }
    pub fn types(&self) -> &[TypeId] { &self.types }
    pub fn prototypes(&self) -> &[ProtoId] { &self.prototypes }
    pub fn fields(&self) -> &[FieldId] { &self.fields }
    pub fn methods(&self) -> &[MethodId] { &self.methods }
    pub fn class_defs(&self) -> &[ClassDef] { &self.class_defs }

    /// Entries that were left blank because a reference could not be resolved.
    pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }

    /// Where the file was loaded from, if it came from [`DexFile::from_file`].
    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn string_pool(&self) -> Vec<String>
    {
        self.strings.iter().map(|s| s.value.clone()).collect()
    }

    /// Names of all defined classes, skipping any that did not resolve.
    pub fn class_names(&self) -> Vec<&str>
    {
        self.class_defs.iter()
            .map(|c| c.class_name.as_str())
            .filter(|n| !n.is_empty())
            .collect()
    }

    pub fn method_names(&self) -> Vec<&str>
    {
        self.methods.iter()
            .map(|m| m.method_name.as_str())
            .filter(|n| !n.is_empty())
            .collect()
    }

    pub fn find_class(&self, descriptor: &str) -> Option<&ClassDef>
    {
        self.class_defs.iter().find(|c| c.class_name == descriptor)
    }
}
