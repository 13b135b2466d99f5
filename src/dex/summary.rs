use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::dex::dex_file::DexFile;
use crate::dex::header::DexVersion;

/// Aggregate counts and header metadata for a parsed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary
{
    pub file_path: Option<PathBuf>,
    pub version: DexVersion,
    pub file_size: u32,
    pub checksum: u32,
    pub strings_count: usize,
    pub types_count: usize,
    pub prototypes_count: usize,
    pub fields_count: usize,
    pub methods_count: usize,
    pub classes_count: usize,
    pub diagnostics_count: usize,
}

impl Summary
{
    pub fn of(dex: &DexFile) -> Summary
    {
        let header = dex.header();
        Summary {
            file_path: dex.path().map(|p| p.to_path_buf()),
            version: header.version,
            file_size: header.file_size,
            checksum: header.checksum,
            strings_count: dex.strings().len(),
            types_count: dex.types().len(),
            prototypes_count: dex.prototypes().len(),
            fields_count: dex.fields().len(),
            methods_count: dex.methods().len(),
            classes_count: dex.class_defs().len(),
            diagnostics_count: dex.diagnostics().len(),
        }
    }
}

impl DexFile
{
    pub fn summary(&self) -> Summary
    {
        Summary::of(self)
    }
}

impl fmt::Display for Summary
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if let Some(p) = &self.file_path {
            writeln!(f, "File:       {}", p.display())?;
        }
        writeln!(f, "Version:    {}", self.version.as_str())?;
        writeln!(f, "File size:  {}", self.file_size)?;
        writeln!(f, "Checksum:   {:#010x}", self.checksum)?;
        writeln!(f, "Strings:    {}", self.strings_count)?;
        writeln!(f, "Types:      {}", self.types_count)?;
        writeln!(f, "Prototypes: {}", self.prototypes_count)?;
        writeln!(f, "Fields:     {}", self.fields_count)?;
        writeln!(f, "Methods:    {}", self.methods_count)?;
        write!(f, "Classes:    {}", self.classes_count)?;
        if self.diagnostics_count > 0 {
            write!(f, "\nUnresolved: {}", self.diagnostics_count)?;
        }
        Ok(())
    }
}
