#[macro_use]
pub mod error;

pub(crate) mod leb;
pub mod reader;
pub mod header;
pub mod diagnostics;
pub mod strings;
pub mod ids;
pub mod class_def;
pub mod dex_file;
pub mod summary;

pub use class_def::{AccessFlags, ClassDef, NO_INDEX};
pub use dex_file::DexFile;
pub use diagnostics::{Diagnostic, Table};
pub use error::{DexError, DexErrorKind, ResolveError};
pub use header::{validate, DexVersion, Header, Section};
pub use ids::{FieldId, MethodId, ProtoId, TypeId};
pub use reader::ByteReader;
pub use strings::StringId;
pub use summary::Summary;

/// Fetches entry `idx` of an already-resolved table.
pub(crate) fn lookup<T>(table: &[T], idx: u32) -> Result<&T, ResolveError>
{
    table.get(idx as usize)
        .ok_or(ResolveError::IndexOutOfRange { index: idx, len: table.len() })
}
