use std::fmt;

use log::warn;
use serde::Serialize;

use crate::dex::error::ResolveError;

/// The identifier table an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Table
{
    Strings,
    Types,
    Protos,
    Fields,
    Methods,
    ClassDefs,
}

impl Table
{
    pub fn as_str(&self) -> &'static str
    {
        match self {
            Table::Strings => "string_ids",
            Table::Types => "type_ids",
            Table::Protos => "proto_ids",
            Table::Fields => "field_ids",
            Table::Methods => "method_ids",
            Table::ClassDefs => "class_defs",
        }
    }
}

/// A table entry field that could not be resolved and was left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic
{
    pub table: Table,
    pub entry: usize,
    pub field: &'static str,
    pub error: ResolveError,
}

impl fmt::Display for Diagnostic
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}[{}].{}: {}", self.table.as_str(), self.entry, self.field, self.error)
    }
}

/// Accumulates per-entry failures while one table is being resolved.
pub(crate) struct Recorder<'d>
{
    table: Table,
    out: &'d mut Vec<Diagnostic>,
}

impl<'d> Recorder<'d>
{
    pub(crate) fn new(table: Table, out: &'d mut Vec<Diagnostic>) -> Self
    {
        Recorder { table, out }
    }

    /// Unwraps a resolved field, or logs and records the failure and yields an empty value.
    pub(crate) fn take<T: Default>(&mut self, entry: usize, field: &'static str, r: Result<T, ResolveError>) -> T
    {
        match r {
            Ok(v) => v,
            Err(error) => {
                let d = Diagnostic { table: self.table, entry, field, error };
                warn!("[resolver] {}", d);
                self.out.push(d);
                T::default()
            }
        }
    }
}
