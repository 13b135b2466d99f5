//! # dexview
//!
//! A library for reading the identifier tables of Android DEX files
//!
//! The whole file is read from memory in one pass. Header problems abort the parse;
//! a corrupt table entry is left blank and reported through
//! [`DexFile::diagnostics`](dex::DexFile::diagnostics) so the rest of the file stays usable.
//!
//! # Examples
//!
//! ```no_run
//!  use dexview::dex::DexFile;
//!  use std::path::Path;
//!
//!  let dex = DexFile::from_file(Path::new("classes.dex")).unwrap();
//!  println!("{}", dex.summary());
//!  for name in dex.class_names() {
//!      println!("{}", name);
//!  }
//! ```

pub mod dex;
#[cfg(test)]
mod tests;

pub use dex::{DexError, DexFile};
