//! # iso8211
//!
//! A reader/writer engine for the ISO/IEC 8211 binary record interchange
//! format, the container used by standards such as SDTS (spatial transfer)
//! and S-57 (hydrographic data).
//!
//! The engine parses the file-level descriptive header once, then reads data
//! records sequentially, exposing typed field/subfield values and allowing
//! controlled in-place mutation of parsed records (resize, delete, add,
//! splice raw bytes) while keeping all internal offsets consistent.
pub mod ddf;

// Re-export the main types for convenience
pub use ddf::{
    BinaryKind, BinaryOrder, DataType, DdfError, DdfField, DdfFieldDefn, DdfModule, DdfRecord,
    DdfSubfieldDefn, DefinitionCompiler, Leader, Result, FIELD_TERMINATOR, UNIT_TERMINATOR,
};
