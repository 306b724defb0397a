//! Core ISO/IEC 8211 access module.
//!
//! # Module Organization
//!
//! - [`module`]: the open-file context; parses the data descriptive record
//!   (DDR) and drives sequential record reading
//! - [`record`]: one data record's parsed field directory plus its live
//!   byte buffer, including the in-place mutation primitives
//! - [`field`]: a borrowed view of one field occurrence within a record
//! - [`defn`]: shared field definitions and the definition-compiler seam
//! - [`subfield`]: compiled per-subfield format rules and typed extraction
//! - [`leader`]: the fixed 24-byte preamble common to every record
//!
//! # Architecture
//!
//! ```text
//! File Structure:
//! ┌──────────────────────┐
//! │ DDR leader (24 B)    │ ← leader::Leader::parse()
//! │ DDR directory        │ ← DdfModule::open()
//! │ DDR field area       │ ← DefinitionCompiler (external collaborator)
//! ├──────────────────────┤
//! │ DR leader (24 B)     │ ─┐
//! │ DR directory         │  │ DdfRecord::read(), repeated; records with
//! │ DR field area        │  │ leader identifier 'R' reuse the previous
//! ├──────────────────────┤  │ directory and carry only field-area bytes
//! │ ...                  │ ─┘
//! └──────────────────────┘
//! ```

pub mod defn;
pub mod error;
pub mod field;
pub mod leader;
pub mod module;
pub mod record;
pub mod subfield;
mod utils;

pub use defn::{DdfFieldDefn, DefinitionCompiler};
pub use error::{DdfError, Result};
pub use field::DdfField;
pub use leader::Leader;
pub use module::DdfModule;
pub use record::DdfRecord;
pub use subfield::{BinaryKind, BinaryOrder, DataType, DdfSubfieldDefn};

/// Terminator byte closing a directory or a field's data (ISO 8211 `FT`).
pub const FIELD_TERMINATOR: u8 = 0x1e;

/// Terminator byte separating variable-width subfields (ISO 8211 `UT`).
pub const UNIT_TERMINATOR: u8 = 0x1f;

/// Every header and data record starts with a fixed 24-byte leader.
pub(crate) const LEADER_SIZE: usize = 24;
