//! Custom error types for the iso8211 crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// Three families of failures are kept distinct, because callers handle
/// them differently:
/// - I/O failures ([`Io`](DdfError::Io), [`ShortRead`](DdfError::ShortRead))
///   surface the underlying read problem and are never retried internally.
/// - Structural corruption ([`CorruptRecord`](DdfError::CorruptRecord),
///   [`DirectoryOutOfBounds`](DdfError::DirectoryOutOfBounds),
///   [`UndefinedField`](DdfError::UndefinedField)) fails the affected record
///   but leaves the module usable for subsequent reads.
/// - Configuration errors in subfield format definitions (the
///   `Unsupported*` variants) indicate bad field-definition data, not bad
///   record data, and are not recoverable at the record level.
///
/// Missing fields, subfields, or instances are *not* errors: lookups return
/// `Option`/`Ok(None)` since callers routinely probe for optional fields.
#[derive(Debug, Error)]
pub enum DdfError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes were available than the record structure declared.
    #[error("{context} is short: expected {expected} bytes, got {found}")]
    ShortRead {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// A record leader declared sizes outside sane bounds. The usual cause
    /// is a transfer that translated carriage-return/linefeed bytes.
    #[error(
        "record appears to be corrupt (record length {record_length}, field area start \
         {field_area_start}); ensure the file was transferred without newline translation"
    )]
    CorruptRecord {
        record_length: usize,
        field_area_start: usize,
    },

    /// A directory entry points outside the record's field area.
    #[error(
        "directory entry for field `{tag}` is out of bounds: position {position} + length \
         {length} exceeds the {available}-byte field area"
    )]
    DirectoryOutOfBounds {
        tag: String,
        position: usize,
        length: usize,
        available: usize,
    },

    /// A data record's directory references a tag absent from the DDR.
    #[error("undefined field `{0}` encountered in data record")]
    UndefinedField(String),

    /// A subfield format token's kind character is not supported.
    #[error("format token `{0}` is not recognised")]
    UnrecognizedFormat(String),

    /// A binary subfield declared a bit width that is not a whole number
    /// of bytes.
    #[error("bit width {bits} in format token `{token}` is not a multiple of 8")]
    UnsupportedBitWidth { bits: usize, token: String },

    /// A binary subfield declared a sub-kind code outside the supported
    /// table (0 = unsigned int, 1 = signed int, 4 = float real).
    #[error("binary sub-kind `{code}` in format token `{token}` is not supported")]
    UnsupportedBinaryKind { code: char, token: String },

    /// A binary subfield's (sub-kind, byte width) combination has no
    /// defined interpretation.
    #[error("binary subfields of format `{token}` cannot be decoded at width {width}")]
    UnsupportedBinaryWidth { token: String, width: usize },

    /// A binary subfield's declared width exceeds the bytes available in
    /// the span being decoded.
    #[error("subfield of format `{token}` needs {expected} bytes, only {available} available")]
    SubfieldTruncated {
        token: String,
        expected: usize,
        available: usize,
    },

    /// A mutation operation addressed a field index the record does not have.
    #[error("record has no field at index {0}")]
    InvalidFieldIndex(usize),

    /// A mutation operation addressed a repeat instance beyond the valid
    /// range `0..=repeat_count`.
    #[error("instance {instance} is out of range for a field with {repeat_count} instance(s)")]
    InstanceOutOfRange {
        instance: usize,
        repeat_count: usize,
    },

    /// An instance append was attempted on a field whose definition does
    /// not allow repetition.
    #[error("field `{0}` is not repeating; cannot append an instance")]
    NotRepeating(String),
}

/// A convenience `Result` type alias using the crate's `DdfError` type.
pub type Result<T> = std::result::Result<T, DdfError>;
