//! Field entries and the borrowed field view.

use std::sync::Arc;

use super::defn::DdfFieldDefn;
use super::subfield::DdfSubfieldDefn;
use super::FIELD_TERMINATOR;

/// One field occurrence in a record's directory: a definition handle plus
/// the byte range it occupies in the record's buffer. Entries are stored
/// in directory order and never overlap; mutation routines keep `start`
/// and `len` consistent with the single authoritative buffer.
#[derive(Debug, Clone)]
pub(crate) struct FieldEntry {
    pub defn: Arc<DdfFieldDefn>,
    pub start: usize,
    pub len: usize,
}

/// A borrowed view of one field occurrence inside a record.
///
/// Owns nothing: it pairs the field's definition with its byte span in the
/// parent record's buffer, and is invalidated by any mutation of that
/// record (the borrow checker enforces this).
#[derive(Debug, Clone, Copy)]
pub struct DdfField<'a> {
    defn: &'a DdfFieldDefn,
    data: &'a [u8],
}

impl<'a> DdfField<'a> {
    pub(crate) fn new(defn: &'a DdfFieldDefn, data: &'a [u8]) -> DdfField<'a> {
        DdfField { defn, data }
    }

    pub fn defn(&self) -> &'a DdfFieldDefn {
        self.defn
    }

    /// The field's raw bytes, including any unit terminators and the
    /// trailing field terminator.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of repetitions of the subfield group within this field.
    ///
    /// Non-repeating fields always report one instance. For repeating
    /// fields the span is walked group by group; the trailing field
    /// terminator belongs to no instance.
    pub fn repeat_count(&self) -> usize {
        if !self.defn.is_repeating() {
            return 1;
        }
        let end = self.usable_len();
        let mut offset = 0;
        let mut count = 0;
        while offset < end {
            let consumed = self.defn.group_size(&self.data[offset..end]);
            if consumed == 0 {
                break;
            }
            offset += consumed;
            count += 1;
        }
        count
    }

    /// Byte range `(offset, length)` of the `instance`-th subfield group
    /// within this field's span, or `None` if the instance does not exist.
    pub fn instance_span(&self, instance: usize) -> Option<(usize, usize)> {
        let end = self.usable_len();
        let mut offset = 0;
        let mut remaining = instance;
        loop {
            if offset >= end {
                return None;
            }
            let consumed = self.defn.group_size(&self.data[offset..end]);
            if consumed == 0 {
                return None;
            }
            if remaining == 0 {
                return Some((offset, consumed));
            }
            offset += consumed;
            remaining -= 1;
        }
    }

    /// The raw bytes of the `instance`-th subfield group.
    pub fn instance_data(&self, instance: usize) -> Option<&'a [u8]> {
        let (offset, len) = self.instance_span(instance)?;
        Some(&self.data[offset..offset + len])
    }

    /// Locate a subfield's data within the `instance`-th repeat group.
    ///
    /// Returns the remainder of the field's span starting at the
    /// subfield's first byte; extraction then measures its own length.
    pub fn subfield_data(
        &self,
        subfield: &DdfSubfieldDefn,
        instance: usize,
    ) -> Option<&'a [u8]> {
        let (group_start, _) = self.instance_span(instance)?;
        let end = self.usable_len();
        let mut offset = group_start;
        for sf in self.defn.subfields() {
            if offset >= end {
                return None;
            }
            if sf.name().eq_ignore_ascii_case(subfield.name()) {
                return Some(&self.data[offset..end]);
            }
            let (_, consumed) = sf.data_length(&self.data[offset..end]);
            offset += consumed;
        }
        None
    }

    /// Span length excluding the trailing field terminator, if present.
    fn usable_len(&self) -> usize {
        match self.data.last() {
            Some(&FIELD_TERMINATOR) => self.data.len() - 1,
            _ => self.data.len(),
        }
    }
}
