//! Data record parsing, lookup and in-place mutation.

use std::io::Read;
use std::sync::Arc;

use log::debug;

use super::defn::DdfFieldDefn;
use super::error::{DdfError, Result};
use super::field::{DdfField, FieldEntry};
use super::leader::Leader;
use super::module::DdfModule;
use super::utils::{read_fully, scan_int};
use super::{FIELD_TERMINATOR, LEADER_SIZE};

/// One data record: its parsed field directory plus its live byte buffer.
///
/// The buffer holds only the field area; the record's own leader and
/// directory are consumed during parsing and not retained. Field entries
/// carry `{definition, start, len}` against that single buffer, so the sum
/// of entry lengths equals the buffer length and every mutation recomputes
/// offsets from one authoritative source.
///
/// Records are created and refreshed by [`DdfModule::read_record`]; use
/// `clone()` to obtain an independent copy that survives subsequent reads.
#[derive(Debug)]
pub struct DdfRecord {
    data: Vec<u8>,
    fields: Vec<FieldEntry>,
    /// Set when this record's leader identifier was `'R'`: the following
    /// physical records carry only field-area bytes and reuse this
    /// record's directory unchanged.
    reuse_header: bool,
}

impl Clone for DdfRecord {
    /// Deep copy. Offsets are relative to the copied buffer, so entries
    /// transfer verbatim; the clone leaves the reuse cycle and is
    /// independent of subsequent reads on the source.
    fn clone(&self) -> DdfRecord {
        DdfRecord {
            data: self.data.clone(),
            fields: self.fields.clone(),
            reuse_header: false,
        }
    }
}

impl DdfRecord {
    pub(crate) fn new() -> DdfRecord {
        DdfRecord {
            data: Vec::new(),
            fields: Vec::new(),
            reuse_header: false,
        }
    }

    /// Parse or refresh this record from the next physical record.
    ///
    /// Returns `Ok(false)` on a clean end-of-file at a record boundary.
    /// A failed parse leaves the record cleared; it must not be used until
    /// a subsequent read succeeds.
    pub(crate) fn read<R: Read>(
        &mut self,
        reader: &mut R,
        defns: &[Arc<DdfFieldDefn>],
    ) -> Result<bool> {
        if !self.reuse_header {
            return self.read_header(reader, defns);
        }

        // Header reuse: the next physical record is field-area bytes only,
        // overlaid on the existing buffer without disturbing the directory.
        // The buffer is sized identically across reuse cycles, so any size
        // drift shows up as a short read rather than corrupted lookups.
        let found = read_fully(reader, &mut self.data)?;
        if found == 0 {
            return Ok(false);
        }
        if found < self.data.len() {
            self.clear();
            return Err(DdfError::ShortRead {
                context: "reused data record",
                expected: self.data.len(),
                found,
            });
        }
        debug!("refreshed {} field-area bytes under reused header", found);
        Ok(true)
    }

    /// Full re-parse: leader, directory, and field area.
    fn read_header<R: Read>(
        &mut self,
        reader: &mut R,
        defns: &[Arc<DdfFieldDefn>],
    ) -> Result<bool> {
        self.clear();

        let mut raw_leader = [0u8; LEADER_SIZE];
        let found = read_fully(reader, &mut raw_leader)?;
        if found == 0 {
            return Ok(false);
        }
        if found < LEADER_SIZE {
            return Err(DdfError::ShortRead {
                context: "record leader",
                expected: LEADER_SIZE,
                found,
            });
        }

        let leader = Leader::parse(&raw_leader);
        leader.validate()?;
        self.reuse_header = leader.leader_identifier == b'R';

        // Directory and field area together make up the rest of the record.
        let body_len = leader.record_length - LEADER_SIZE;
        let mut body = vec![0u8; body_len];
        let found = read_fully(reader, &mut body)?;
        if found < body_len {
            return Err(DdfError::ShortRead {
                context: "data record",
                expected: body_len,
                found,
            });
        }

        let field_area = leader.field_area_start - LEADER_SIZE;
        let entry_width = leader.entry_width();
        let mut fields = Vec::new();
        let mut offset = 0;
        while offset + entry_width <= field_area && body[offset] != FIELD_TERMINATOR {
            let tag = String::from_utf8_lossy(&body[offset..offset + leader.size_field_tag])
                .trim_end()
                .to_string();
            let length = scan_int(
                &body[offset + leader.size_field_tag
                    ..offset + leader.size_field_tag + leader.size_field_length],
            );
            let position = scan_int(
                &body[offset + leader.size_field_tag + leader.size_field_length
                    ..offset + entry_width],
            );
            offset += entry_width;

            let defn = defns
                .iter()
                .find(|d| d.tag().eq_ignore_ascii_case(&tag))
                .ok_or_else(|| DdfError::UndefinedField(tag.clone()))?;

            if position + length > body_len - field_area {
                return Err(DdfError::DirectoryOutOfBounds {
                    tag,
                    position,
                    length,
                    available: body_len - field_area,
                });
            }
            fields.push(FieldEntry {
                defn: Arc::clone(defn),
                start: position,
                len: length,
            });
        }

        // The leader, directory and terminator are consumed; only the
        // field area is retained as the record's buffer.
        self.data = body.split_off(field_area);
        self.fields = fields;
        debug!(
            "read data record: {} fields, {} field-area bytes",
            self.fields.len(),
            self.data.len()
        );
        Ok(true)
    }

    fn clear(&mut self) {
        self.data.clear();
        self.fields.clear();
        self.reuse_header = false;
    }

    /// The record's field-area bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Fetch a field view by directory index.
    pub fn field(&self, index: usize) -> Option<DdfField<'_>> {
        let entry = self.fields.get(index)?;
        Some(DdfField::new(
            entry.defn.as_ref(),
            &self.data[entry.start..entry.start + entry.len],
        ))
    }

    /// Find the `instance`-th occurrence of the named field.
    ///
    /// The comparison is case-insensitive against the definition's tag.
    pub fn find_field(&self, name: &str, instance: usize) -> Option<DdfField<'_>> {
        self.find_field_index(name, instance)
            .and_then(|i| self.field(i))
    }

    /// Like [`find_field`](Self::find_field) but returns the directory
    /// index, which is the handle the mutation operations take.
    pub fn find_field_index(&self, name: &str, instance: usize) -> Option<usize> {
        let mut remaining = instance;
        for (i, entry) in self.fields.iter().enumerate() {
            if entry.defn.tag().eq_ignore_ascii_case(name) {
                if remaining == 0 {
                    return Some(i);
                }
                remaining -= 1;
            }
        }
        None
    }

    /// Fetch a subfield value as an integer.
    ///
    /// `Ok(None)` when the field, subfield or instance is absent; probing
    /// for optional fields is routine. `Err` only for configuration-class
    /// extraction failures in the subfield's format definition.
    pub fn get_int_subfield(
        &self,
        field: &str,
        field_instance: usize,
        subfield: &str,
        subfield_instance: usize,
    ) -> Result<Option<i32>> {
        match self.locate_subfield(field, field_instance, subfield, subfield_instance) {
            Some((sf, span)) => Ok(Some(sf.extract_int(span)?.0)),
            None => Ok(None),
        }
    }

    /// Fetch a subfield value as a float. Same contract as
    /// [`get_int_subfield`](Self::get_int_subfield).
    pub fn get_float_subfield(
        &self,
        field: &str,
        field_instance: usize,
        subfield: &str,
        subfield_instance: usize,
    ) -> Result<Option<f64>> {
        match self.locate_subfield(field, field_instance, subfield, subfield_instance) {
            Some((sf, span)) => Ok(Some(sf.extract_float(span)?.0)),
            None => Ok(None),
        }
    }

    /// Fetch a subfield value as an owned string. Same contract as
    /// [`get_int_subfield`](Self::get_int_subfield).
    pub fn get_string_subfield(
        &self,
        field: &str,
        field_instance: usize,
        subfield: &str,
        subfield_instance: usize,
    ) -> Result<Option<String>> {
        match self.locate_subfield(field, field_instance, subfield, subfield_instance) {
            Some((sf, span)) => Ok(Some(sf.extract_string(span).0)),
            None => Ok(None),
        }
    }

    fn locate_subfield(
        &self,
        field: &str,
        field_instance: usize,
        subfield: &str,
        subfield_instance: usize,
    ) -> Option<(&super::subfield::DdfSubfieldDefn, &[u8])> {
        let entry_index = self.find_field_index(field, field_instance)?;
        let entry = &self.fields[entry_index];
        let sf = entry.defn.find_subfield(subfield)?;
        let view = self.field(entry_index)?;
        let span = view.subfield_data(sf, subfield_instance)?;
        Some((sf, span))
    }

    /// Alter the space reserved for one field, sliding every following
    /// field by the delta and updating their recorded offsets.
    ///
    /// Growth zero-fills the new tail of the target field. Any field view
    /// obtained before this call is invalidated (enforced by the borrow
    /// checker) and must be recomputed from the updated directory.
    pub fn resize_field(&mut self, index: usize, new_len: usize) -> Result<()> {
        let entry = self
            .fields
            .get(index)
            .ok_or(DdfError::InvalidFieldIndex(index))?;
        let start = entry.start;
        let old_len = entry.len;
        if new_len == old_len {
            return Ok(());
        }
        if new_len > old_len {
            let grow = new_len - old_len;
            self.data.splice(
                start + old_len..start + old_len,
                std::iter::repeat(0u8).take(grow),
            );
        } else {
            self.data.drain(start + new_len..start + old_len);
        }
        let delta = new_len as isize - old_len as isize;
        self.fields[index].len = new_len;
        for entry in &mut self.fields[index + 1..] {
            entry.start = (entry.start as isize + delta) as usize;
        }
        Ok(())
    }

    /// Remove a field: shrink it to nothing, then drop its directory entry.
    pub fn delete_field(&mut self, index: usize) -> Result<()> {
        self.resize_field(index, 0)?;
        self.fields.remove(index);
        Ok(())
    }

    /// Append a zero-length field after the last existing field.
    ///
    /// Returns the new field's index, or `None` when the record has no
    /// fields (there is no end offset to anchor the new field to). The
    /// record's serialized header image is not updated; a writer must
    /// rebuild the header before the record can be persisted.
    pub fn add_field(&mut self, defn: Arc<DdfFieldDefn>) -> Option<usize> {
        let last = self.fields.last()?;
        let start = last.start + last.len;
        self.fields.push(FieldEntry { defn, start, len: 0 });
        Some(self.fields.len() - 1)
    }

    /// Replace or append one repeating-group instance inside a field.
    ///
    /// `instance == repeat_count` appends (the definition must allow
    /// repetition); the new bytes are spliced just before the field's
    /// trailing terminator. A smaller `instance` replaces that group with
    /// `raw` verbatim. In both cases `raw` must already carry its own unit
    /// terminators.
    pub fn set_field_raw(&mut self, index: usize, instance: usize, raw: &[u8]) -> Result<()> {
        let entry = self
            .fields
            .get(index)
            .ok_or(DdfError::InvalidFieldIndex(index))?;
        let defn = Arc::clone(&entry.defn);

        // A zero-length field (fresh from add_field) has no terminator to
        // splice around: write the first instance and close the field.
        if entry.len == 0 {
            if instance != 0 {
                return Err(DdfError::InstanceOutOfRange {
                    instance,
                    repeat_count: 0,
                });
            }
            self.resize_field(index, raw.len() + 1)?;
            let start = self.fields[index].start;
            self.data[start..start + raw.len()].copy_from_slice(raw);
            self.data[start + raw.len()] = FIELD_TERMINATOR;
            return Ok(());
        }

        let repeat_count = self
            .field(index)
            .map(|f| f.repeat_count())
            .unwrap_or_default();

        if instance > repeat_count {
            return Err(DdfError::InstanceOutOfRange {
                instance,
                repeat_count,
            });
        }

        if instance == repeat_count {
            // Append a new group before the trailing terminator.
            if !defn.is_repeating() {
                return Err(DdfError::NotRepeating(defn.tag().to_string()));
            }
            let old_len = self.fields[index].len;
            self.resize_field(index, old_len + raw.len())?;
            let start = self.fields[index].start;
            let insert_at = start + old_len - 1;
            self.data[insert_at..insert_at + raw.len()].copy_from_slice(raw);
            self.data[start + old_len + raw.len() - 1] = FIELD_TERMINATOR;
            return Ok(());
        }

        // Replace: assemble the new field image from the unaffected
        // prefix, the new bytes, and the unaffected suffix, then resize
        // and copy it back in one step.
        let (instance_offset, instance_len) = self
            .field(index)
            .and_then(|f| f.instance_span(instance))
            .unwrap_or((0, 0));
        let start = self.fields[index].start;
        let old_len = self.fields[index].len;
        let new_len = old_len - instance_len + raw.len();

        let mut image = Vec::with_capacity(new_len);
        image.extend_from_slice(&self.data[start..start + instance_offset]);
        image.extend_from_slice(raw);
        image.extend_from_slice(&self.data[start + instance_offset + instance_len..start + old_len]);

        self.resize_field(index, new_len)?;
        let start = self.fields[index].start;
        self.data[start..start + new_len].copy_from_slice(&image);
        Ok(())
    }

    /// Recreate this record against another module.
    ///
    /// Every field is rebound to the definition with the same tag in
    /// `target`; returns `None` (with no partial effect) if any tag has no
    /// counterpart there. Field types and layouts are not validated; the
    /// operation is intended for modules with matching definitions.
    pub fn clone_on(&self, target: &DdfModule) -> Option<DdfRecord> {
        let mut rebound = Vec::with_capacity(self.fields.len());
        for entry in &self.fields {
            let defn = target.find_defn_handle(entry.defn.tag())?;
            rebound.push(FieldEntry {
                defn,
                start: entry.start,
                len: entry.len,
            });
        }
        Some(DdfRecord {
            data: self.data.clone(),
            fields: rebound,
            reuse_header: false,
        })
    }
}
