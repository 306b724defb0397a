//! Module open/read driver: DDR parsing and sequential record access.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use super::defn::{DdfFieldDefn, DefinitionCompiler};
use super::error::{DdfError, Result};
use super::leader::Leader;
use super::record::DdfRecord;
use super::utils::{read_fully, scan_int};
use super::{FIELD_TERMINATOR, LEADER_SIZE};

/// An open ISO 8211 transfer: the compiled field definitions from its
/// data descriptive record (DDR) plus a cursor over the data records that
/// follow.
///
/// Opening a module parses the DDR eagerly, handing each field descriptor
/// to the caller's [`DefinitionCompiler`]; records are then consumed one
/// at a time with [`read_record`](Self::read_record).
#[derive(Debug)]
pub struct DdfModule {
    file: File,
    leader: Leader,
    field_defns: Vec<Arc<DdfFieldDefn>>,
    current: Option<DdfRecord>,
}

impl DdfModule {
    /// Open a transfer file and parse its DDR.
    ///
    /// Every field descriptor listed in the DDR directory is compiled
    /// through `compiler`; a descriptor the compiler rejects fails the
    /// whole open, since later records cannot be interpreted without it.
    pub fn open(path: impl AsRef<Path>, compiler: &dyn DefinitionCompiler) -> Result<DdfModule> {
        let path = path.as_ref();
        info!("opening ISO 8211 module {}", path.display());
        let mut file = File::open(path)?;

        let mut raw_leader = [0u8; LEADER_SIZE];
        let found = read_fully(&mut file, &mut raw_leader)?;
        if found < LEADER_SIZE {
            return Err(DdfError::ShortRead {
                context: "DDR leader",
                expected: LEADER_SIZE,
                found,
            });
        }
        let leader = Leader::parse(&raw_leader);
        leader.validate()?;

        let body_len = leader.record_length - LEADER_SIZE;
        let mut body = vec![0u8; body_len];
        let found = read_fully(&mut file, &mut body)?;
        if found < body_len {
            return Err(DdfError::ShortRead {
                context: "DDR body",
                expected: body_len,
                found,
            });
        }

        let field_area = leader.field_area_start - LEADER_SIZE;
        let entry_width = leader.entry_width();
        let mut field_defns: Vec<Arc<DdfFieldDefn>> = Vec::new();
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

            if position + length > body_len - field_area {
                return Err(DdfError::DirectoryOutOfBounds {
                    tag,
                    position,
                    length,
                    available: body_len - field_area,
                });
            }
            let descriptor = &body[field_area + position..field_area + position + length];
            let defn = compiler.compile(&tag, length, descriptor)?;
            debug!(
                "compiled field definition {} ({} subfields)",
                defn.tag(),
                defn.subfield_count()
            );
            field_defns.push(Arc::new(defn));
        }
        info!("DDR defines {} fields", field_defns.len());

        Ok(DdfModule {
            file,
            leader,
            field_defns,
            current: None,
        })
    }

    /// The DDR's leader, exposing the transfer's layout parameters.
    pub fn leader(&self) -> &Leader {
        &self.leader
    }

    pub fn field_defn_count(&self) -> usize {
        self.field_defns.len()
    }

    pub fn field_defn(&self, i: usize) -> Option<&DdfFieldDefn> {
        self.field_defns.get(i).map(Arc::as_ref)
    }

    /// Case-insensitive lookup of a field definition by tag.
    pub fn find_field_defn(&self, tag: &str) -> Option<&DdfFieldDefn> {
        self.field_defns
            .iter()
            .find(|d| d.tag().eq_ignore_ascii_case(tag))
            .map(Arc::as_ref)
    }

    /// Shared handle to a definition, for binding into record directories.
    pub(crate) fn find_defn_handle(&self, tag: &str) -> Option<Arc<DdfFieldDefn>> {
        self.field_defns
            .iter()
            .find(|d| d.tag().eq_ignore_ascii_case(tag))
            .map(Arc::clone)
    }

    /// Read the next data record.
    ///
    /// Returns `Ok(None)` on a clean end-of-file at a record boundary. The
    /// returned borrow ties the record to the module, so it cannot outlive
    /// the next call; `clone()` the record to keep it. After an error the
    /// stream stands at the next record boundary and reading may continue,
    /// but any previously current record is gone.
    pub fn read_record(&mut self) -> Result<Option<&DdfRecord>> {
        let mut record = self.current.take().unwrap_or_else(DdfRecord::new);
        match record.read(&mut self.file, &self.field_defns) {
            Ok(true) => {
                self.current = Some(record);
                Ok(self.current.as_ref())
            }
            Ok(false) => {
                self.current = Some(record);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Mutable access to the record returned by the last successful
    /// [`read_record`](Self::read_record), for use with the mutation API.
    pub fn current_record_mut(&mut self) -> Option<&mut DdfRecord> {
        self.current.as_mut()
    }
}
