//! Parsing of the fixed 24-byte leader shared by header and data records.

use super::error::{DdfError, Result};
use super::utils::scan_int;
use super::LEADER_SIZE;

/// Layout parameters extracted from a 24-byte record leader.
///
/// Every numeric sub-range of the leader is a group of ASCII decimal
/// digits, not a binary integer.
#[derive(Debug, Clone, Copy)]
pub struct Leader {
    /// Total length of the record, leader included.
    pub record_length: usize,
    pub interchange_level: u8,
    /// `'L'` for the DDR, `'D'` for data records, `'R'` for data records
    /// announcing that the following records reuse this directory.
    pub leader_identifier: u8,
    pub inline_code_extension: u8,
    pub version_number: u8,
    pub app_indicator: u8,
    pub field_control_length: usize,
    /// Offset of the field area from the start of the record.
    pub field_area_start: usize,
    /// Width of the length sub-field of each directory entry.
    pub size_field_length: usize,
    /// Width of the position sub-field of each directory entry.
    pub size_field_pos: usize,
    /// Width of the tag sub-field of each directory entry.
    pub size_field_tag: usize,
}

impl Leader {
    pub fn parse(raw: &[u8; LEADER_SIZE]) -> Leader {
        Leader {
            record_length: scan_int(&raw[0..5]),
            interchange_level: raw[5],
            leader_identifier: raw[6],
            inline_code_extension: raw[7],
            version_number: raw[8],
            app_indicator: raw[9],
            field_control_length: scan_int(&raw[10..12]),
            field_area_start: scan_int(&raw[12..17]),
            size_field_length: scan_int(&raw[20..21]),
            size_field_pos: scan_int(&raw[21..22]),
            size_field_tag: scan_int(&raw[23..24]),
        }
    }

    /// Width of one directory entry: tag, length and position sub-fields.
    pub fn entry_width(&self) -> usize {
        self.size_field_tag + self.size_field_length + self.size_field_pos
    }

    /// Reject leaders whose sizes fall outside sane bounds.
    ///
    /// This is the guard against byte-misaligned transfers (typically
    /// archives uncompressed with newline translation enabled): such files
    /// produce record lengths or field-area offsets far outside anything a
    /// valid ISO 8211 file declares.
    pub fn validate(&self) -> Result<()> {
        let sane = (LEADER_SIZE..=100_000_000).contains(&self.record_length)
            && (LEADER_SIZE..=100_000).contains(&self.field_area_start)
            && self.field_area_start <= self.record_length
            && self.entry_width() > 0;
        if sane {
            Ok(())
        } else {
            Err(DdfError::CorruptRecord {
                record_length: self.record_length,
                field_area_start: self.field_area_start,
            })
        }
    }
}
