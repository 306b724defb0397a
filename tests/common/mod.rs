//! Shared fixture builders: synthesize well-formed ISO 8211 transfers in
//! memory and materialize them as temp files.
#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

use iso8211::{
    DdfFieldDefn, DdfSubfieldDefn, Result as DdfResult, FIELD_TERMINATOR, UNIT_TERMINATOR,
};

/// Build one physical record: 24-byte leader, directory, field area.
///
/// Each field's content gets a field terminator appended. The entry map is
/// fixed at 3-digit lengths, 3-digit positions and 4-character tags.
pub fn build_record(leader_id: u8, fields: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut directory = Vec::new();
    let mut area = Vec::new();
    for (tag, content) in fields {
        let mut bytes = content.clone();
        bytes.push(FIELD_TERMINATOR);
        directory.extend_from_slice(format!("{:<4}", tag).as_bytes());
        directory.extend_from_slice(format!("{:03}", bytes.len()).as_bytes());
        directory.extend_from_slice(format!("{:03}", area.len()).as_bytes());
        area.extend_from_slice(&bytes);
    }
    directory.push(FIELD_TERMINATOR);

    let field_area_start = 24 + directory.len();
    let record_length = field_area_start + area.len();

    let mut record = Vec::with_capacity(record_length);
    record.extend_from_slice(format!("{:05}", record_length).as_bytes());
    record.push(b'3'); // interchange level
    record.push(leader_id);
    record.push(b'E'); // inline code extension
    record.push(b'1'); // version
    record.push(b' '); // application indicator
    record.extend_from_slice(b"09"); // field control length
    record.extend_from_slice(format!("{:05}", field_area_start).as_bytes());
    record.extend_from_slice(b"   "); // extended character set
    record.extend_from_slice(b"3304"); // entry map
    record.extend_from_slice(&directory);
    record.extend_from_slice(&area);
    record
}

/// Encode a DDR field descriptor in the layout `descriptor_compiler`
/// understands: `<name> UT <flags> UT <sub>=<fmt>,<sub>=<fmt>,...` with a
/// `R` flag marking a repeating subfield group.
pub fn descriptor(name: &str, repeating: bool, subfields: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(name.as_bytes());
    out.push(UNIT_TERMINATOR);
    if repeating {
        out.push(b'R');
    }
    out.push(UNIT_TERMINATOR);
    let list = subfields
        .iter()
        .map(|(n, f)| format!("{}={}", n, f))
        .collect::<Vec<_>>()
        .join(",");
    out.extend_from_slice(list.as_bytes());
    out
}

/// Definition compiler matching the [`descriptor`] layout.
pub fn descriptor_compiler(
    tag: &str,
    _field_length: usize,
    data: &[u8],
) -> DdfResult<DdfFieldDefn> {
    let body = match data.last() {
        Some(&FIELD_TERMINATOR) => &data[..data.len() - 1],
        _ => data,
    };
    let text = String::from_utf8_lossy(body);
    let mut parts = text.split('\u{1f}');
    let name = parts.next().unwrap_or_default().to_string();
    let repeating = parts.next().unwrap_or_default().contains('R');
    let mut subfields = Vec::new();
    if let Some(list) = parts.next() {
        for item in list.split(',').filter(|s| !s.is_empty()) {
            let (sub_name, format) = item.split_once('=').unwrap_or((item, "A"));
            subfields.push(DdfSubfieldDefn::new(sub_name, format)?);
        }
    }
    Ok(DdfFieldDefn::new(tag, name, repeating, subfields))
}

/// Concatenate records into a temp file. The handle keeps the file alive.
pub fn write_transfer(records: &[Vec<u8>]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp transfer");
    for record in records {
        file.write_all(record).expect("write record");
    }
    file.flush().expect("flush transfer");
    file
}

/// DDR used by most tests: a text/numeric field, a repeating coordinate
/// pair, and a fixed-width binary field.
pub fn standard_ddr() -> Vec<u8> {
    build_record(
        b'L',
        &[
            (
                "NAME",
                descriptor(
                    "Feature name",
                    false,
                    &[("TEXT", "A"), ("NUM", "I"), ("VAL", "R")],
                ),
            ),
            (
                "COOR",
                descriptor("Coordinate pairs", true, &[("X", "I"), ("Y", "I")]),
            ),
            (
                "BIN",
                descriptor(
                    "Binary payload",
                    false,
                    &[("U16", "B02"), ("S16", "B1(16)"), ("F32", "B4(32)")],
                ),
            ),
        ],
    )
}

/// Field content for the standard NAME field. Subfields are separated by
/// unit terminators; the final one is closed by the field terminator that
/// `build_record` appends.
pub fn name_content(text: &str, num: i32, val: f64) -> Vec<u8> {
    format!("{}\u{1f}{}\u{1f}{}", text, num, val).into_bytes()
}

/// Field content for the standard COOR field: every group ends with a unit
/// terminator so instances can be appended behind it.
pub fn coor_content(pairs: &[(i32, i32)]) -> Vec<u8> {
    let mut out = String::new();
    for (x, y) in pairs {
        out.push_str(&format!("{}\u{1f}{}\u{1f}", x, y));
    }
    out.into_bytes()
}

/// Field content for the standard BIN field: unsigned 16-bit, signed
/// 16-bit and float-real 32-bit values, all most-significant-first.
pub fn bin_content(u16_val: u16, s16_val: i16, f32_val: f32) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    out.extend_from_slice(&u16_val.to_be_bytes());
    out.extend_from_slice(&s16_val.to_be_bytes());
    out.extend_from_slice(&f32_val.to_be_bytes());
    out
}
