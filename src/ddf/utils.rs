//! Low-level byte scanning utilities.

use std::io::{ErrorKind, Read};

/// Interpret a fixed-width group of ASCII decimal digits.
///
/// Used throughout the ISO 8211 leader and directory, where every numeric
/// sub-range is a digit group rather than a binary integer. Leading spaces
/// are skipped; scanning stops at the first non-digit. An empty or blank
/// group yields zero.
pub fn scan_int(bytes: &[u8]) -> usize {
    let mut i = 0;
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    let mut value = 0usize;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value * 10 + usize::from(bytes[i] - b'0');
        i += 1;
    }
    value
}

/// Parse the longest leading integer from text, C `atoi` style.
///
/// Skips leading whitespace, accepts an optional sign, stops at the first
/// non-digit. Garbage yields zero; out-of-range values saturate.
pub fn parse_int_prefix(text: &str) -> i32 {
    let bytes = text.trim_start().as_bytes();
    let mut i = 0;
    let mut negative = false;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        negative = bytes[i] == b'-';
        i += 1;
    }
    let mut value: i64 = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value * 10 + i64::from(bytes[i] - b'0');
        if value > i64::from(i32::MAX) + 1 {
            value = i64::from(i32::MAX) + 1;
        }
        i += 1;
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Parse the longest leading floating-point number from text, C `atof`
/// style. Garbage yields zero.
pub fn parse_float_prefix(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut has_digits = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        has_digits = true;
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            has_digits = true;
            end += 1;
        }
    }
    if has_digits && end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        // Only consume the exponent if at least one digit follows it.
        let mut probe = end + 1;
        if probe < bytes.len() && (bytes[probe] == b'+' || bytes[probe] == b'-') {
            probe += 1;
        }
        if probe < bytes.len() && bytes[probe].is_ascii_digit() {
            end = probe;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
    }
    if !has_digits {
        return 0.0;
    }
    s[..end].parse().unwrap_or(0.0)
}

/// Read until `buf` is full or end-of-file, returning the byte count.
///
/// Unlike `read_exact`, a clean zero-byte result at a record boundary is
/// distinguishable from a short read, which the record reader needs to
/// separate end-of-file from truncation.
pub fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
