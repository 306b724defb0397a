//! Subfield format compilation and typed value extraction.
//!
//! A subfield's format token (`A`, `R`, `I(5)`, `B(24)`, `b1(16)`, ...)
//! fully determines how its bytes are located within a field's span and
//! how they decode to text, integer or float values.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::{DdfError, Result};
use super::utils::{parse_float_prefix, parse_int_prefix};
use super::{FIELD_TERMINATOR, UNIT_TERMINATOR};

/// Logical type a compiled subfield reports for its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Text,
    Int,
    Float,
}

/// Storage interpretation of a binary (`B`/`b`) subfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    UnsignedInt,
    SignedInt,
    FloatReal,
}

/// Declared byte order of a binary subfield: uppercase `B` marks
/// most-significant-byte-first data, lowercase `b` least-significant-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOrder {
    Msb,
    Lsb,
}

/// Decoded binary payload, before narrowing to the caller's requested type.
enum Decoded {
    Unsigned(u32),
    Signed(i32),
    Real(f64),
}

/// The compiled width/type/endianness rule for one named subfield.
///
/// Construction parses the format token; extraction methods then turn a
/// byte span from a record's field area into typed values. Instances are
/// immutable once built and shared by every record of a module.
#[derive(Debug, Clone)]
pub struct DdfSubfieldDefn {
    name: String,
    format: String,
    data_type: DataType,
    is_variable: bool,
    /// Declared byte width for fixed-width subfields; zero when variable.
    width: usize,
    /// Stop byte for variable-width scanning. The field terminator is
    /// always honoured as an implicit second stop.
    delimiter: u8,
    binary: Option<(BinaryKind, BinaryOrder)>,
}

impl DdfSubfieldDefn {
    /// Compile a format token of shape `<Kind>` or `<Kind>(<width>)`.
    ///
    /// Kinds `A`/`C` are text, `R`/`I`/`S` text-encoded numerals, `B`/`b`
    /// binary. For binary tokens the character immediately following the
    /// kind letter disambiguates: `(` introduces a bit count (which must
    /// be a multiple of 8, sub-kind defaulting to signed integer), while
    /// a digit is a sub-kind code (`0` unsigned int, `1` signed int, `4`
    /// float real) followed by the width, either as bare digits (a byte
    /// count) or parenthesized (a bit count). `X` (padding) and unknown
    /// kinds are configuration errors.
    pub fn new(name: impl Into<String>, format: &str) -> Result<DdfSubfieldDefn> {
        let name = name.into();
        let bytes = format.as_bytes();
        let kind = *bytes
            .first()
            .ok_or_else(|| DdfError::UnrecognizedFormat(format.to_string()))?;

        let paren_width = parenthesized_number(&bytes[1..]);

        let mut defn = DdfSubfieldDefn {
            name,
            format: format.to_string(),
            data_type: DataType::Text,
            is_variable: true,
            width: 0,
            delimiter: UNIT_TERMINATOR,
            binary: None,
        };

        match kind {
            b'A' | b'C' => {
                defn.data_type = DataType::Text;
                defn.apply_text_width(paren_width);
            }
            b'R' => {
                defn.data_type = DataType::Float;
                defn.apply_text_width(paren_width);
            }
            b'I' | b'S' => {
                defn.data_type = DataType::Int;
                defn.apply_text_width(paren_width);
            }
            b'B' | b'b' => {
                let order = if kind == b'B' {
                    BinaryOrder::Msb
                } else {
                    BinaryOrder::Lsb
                };
                defn.is_variable = false;
                if bytes.get(1) == Some(&b'(') {
                    // Bitstring form: width is a bit count.
                    let bits = paren_width.unwrap_or(0);
                    if bits % 8 != 0 {
                        return Err(DdfError::UnsupportedBitWidth {
                            bits,
                            token: format.to_string(),
                        });
                    }
                    defn.width = bits / 8;
                    defn.binary = Some((BinaryKind::SignedInt, order));
                    defn.data_type = DataType::Int;
                } else {
                    // Sub-kind form: a kind code digit, then the width.
                    let code = bytes
                        .get(1)
                        .copied()
                        .ok_or_else(|| DdfError::UnrecognizedFormat(format.to_string()))?;
                    let sub_kind = match code {
                        b'0' => BinaryKind::UnsignedInt,
                        b'1' => BinaryKind::SignedInt,
                        b'4' => BinaryKind::FloatReal,
                        _ => {
                            return Err(DdfError::UnsupportedBinaryKind {
                                code: code as char,
                                token: format.to_string(),
                            })
                        }
                    };
                    defn.width = match parenthesized_number(&bytes[2..]) {
                        Some(bits) => {
                            if bits % 8 != 0 {
                                return Err(DdfError::UnsupportedBitWidth {
                                    bits,
                                    token: format.to_string(),
                                });
                            }
                            bits / 8
                        }
                        None => bare_number(&bytes[2..]),
                    };
                    defn.binary = Some((sub_kind, order));
                    defn.data_type = if sub_kind == BinaryKind::FloatReal {
                        DataType::Float
                    } else {
                        DataType::Int
                    };
                }
            }
            // 'X' is padding and should never reach a subfield definition.
            _ => return Err(DdfError::UnrecognizedFormat(format.to_string())),
        }

        Ok(defn)
    }

    fn apply_text_width(&mut self, paren_width: Option<usize>) {
        match paren_width {
            Some(w) if w > 0 => {
                self.is_variable = false;
                self.width = w;
            }
            _ => self.is_variable = true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The format token this definition was compiled from.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_variable(&self) -> bool {
        self.is_variable
    }

    /// Declared byte width; zero for variable-width subfields.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Binary sub-kind and declared byte order, if this is a `B`/`b`
    /// subfield.
    pub fn binary(&self) -> Option<(BinaryKind, BinaryOrder)> {
        self.binary
    }

    /// Measure this subfield's data at the start of `data`.
    ///
    /// Returns `(length, consumed)`: `length` bytes belong to the subfield
    /// value, `consumed` bytes must be skipped to reach the next subfield.
    /// Fixed-width subfields report their declared width unconditionally
    /// (the caller guarantees enough bytes remain). Variable-width
    /// subfields scan to their delimiter or the field terminator;
    /// `consumed` exceeds `length` by one only when a terminator byte was
    /// actually present.
    pub fn data_length(&self, data: &[u8]) -> (usize, usize) {
        if !self.is_variable {
            return (self.width, self.width);
        }
        let mut length = 0;
        while length < data.len()
            && data[length] != self.delimiter
            && data[length] != FIELD_TERMINATOR
        {
            length += 1;
        }
        let consumed = if length < data.len() { length + 1 } else { length };
        (length, consumed)
    }

    /// Extract the subfield's bytes as an owned string.
    ///
    /// Returns the decoded text and the number of bytes consumed. Binary
    /// subfields decode their raw span lossily, which matches the
    /// "copy whatever is there" behaviour expected of text extraction.
    pub fn extract_string(&self, data: &[u8]) -> (String, usize) {
        let (length, consumed) = self.data_length(data);
        let length = length.min(data.len());
        (
            String::from_utf8_lossy(&data[..length]).into_owned(),
            consumed,
        )
    }

    /// Extract the subfield value as an integer.
    ///
    /// Text kinds parse their decimal text; binary kinds decode per their
    /// (sub-kind, width) rule. Unsupported width combinations are
    /// configuration errors, distinct from missing data.
    pub fn extract_int(&self, data: &[u8]) -> Result<(i32, usize)> {
        match self.binary {
            None => {
                let (text, consumed) = self.extract_string(data);
                Ok((parse_int_prefix(&text), consumed))
            }
            Some(_) => {
                let value = match self.decode_binary(data)? {
                    Decoded::Unsigned(v) => v as i32,
                    Decoded::Signed(v) => v,
                    Decoded::Real(v) => v as i32,
                };
                Ok((value, self.width))
            }
        }
    }

    /// Extract the subfield value as a float.
    pub fn extract_float(&self, data: &[u8]) -> Result<(f64, usize)> {
        match self.binary {
            None => {
                let (text, consumed) = self.extract_string(data);
                Ok((parse_float_prefix(&text), consumed))
            }
            Some(_) => {
                let value = match self.decode_binary(data)? {
                    Decoded::Unsigned(v) => f64::from(v),
                    Decoded::Signed(v) => f64::from(v),
                    Decoded::Real(v) => v,
                };
                Ok((value, self.width))
            }
        }
    }

    /// Decode the binary payload in the declared byte order.
    fn decode_binary(&self, data: &[u8]) -> Result<Decoded> {
        let (kind, order) = self.binary.expect("binary subfield");
        if data.len() < self.width {
            return Err(DdfError::SubfieldTruncated {
                token: self.format.clone(),
                expected: self.width,
                available: data.len(),
            });
        }
        let buf = &data[..self.width];
        match order {
            BinaryOrder::Msb => self.decode_with::<BigEndian>(kind, buf),
            BinaryOrder::Lsb => self.decode_with::<LittleEndian>(kind, buf),
        }
    }

    fn decode_with<B: ByteOrder>(&self, kind: BinaryKind, buf: &[u8]) -> Result<Decoded> {
        let decoded = match (kind, self.width) {
            (BinaryKind::UnsignedInt, 1) => Decoded::Unsigned(u32::from(buf[0])),
            (BinaryKind::UnsignedInt, 2) => Decoded::Unsigned(u32::from(B::read_u16(buf))),
            (BinaryKind::UnsignedInt, 4) => Decoded::Unsigned(B::read_u32(buf)),
            (BinaryKind::SignedInt, 1) => Decoded::Signed(i32::from(buf[0] as i8)),
            (BinaryKind::SignedInt, 2) => Decoded::Signed(i32::from(B::read_i16(buf))),
            (BinaryKind::SignedInt, 4) => Decoded::Signed(B::read_i32(buf)),
            (BinaryKind::FloatReal, 4) => Decoded::Real(f64::from(B::read_f32(buf))),
            (BinaryKind::FloatReal, 8) => Decoded::Real(B::read_f64(buf)),
            (_, width) => {
                return Err(DdfError::UnsupportedBinaryWidth {
                    token: self.format.clone(),
                    width,
                })
            }
        };
        Ok(decoded)
    }
}

/// Parse `(<digits>)` at the start of `bytes`, if present.
fn parenthesized_number(bytes: &[u8]) -> Option<usize> {
    if bytes.first() != Some(&b'(') {
        return None;
    }
    Some(bare_number(&bytes[1..]))
}

/// Parse a run of leading ASCII digits; empty yields zero.
fn bare_number(bytes: &[u8]) -> usize {
    let mut value = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            break;
        }
        value = value * 10 + usize::from(b - b'0');
    }
    value
}
