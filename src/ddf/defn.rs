//! Shared field definitions and the definition-compiler boundary.

use super::error::Result;
use super::subfield::DdfSubfieldDefn;

/// The named, ordered list of subfield definitions for one field tag.
///
/// Built once per distinct tag when the module parses the DDR, then shared
/// (immutably) by every record of the module. Identity is the tag,
/// compared case-insensitively.
#[derive(Debug, Clone)]
pub struct DdfFieldDefn {
    tag: String,
    name: String,
    is_repeating: bool,
    subfields: Vec<DdfSubfieldDefn>,
}

impl DdfFieldDefn {
    pub fn new(
        tag: impl Into<String>,
        name: impl Into<String>,
        is_repeating: bool,
        subfields: Vec<DdfSubfieldDefn>,
    ) -> DdfFieldDefn {
        DdfFieldDefn {
            tag: tag.into(),
            name: name.into(),
            is_repeating,
            subfields,
        }
    }

    /// The directory tag identifying this field.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The human-readable field name from the DDR.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this field's subfield group may repeat within one field.
    pub fn is_repeating(&self) -> bool {
        self.is_repeating
    }

    pub fn subfield_count(&self) -> usize {
        self.subfields.len()
    }

    pub fn subfield(&self, i: usize) -> Option<&DdfSubfieldDefn> {
        self.subfields.get(i)
    }

    pub fn subfields(&self) -> &[DdfSubfieldDefn] {
        &self.subfields
    }

    /// Case-insensitive exact-match lookup of a subfield by name.
    pub fn find_subfield(&self, name: &str) -> Option<&DdfSubfieldDefn> {
        self.subfields
            .iter()
            .find(|sf| sf.name().eq_ignore_ascii_case(name))
    }

    /// Bytes consumed by one pass over the subfield list starting at
    /// `data`, i.e. the size of one repeat group. Consumption is clamped
    /// to the available span so a truncated trailing group cannot run
    /// past the field's end.
    pub(crate) fn group_size(&self, data: &[u8]) -> usize {
        let mut offset = 0;
        for sf in &self.subfields {
            if offset >= data.len() {
                break;
            }
            let (_, consumed) = sf.data_length(&data[offset..]);
            offset += consumed;
        }
        offset.min(data.len())
    }
}

/// External collaborator that expands a DDR field descriptor into a
/// finished [`DdfFieldDefn`].
///
/// The module hands over the field's tag, its declared length and the raw
/// bytes of its slice of the DDR field area; the compiler owns the
/// format-control mini-language (including running every subfield format
/// through [`DdfSubfieldDefn::new`]) and is deliberately outside this
/// crate's scope.
pub trait DefinitionCompiler {
    fn compile(&self, tag: &str, field_length: usize, data: &[u8]) -> Result<DdfFieldDefn>;
}

impl<F> DefinitionCompiler for F
where
    F: Fn(&str, usize, &[u8]) -> Result<DdfFieldDefn>,
{
    fn compile(&self, tag: &str, field_length: usize, data: &[u8]) -> Result<DdfFieldDefn> {
        self(tag, field_length, data)
    }
}
