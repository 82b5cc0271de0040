//! DWARF compile-unit ranges, via gimli.
//!
//! Extraction only: each compile unit contributes its address ranges
//! labeled with the unit name. Binaries without debug info yield an
//! empty list; overlap with other units is resolved downstream.

use std::borrow::Cow;

use gimli::{EndianSlice, RunTimeEndian, SectionId};
use object::{Object, ObjectSection};
use tracing::debug;

use crate::engine::ranges::SizeRange;

const UNNAMED_UNIT: &str = "[unnamed unit]";

/// Whether the binary carries the DWARF sections compile-unit
/// attribution needs.
pub(crate) fn has_debug_info(obj: &object::File<'_>) -> bool {
    obj.section_by_name(SectionId::DebugInfo.name()).is_some()
}

/// Extract VM-address ranges labeled by compile-unit name.
pub(crate) fn unit_ranges(obj: &object::File<'_>) -> Result<Vec<SizeRange>, gimli::Error> {
    let endian = if obj.is_little_endian() {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    };

    let load_section = |id: SectionId| -> Result<Cow<[u8]>, gimli::Error> {
        Ok(obj
            .section_by_name(id.name())
            .and_then(|section| section.uncompressed_data().ok())
            .unwrap_or(Cow::Borrowed(&[][..])))
    };
    let sections = gimli::DwarfSections::load(load_section)?;
    let dwarf = sections.borrow(|section| EndianSlice::new(section, endian));

    let mut out = Vec::new();
    let mut units = dwarf.units();
    while let Some(header) = units.next()? {
        let unit = dwarf.unit(header)?;
        let name = unit
            .name
            .as_ref()
            .map(|r| r.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNNAMED_UNIT.to_string());
        let mut ranges = dwarf.unit_ranges(&unit)?;
        let mut contributed = 0u64;
        while let Some(range) = ranges.next()? {
            if range.end > range.begin {
                contributed += range.end - range.begin;
                out.push(SizeRange::new(range.begin, range.end - range.begin, name.clone()));
            }
        }
        debug!(unit = %name, bytes = contributed, "compile unit ranges");
    }
    Ok(out)
}
