//! Size attribution engine.
//!
//! Binary-format parsing is delegated to the `object` and `gimli`
//! crates; this module extracts labeled ranges per data source, resolves
//! overlaps into disjoint coverage, and builds the rollup tree. Inputs
//! are memory-mapped in full before any attribution runs.

pub mod ranges;

mod compileunits;
mod packages;

pub use packages::UNKNOWN_PACKAGE;

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use object::{Object, ObjectSection, ObjectSymbol};
use tracing::{debug, info};

use crate::demangle;
use crate::error::EngineError;
use crate::options::{AnalysisOptions, DataSource, DemangleMode};
use crate::rollup::{self, RollupNode, Space, UNMAPPED};
use ranges::{resolve, Segment, SizeRange};

/// Result of one engine invocation: one root per input file.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub roots: Vec<RollupNode>,
    /// Raw range dump, present when the run requested it.
    pub raw_map: Option<String>,
    /// Human-readable note about degraded attribution (e.g. missing
    /// debug info), empty runs stay None.
    pub diagnostic: Option<String>,
}

/// Capability interface the pipeline depends on.
///
/// Any conforming engine must honor the overlap contract implemented by
/// [`ranges::resolve`]: every byte at a level is attributed to exactly
/// one owner (narrowest covering range first, ties to the
/// lexicographically smallest label), bytes are never double-counted,
/// and uncovered scope bytes surface as an explicit `[unmapped]` bucket.
/// Failures are final; callers never retry a failed analysis.
pub trait SizeEngine {
    fn analyze(&self, options: &AnalysisOptions) -> Result<Analysis, EngineError>;
}

/// Default engine backed by `object` (sections, symbols) and `gimli`
/// (compile units).
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectEngine;

impl SizeEngine for ObjectEngine {
    fn analyze(&self, options: &AnalysisOptions) -> Result<Analysis, EngineError> {
        let mut analysis = Analysis::default();
        let mut raw_map = options.dump_raw_map.then(String::new);
        let mut diagnostics: Vec<String> = Vec::new();
        for path in &options.inputs {
            let root = analyze_file(path, options, raw_map.as_mut(), &mut diagnostics)?;
            analysis.roots.push(root);
        }
        analysis.raw_map = raw_map;
        if !diagnostics.is_empty() {
            analysis.diagnostic = Some(diagnostics.join("; "));
        }
        Ok(analysis)
    }
}

/// Per-section extents used to project VM ranges onto file offsets.
struct SectionExtent {
    vm_start: u64,
    vm_size: u64,
    file: Option<(u64, u64)>,
}

fn analyze_file(
    path: &Path,
    options: &AnalysisOptions,
    mut raw_map: Option<&mut String>,
    diagnostics: &mut Vec<String>,
) -> Result<RollupNode, EngineError> {
    let display_path = path.display().to_string();
    let unreadable = |source: std::io::Error| EngineError::Unreadable {
        path: display_path.clone(),
        source,
    };
    let file = File::open(path).map_err(unreadable)?;
    let len = file.metadata().map_err(unreadable)?.len();
    if len == 0 {
        // memmap cannot map empty files, and an empty file is no binary.
        return Err(EngineError::UnsupportedFormat {
            path: display_path.clone(),
            message: "empty file".to_string(),
        });
    }
    // Safety: read-only map of a regular file we just opened.
    let mmap = unsafe { Mmap::map(&file) }.map_err(unreadable)?;
    let data: &[u8] = &mmap;
    let obj = object::File::parse(data).map_err(|e| EngineError::UnsupportedFormat {
        path: display_path.clone(),
        message: e.to_string(),
    })?;
    info!(path = %display_path, bytes = data.len(), "analyzing binary");

    let extents: Vec<SectionExtent> = obj
        .sections()
        .map(|section| SectionExtent {
            vm_start: section.address(),
            vm_size: section.size(),
            file: section.file_range().filter(|&(_, size)| size > 0),
        })
        .collect();

    let file_scope = vec![(0, data.len() as u64)];
    let vm_scope: Vec<(u64, u64)> = extents
        .iter()
        .filter(|e| e.vm_start > 0 && e.vm_size > 0)
        .map(|e| (e.vm_start, e.vm_start + e.vm_size))
        .collect();

    let mut vm_levels: Vec<Vec<Segment>> = Vec::with_capacity(options.data_sources.len());
    let mut file_levels: Vec<Vec<Segment>> = Vec::with_capacity(options.data_sources.len());
    for source in &options.data_sources {
        let (vm_ranges, file_ranges) =
            extract_ranges(*source, &obj, &extents, &display_path, diagnostics)?;
        debug!(
            source = source.name(),
            vm_ranges = vm_ranges.len(),
            file_ranges = file_ranges.len(),
            "extracted ranges"
        );
        let vm = resolve(&vm_ranges, &vm_scope);
        let file = resolve(&file_ranges, &file_scope);
        if let Some(out) = raw_map.as_mut() {
            render_raw_map(out, &display_path, *source, &vm, &file);
        }
        vm_levels.push(vm);
        file_levels.push(file);
    }

    let mut root = RollupNode::new(&display_path);
    rollup::attribute(&mut root, &vm_levels, &vm_scope, Space::Vm);
    rollup::attribute(&mut root, &file_levels, &file_scope, Space::File);
    Ok(root)
}

fn extract_ranges(
    source: DataSource,
    obj: &object::File<'_>,
    extents: &[SectionExtent],
    display: &str,
    diagnostics: &mut Vec<String>,
) -> Result<(Vec<SizeRange>, Vec<SizeRange>), EngineError> {
    let mut vm = Vec::new();
    let mut file = Vec::new();
    match source {
        DataSource::Sections => {
            for section in obj.sections() {
                let name = section_label(&section);
                if section.address() > 0 && section.size() > 0 {
                    vm.push(SizeRange::new(section.address(), section.size(), name.clone()));
                }
                if let Some((offset, size)) = section.file_range() {
                    if size > 0 {
                        file.push(SizeRange::new(offset, size, name));
                    }
                }
            }
        }
        DataSource::Symbols => {
            collect_symbols(obj, extents, &mut vm, &mut file, |name| name.to_string());
        }
        DataSource::Packages => {
            collect_symbols(obj, extents, &mut vm, &mut file, |name| {
                packages::package_of(&demangle::apply(name, DemangleMode::Full))
            });
        }
        DataSource::CompileUnits => {
            if !compileunits::has_debug_info(obj) {
                diagnostics.push(format!(
                    "{display}: no debug info; compileunits attribution is empty"
                ));
            } else {
                let unit_vm = compileunits::unit_ranges(obj).map_err(|e| EngineError::Corrupt {
                    path: display.to_string(),
                    message: format!("bad DWARF data: {e}"),
                })?;
                for range in &unit_vm {
                    if let Some((offset, size)) = vm_to_file(extents, range.start, range.size) {
                        file.push(SizeRange::new(offset, size, range.label.clone()));
                    }
                }
                vm = unit_vm;
            }
        }
    }
    Ok((vm, file))
}

/// Collect defined, sized symbols in both address spaces, labeling each
/// through `label`.
fn collect_symbols(
    obj: &object::File<'_>,
    extents: &[SectionExtent],
    vm: &mut Vec<SizeRange>,
    file: &mut Vec<SizeRange>,
    label: impl Fn(&str) -> String,
) {
    for symbol in obj.symbols() {
        if symbol.size() == 0 || symbol.is_undefined() {
            continue;
        }
        let Ok(name) = symbol.name() else { continue };
        if name.is_empty() {
            continue;
        }
        let label = label(name);
        vm.push(SizeRange::new(symbol.address(), symbol.size(), label.clone()));
        if let Some((offset, size)) = vm_to_file(extents, symbol.address(), symbol.size()) {
            file.push(SizeRange::new(offset, size, label));
        }
    }
}

fn section_label(section: &object::Section<'_, '_>) -> String {
    match section.name_bytes() {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(bytes).into_owned(),
        _ => "[unnamed]".to_string(),
    }
}

/// Project a VM range onto the file offsets of its containing section.
/// Returns None for ranges with no file backing (e.g. `.bss`).
fn vm_to_file(extents: &[SectionExtent], start: u64, size: u64) -> Option<(u64, u64)> {
    let extent = extents
        .iter()
        .find(|e| e.vm_start <= start && start < e.vm_start.saturating_add(e.vm_size))?;
    let (file_offset, file_size) = extent.file?;
    let delta = start - extent.vm_start;
    let available = file_size.saturating_sub(delta);
    let size = size.min(available);
    if size == 0 {
        return None;
    }
    Some((file_offset + delta, size))
}

fn render_raw_map(out: &mut String, display: &str, source: DataSource, vm: &[Segment], file: &[Segment]) {
    use std::fmt::Write;

    let mut dump = |title: &str, segments: &[Segment]| {
        let _ = writeln!(out, "{} MAP of {} ({}):", title, display, source.name());
        for segment in segments {
            let _ = writeln!(
                out,
                "{:08x}-{:08x} {:>10}  {}",
                segment.start,
                segment.end,
                segment.size(),
                segment.label.as_deref().unwrap_or(UNMAPPED)
            );
        }
    };
    dump("VM", vm);
    dump("FILE", file);
}
