//! Deterministic rendering of rollup trees into TEXT, CSV, and JSON.
//!
//! Formatting is a pure function of the analysis result and the options:
//! the same tree and settings always produce a byte-identical report.
//! Truncation by row limit folds removed rows into a synthetic
//! `[other]` entry; bytes are never silently dropped.

use std::borrow::Cow;
use std::fmt::Write;

use serde::Serialize;

use crate::demangle;
use crate::engine::Analysis;
use crate::error::TransportError;
use crate::options::{AnalysisOptions, DataSource, DemangleMode, OutputFormat};
use crate::report::Report;
use crate::rollup::{RollupNode, OTHER};

/// Render a complete report.
///
/// Raw-map mode bypasses formatting and returns the engine dump
/// verbatim.
pub fn format(analysis: &Analysis, options: &AnalysisOptions) -> Result<Report, TransportError> {
    if options.dump_raw_map {
        return Ok(Report::raw(
            analysis.raw_map.clone().unwrap_or_default(),
        ));
    }
    let views: Vec<View> = analysis
        .roots
        .iter()
        .map(|root| build_view(root, 0, options))
        .collect();
    let text = match options.format {
        OutputFormat::Text => render_text(&views),
        OutputFormat::Csv => render_csv(&views),
        OutputFormat::Json => serde_json::to_string(&views)?,
    };
    Ok(Report::new(text, options.format))
}

/// Emission-ready copy of a node: demangled, sorted, truncated.
/// Field order here is the JSON key order.
#[derive(Debug, Serialize)]
struct View {
    name: String,
    vm_size: u64,
    file_size: u64,
    children: Vec<View>,
}

impl View {
    fn weight(&self) -> u64 {
        self.vm_size.max(self.file_size)
    }
}

/// `child_level` is the data-source index of `node`'s children.
fn build_view(node: &RollupNode, child_level: usize, options: &AnalysisOptions) -> View {
    let demangle_children = options.demangle != DemangleMode::None
        && options.data_sources.get(child_level) == Some(&DataSource::Symbols);
    let mut children: Vec<View> = node
        .sorted_children()
        .into_iter()
        .map(|child| {
            let mut view = build_view(child, child_level + 1, options);
            if demangle_children {
                view.name = demangle::apply(&view.name, options.demangle);
            }
            view
        })
        .collect();
    // Demangling can reshuffle tie order; settle it on display names.
    children.sort_by(|a, b| b.weight().cmp(&a.weight()).then_with(|| a.name.cmp(&b.name)));
    if let Some(cap) = options.max_rows.cap() {
        if (children.len() as u64) > cap {
            let tail = children.split_off(cap as usize);
            let vm_size = tail.iter().map(|v| v.vm_size).sum();
            let file_size = tail.iter().map(|v| v.file_size).sum();
            children.push(View {
                name: OTHER.to_string(),
                vm_size,
                file_size,
                children: Vec::new(),
            });
        }
    }
    View {
        name: node.name.clone(),
        vm_size: node.vm_size,
        file_size: node.file_size,
        children,
    }
}

fn render_text(views: &[View]) -> String {
    let mut out = String::new();
    for view in views {
        let _ = writeln!(
            out,
            "{}  vm: {} ({})  file: {} ({})",
            view.name,
            view.vm_size,
            pretty_size(view.vm_size),
            view.file_size,
            pretty_size(view.file_size)
        );
        for child in &view.children {
            render_text_row(&mut out, child, view.weight(), 1);
        }
        let _ = writeln!(out, "TOTAL  vm: {}  file: {}", view.vm_size, view.file_size);
    }
    out
}

fn render_text_row(out: &mut String, view: &View, parent_weight: u64, depth: usize) {
    let _ = writeln!(
        out,
        "{}  {}{}  vm: {}  file: {}",
        percent(view.weight(), parent_weight),
        "  ".repeat(depth),
        view.name,
        view.vm_size,
        view.file_size
    );
    for child in &view.children {
        render_text_row(out, child, view.weight(), depth + 1);
    }
}

fn percent(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "  0.0%".to_string();
    }
    format!("{:5.1}%", part as f64 * 100.0 / whole as f64)
}

/// Human-readable size next to the exact count in TEXT output.
fn pretty_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn render_csv(views: &[View]) -> String {
    let mut out = String::from("path,vm_size,file_size\n");
    for view in views {
        csv_rows(&mut out, view, "");
    }
    out
}

fn csv_rows(out: &mut String, view: &View, prefix: &str) {
    let path = if prefix.is_empty() {
        view.name.clone()
    } else {
        format!("{}/{}", prefix, view.name)
    };
    let _ = writeln!(
        out,
        "{},{},{}",
        csv_escape(&path),
        view.vm_size,
        view.file_size
    );
    for child in &view.children {
        csv_rows(out, child, &path);
    }
}

fn csv_escape(field: &str) -> Cow<'_, str> {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RowLimit;
    use crate::rollup::Space;

    fn scenario_tree() -> Analysis {
        let mut root = RollupNode::new("app.bin");
        root.add(&["pkgA", "foo"], Space::Vm, 100);
        root.add(&["pkgA", "bar"], Space::Vm, 50);
        Analysis {
            roots: vec![root],
            raw_map: None,
            diagnostic: None,
        }
    }

    fn options(format: OutputFormat) -> AnalysisOptions {
        AnalysisOptions::builder()
            .input("app.bin")
            .data_sources(["packages", "symbols"])
            .format(format)
            .build()
            .unwrap()
    }

    #[test]
    fn text_report_nests_and_sorts() {
        let report = format(&scenario_tree(), &options(OutputFormat::Text)).unwrap();
        let text = report.as_str();
        let pkg_line = text.lines().nth(1).unwrap();
        assert!(pkg_line.contains("pkgA"));
        assert!(pkg_line.contains("vm: 150"));
        let foo_at = text.find("foo").unwrap();
        let bar_at = text.find("bar").unwrap();
        assert!(foo_at < bar_at, "foo (100) must sort before bar (50)");
        assert!(text.ends_with("TOTAL  vm: 150  file: 0\n"));
    }

    #[test]
    fn formatting_is_deterministic() {
        for fmt in [OutputFormat::Text, OutputFormat::Csv, OutputFormat::Json] {
            let first = format(&scenario_tree(), &options(fmt)).unwrap();
            let second = format(&scenario_tree(), &options(fmt)).unwrap();
            assert_eq!(first.as_str(), second.as_str());
        }
    }

    #[test]
    fn csv_header_and_shape() {
        let report = format(&scenario_tree(), &options(OutputFormat::Csv)).unwrap();
        let mut lines = report.as_str().lines();
        assert_eq!(lines.next(), Some("path,vm_size,file_size"));
        for line in lines {
            assert_eq!(line.matches(',').count(), 2, "bad row: {line}");
        }
        assert!(report.as_str().contains("app.bin/pkgA/foo,100,0"));
    }

    #[test]
    fn csv_escapes_embedded_commas_and_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn json_round_trips() {
        let report = format(&scenario_tree(), &options(OutputFormat::Json)).unwrap();
        let value: serde_json::Value = serde_json::from_str(report.as_str()).unwrap();
        let root = &value[0];
        assert_eq!(root["name"], "app.bin");
        assert_eq!(root["vm_size"], 150);
        assert!(root["vm_size"].is_u64());
        let pkg = &root["children"][0];
        assert_eq!(pkg["name"], "pkgA");
        assert_eq!(pkg["children"][0]["name"], "foo");
    }

    #[test]
    fn row_limit_folds_remainder_into_other() {
        let mut root = RollupNode::new("bin");
        root.add(&["c"], Space::Vm, 10);
        root.add(&["b"], Space::Vm, 20);
        root.add(&["a"], Space::Vm, 30);
        let analysis = Analysis {
            roots: vec![root],
            raw_map: None,
            diagnostic: None,
        };
        let options = AnalysisOptions::builder()
            .input("bin")
            .data_source("symbols")
            .max_rows(RowLimit::Limit(1))
            .format(OutputFormat::Csv)
            .build()
            .unwrap();
        let report = format(&analysis, &options).unwrap();
        let text = report.as_str();
        assert!(text.contains("bin/a,30,0"));
        assert!(text.contains("bin/[other],30,0"), "10 + 20 folds into [other]: {text}");
        assert!(!text.contains("bin/b,"));
        assert!(!text.contains("bin/c,"));
    }

    #[test]
    fn demangling_applies_at_the_symbols_level() {
        let mut root = RollupNode::new("bin");
        root.add(&["_ZN4core3ptr13drop_in_place17h0123456789abcdefE"], Space::Vm, 10);
        let analysis = Analysis {
            roots: vec![root],
            raw_map: None,
            diagnostic: None,
        };
        let options = AnalysisOptions::builder()
            .input("bin")
            .data_source("symbols")
            .demangle(DemangleMode::Short)
            .format(OutputFormat::Csv)
            .build()
            .unwrap();
        let report = format(&analysis, &options).unwrap();
        assert!(report.as_str().contains("bin/core::ptr::drop_in_place,10,0"));
    }

    #[test]
    fn raw_map_mode_bypasses_formatting() {
        let analysis = Analysis {
            roots: Vec::new(),
            raw_map: Some("VM MAP of x (sections):\n".to_string()),
            diagnostic: None,
        };
        let mut options = options(OutputFormat::Json);
        options.dump_raw_map = true;
        let report = format(&analysis, &options).unwrap();
        assert_eq!(report.as_str(), "VM MAP of x (sections):\n");
    }

    #[test]
    fn pretty_size_units() {
        assert_eq!(pretty_size(0), "0 B");
        assert_eq!(pretty_size(150), "150 B");
        assert_eq!(pretty_size(2048), "2.0 KiB");
        assert_eq!(pretty_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
