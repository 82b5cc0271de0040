//! Analysis configuration for a single rollup run.
//!
//! An [`AnalysisOptions`] is assembled once through [`OptionsBuilder`],
//! validated at build time, and treated as immutable for the rest of the
//! run. Data source order defines the rollup hierarchy, outermost first.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// A named attribution dimension. Each requested source labels size
/// ranges at one level of the rollup hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Object-file sections (`.text`, `.rodata`, ...).
    Sections,
    /// Individual symbols from the symbol table.
    Symbols,
    /// DWARF compile units.
    CompileUnits,
    /// Packages derived from symbol naming conventions.
    Packages,
}

impl DataSource {
    pub const ALL: [DataSource; 4] = [
        DataSource::Sections,
        DataSource::Symbols,
        DataSource::CompileUnits,
        DataSource::Packages,
    ];

    /// Parse a user-supplied source name. Returns None for names we do
    /// not know how to attribute.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sections" => Some(DataSource::Sections),
            "symbols" => Some(DataSource::Symbols),
            "compileunits" => Some(DataSource::CompileUnits),
            "packages" => Some(DataSource::Packages),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataSource::Sections => "sections",
            DataSource::Symbols => "symbols",
            DataSource::CompileUnits => "compileunits",
            DataSource::Packages => "packages",
        }
    }
}

/// Demangling applied to symbol-level names at emission time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemangleMode {
    /// Emit raw mangled names.
    None,
    /// Demangled, without parameters or hash suffixes.
    #[default]
    Short,
    /// Fully demangled names.
    Full,
}

/// Report output layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Json,
}

/// Per-level row cap. `Unlimited` is an explicit sentinel distinct from
/// every finite value: truncating a rollup silently is a correctness
/// bug, so the cap is always spelled out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowLimit {
    #[default]
    Unlimited,
    Limit(u64),
}

impl RowLimit {
    /// The finite cap, if any.
    pub fn cap(self) -> Option<u64> {
        match self {
            RowLimit::Unlimited => None,
            RowLimit::Limit(n) => Some(n),
        }
    }
}

/// Immutable configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Input binaries, analyzed in order. Never empty.
    pub inputs: Vec<PathBuf>,
    /// Hierarchy levels, outermost first. Never empty.
    pub data_sources: Vec<DataSource>,
    pub demangle: DemangleMode,
    pub max_rows: RowLimit,
    pub format: OutputFormat,
    /// When set, bypass formatting and emit the engine's raw range dump.
    pub dump_raw_map: bool,
}

impl AnalysisOptions {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }
}

/// Fallible builder for [`AnalysisOptions`]. Pure: construction has no
/// side effects and touches no files.
#[derive(Debug, Default)]
pub struct OptionsBuilder {
    inputs: Vec<PathBuf>,
    data_sources: Vec<String>,
    demangle: DemangleMode,
    max_rows: RowLimit,
    format: OutputFormat,
    dump_raw_map: bool,
}

impl OptionsBuilder {
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Append a hierarchy level by source name. Names are validated in
    /// [`build`](Self::build).
    pub fn data_source(mut self, name: impl Into<String>) -> Self {
        self.data_sources.push(name.into());
        self
    }

    pub fn data_sources<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_sources.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn demangle(mut self, mode: DemangleMode) -> Self {
        self.demangle = mode;
        self
    }

    pub fn max_rows(mut self, limit: RowLimit) -> Self {
        self.max_rows = limit;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn dump_raw_map(mut self, dump: bool) -> Self {
        self.dump_raw_map = dump;
        self
    }

    pub fn build(self) -> Result<AnalysisOptions, ConfigError> {
        if self.inputs.is_empty() {
            return Err(ConfigError::NoInputs);
        }
        if self.data_sources.is_empty() {
            return Err(ConfigError::NoDataSources);
        }
        let mut data_sources = Vec::with_capacity(self.data_sources.len());
        for name in &self.data_sources {
            match DataSource::parse(name) {
                Some(source) => data_sources.push(source),
                None => return Err(ConfigError::UnknownDataSource(name.clone())),
            }
        }
        Ok(AnalysisOptions {
            inputs: self.inputs,
            data_sources,
            demangle: self.demangle,
            max_rows: self.max_rows,
            format: self.format,
            dump_raw_map: self.dump_raw_map,
        })
    }
}
