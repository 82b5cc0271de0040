//! smaug — hierarchical size attribution for compiled binaries.
//!
//! Analyzes how a binary's total size is distributed across logical
//! units (sections, packages, compile units, symbols) so size
//! regressions can be pinned to an owner. The pipeline runs in four
//! sequential stages: build an immutable [`AnalysisOptions`], hand it to
//! a [`SizeEngine`], format the resulting rollup tree, and serialize the
//! report for the boundary crossing. Each stage fails closed; a partial
//! report is never produced.

pub mod demangle;
pub mod engine;
pub mod error;
#[cfg(feature = "capi")]
pub mod ffi;
pub mod logging;
pub mod options;
pub mod report;
pub mod rollup;
pub mod toolchain;

pub use engine::{Analysis, ObjectEngine, SizeEngine};
pub use error::{ConfigError, EngineError, Error, Result, TransportError};
pub use options::{AnalysisOptions, DataSource, DemangleMode, OutputFormat, RowLimit};
pub use report::{Report, ReportBuffer};
pub use rollup::RollupNode;

/// Run the full pipeline with the default [`ObjectEngine`].
pub fn run(options: &AnalysisOptions) -> Result<Report> {
    run_with_engine(&ObjectEngine, options)
}

/// Run the pipeline against any conforming engine.
pub fn run_with_engine(engine: &dyn SizeEngine, options: &AnalysisOptions) -> Result<Report> {
    let analysis = engine.analyze(options)?;
    if let Some(diagnostic) = &analysis.diagnostic {
        tracing::warn!(diagnostic = %diagnostic, "engine reported degraded attribution");
    }
    let report = rollup::format::format(&analysis, options)?;
    Ok(report)
}
