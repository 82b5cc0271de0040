//! Startup precondition: required external toolchains.
//!
//! The check is a blocking, one-shot capability probe executed before
//! any input file is opened. It is deliberately behind a trait so the
//! CLI behavior (boolean check, fatal on absence) can be exercised in
//! tests without shelling out.

use std::process::Command;

use tracing::debug;

/// Capability check consumed by the CLI at startup.
pub trait ToolchainGuard {
    /// Whether the toolchain is installed and runnable. Blocking.
    fn check_available(&self) -> bool;

    /// Toolchain name for diagnostics.
    fn describe(&self) -> &str;
}

/// Probes a toolchain by running its version command and looking for a
/// marker substring in the output.
#[derive(Debug, Clone)]
pub struct VersionProbe {
    name: String,
    program: String,
    args: Vec<String>,
    marker: String,
}

impl VersionProbe {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
        marker: impl Into<String>,
    ) -> Self {
        VersionProbe {
            name: name.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            marker: marker.into(),
        }
    }

    /// The Go toolchain, required for package attribution of Go
    /// binaries.
    pub fn golang() -> Self {
        VersionProbe::new("golang", "go", ["version"], "go version")
    }
}

impl ToolchainGuard for VersionProbe {
    fn check_available(&self) -> bool {
        let output = match Command::new(&self.program).args(&self.args).output() {
            Ok(output) => output,
            Err(err) => {
                debug!(program = %self.program, error = %err, "toolchain probe failed to spawn");
                return false;
            }
        };
        let stdout = String::from_utf8_lossy(&output.stdout);
        output.status.success() && stdout.contains(&self.marker)
    }

    fn describe(&self) -> &str {
        &self.name
    }
}
