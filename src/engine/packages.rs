//! Package attribution from symbol naming conventions.
//!
//! A "package" here is the coarsest ownership unit a symbol name can be
//! pinned to: the leading crate/namespace for `::`-separated names, the
//! import path for Go-style `path/to/pkg.Func` names. Names carrying no
//! package-like structure land in [`UNKNOWN_PACKAGE`] instead of being
//! dropped, so their bytes stay visible in the rollup.

/// Bucket for symbols whose names carry no package structure.
pub const UNKNOWN_PACKAGE: &str = "[unknown]";

/// Derive a package label from a demangled symbol name.
pub fn package_of(name: &str) -> String {
    // Rust / C++ namespace paths. Trait-impl symbols arrive shaped like
    // "<alloc::string::String as core::fmt::Display>::fmt"; the leading
    // '<' hides the owning crate.
    if let Some(idx) = name.find("::") {
        let head = name[..idx].trim_start_matches('<');
        if !head.is_empty() {
            return head.to_string();
        }
    }
    // Go import paths: "github.com/user/pkg.(*Type).Method" owns
    // everything up to the first '.' after the last '/'.
    if let Some(slash) = name.rfind('/') {
        if let Some(dot) = name[slash..].find('.') {
            return name[..slash + dot].to_string();
        }
        return name.to_string();
    }
    // Bare "runtime.main" style.
    if let Some(dot) = name.find('.') {
        let head = &name[..dot];
        if !head.is_empty() && !head.chars().all(|c| c.is_ascii_digit()) {
            return head.to_string();
        }
    }
    UNKNOWN_PACKAGE.to_string()
}
