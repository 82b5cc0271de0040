//! Demangler helpers for Rust, C++ (Itanium), and MSVC symbols.
//!
//! Demangling is delegated entirely to the demangler crates; this module
//! only detects the flavor and maps [`DemangleMode`] onto each crate's
//! short/full rendering.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::options::DemangleMode;

static RE_ITA_MANGLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_?_Z[A-Za-z0-9_$.]+$").unwrap());
static RE_MSVC_MANGLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\?[?$A-Za-z0-9_@]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFlavor {
    Rust,
    Itanium,
    Msvc,
    Unknown,
}

pub fn detect_flavor(s: &str) -> SymbolFlavor {
    if rustc_demangle::try_demangle(s).is_ok() {
        return SymbolFlavor::Rust;
    }
    if RE_ITA_MANGLED.is_match(s) {
        return SymbolFlavor::Itanium;
    }
    if RE_MSVC_MANGLED.is_match(s) {
        return SymbolFlavor::Msvc;
    }
    SymbolFlavor::Unknown
}

/// Attempt to demangle a single symbol per the requested mode.
/// Returns None when the name is not recognized as mangled, or when the
/// mode is [`DemangleMode::None`]; callers keep the raw name.
pub fn demangle_one(s: &str, mode: DemangleMode) -> Option<String> {
    if mode == DemangleMode::None {
        return None;
    }
    // Rust (v0 + legacy) demangler
    if let Ok(dm) = rustc_demangle::try_demangle(s) {
        return Some(match mode {
            // Alternate formatting drops the trailing disambiguator hash.
            DemangleMode::Short => format!("{:#}", dm),
            _ => dm.to_string(),
        });
    }
    // C++ (Itanium) demangler
    if RE_ITA_MANGLED.is_match(s) {
        if let Ok(sym) = cpp_demangle::Symbol::new(s) {
            return match mode {
                DemangleMode::Short => {
                    let opts = cpp_demangle::DemangleOptions::new()
                        .no_params()
                        .no_return_type();
                    sym.demangle(&opts).ok()
                }
                _ => Some(sym.to_string()),
            };
        }
    }
    // MSVC demangler
    if RE_MSVC_MANGLED.is_match(s) {
        let flags = match mode {
            DemangleMode::Short => msvc_demangler::DemangleFlags::NAME_ONLY,
            _ => msvc_demangler::DemangleFlags::COMPLETE,
        };
        if let Ok(out) = msvc_demangler::demangle(s, flags) {
            return Some(out);
        }
    }
    None
}

/// Apply the configured mode to a name, falling back to the raw name
/// when no demangler recognizes it.
pub fn apply(s: &str, mode: DemangleMode) -> String {
    demangle_one(s, mode).unwrap_or_else(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_flavor_simple() {
        assert_eq!(detect_flavor("_Z3foov"), SymbolFlavor::Itanium);
        assert_eq!(
            detect_flavor("_ZN4core3ptr13drop_in_place17h0123456789abcdefE"),
            SymbolFlavor::Rust
        );
        assert_eq!(detect_flavor("main"), SymbolFlavor::Unknown);
    }

    #[test]
    fn rust_short_drops_hash() {
        let mangled = "_ZN4core3ptr13drop_in_place17h0123456789abcdefE";
        let short = demangle_one(mangled, DemangleMode::Short).unwrap();
        assert_eq!(short, "core::ptr::drop_in_place");
        let full = demangle_one(mangled, DemangleMode::Full).unwrap();
        assert!(full.starts_with("core::ptr::drop_in_place"));
        assert!(full.contains("h0123456789abcdef"));
    }

    #[test]
    fn itanium_short_drops_params() {
        let short = demangle_one("_Z3foov", DemangleMode::Short).unwrap();
        assert_eq!(short, "foo");
        let full = demangle_one("_Z3foov", DemangleMode::Full).unwrap();
        assert_eq!(full, "foo()");
    }

    #[test]
    fn mode_none_is_identity() {
        assert_eq!(demangle_one("_Z3foov", DemangleMode::None), None);
        assert_eq!(apply("_Z3foov", DemangleMode::None), "_Z3foov");
    }

    #[test]
    fn unrecognized_names_pass_through() {
        assert_eq!(apply("main", DemangleMode::Full), "main");
    }
}
