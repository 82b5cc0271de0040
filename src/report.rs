//! Report transport: serialized reports and their ownership handoff.
//!
//! A [`Report`] belongs to the producer. Crossing a process or library
//! boundary goes through [`Report::into_buffer`], which yields a
//! [`ReportBuffer`]: an independently allocated, NUL-terminated byte
//! buffer with an explicit length. The buffer owns its bytes and
//! releases them exactly once on drop; the C boundary in the `ffi`
//! module pairs the producing call with an explicit free.

use std::ffi::CString;

use bytes::Bytes;

use crate::error::TransportError;
use crate::options::OutputFormat;

/// How a report's payload was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Formatted(OutputFormat),
    /// Verbatim engine dump, no formatting applied.
    RawMap,
}

/// A fully formatted, serialized report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    text: String,
    kind: ReportKind,
}

impl Report {
    pub fn new(text: String, format: OutputFormat) -> Self {
        Report {
            text,
            kind: ReportKind::Formatted(format),
        }
    }

    pub fn raw(text: String) -> Self {
        Report {
            text,
            kind: ReportKind::RawMap,
        }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Serialize into an owned transport buffer.
    ///
    /// Failure is always signaled as a [`TransportError`]; there is no
    /// null-but-successful outcome for the caller to misread.
    pub fn into_buffer(self) -> Result<ReportBuffer, TransportError> {
        let len = self.text.len();
        // One extra byte for the terminator must stay addressable.
        if len >= isize::MAX as usize {
            return Err(TransportError::TooLarge(len));
        }
        match CString::new(self.text) {
            Ok(inner) => Ok(ReportBuffer { inner, len }),
            Err(err) => Err(TransportError::InteriorNul(err.nul_position())),
        }
    }
}

/// Owned, NUL-terminated report bytes with an explicit length.
///
/// The allocation is independent of any formatter-internal storage and
/// stays valid until this value is dropped, which releases it exactly
/// once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBuffer {
    inner: CString,
    len: usize,
}

impl ReportBuffer {
    /// Payload length, excluding the trailing NUL.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload bytes, without the trailing NUL.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Payload bytes including the trailing NUL.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.inner.as_bytes_with_nul()
    }

    /// Freeze into a cheaply cloneable shared buffer (without the
    /// terminator) for embedders that fan the report out.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.inner.into_bytes())
    }

    #[cfg(feature = "capi")]
    pub(crate) fn into_raw(self) -> *mut std::ffi::c_char {
        self.inner.into_raw()
    }

    #[cfg(feature = "capi")]
    pub(crate) unsafe fn from_raw(ptr: *mut std::ffi::c_char) -> Self {
        // Safety: forwarded from the caller; ptr must come from into_raw.
        let inner = unsafe { CString::from_raw(ptr) };
        let len = inner.as_bytes().len();
        ReportBuffer { inner, len }
    }
}
