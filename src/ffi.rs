//! C boundary for library embedding.
//!
//! Every buffer produced by [`smaug_report_render`] must be released
//! through [`smaug_report_free`]; the pair is the whole ownership
//! contract. Errors come back as a null pointer with the diagnostic on
//! the log stream, never as a half-valid handle.

use std::ffi::{c_char, CStr};
use std::ptr;

use tracing::error;

use crate::options::AnalysisOptions;
use crate::report::ReportBuffer;

/// Analyze the binary at `path` (NUL-terminated UTF-8) with the default
/// section/symbol hierarchy and return an owned, NUL-terminated report
/// string.
///
/// Returns null when the path is null, not UTF-8, or the analysis
/// fails; details are logged. A non-null return transfers ownership to
/// the caller, who must release it with [`smaug_report_free`] exactly
/// once.
///
/// # Safety
///
/// `path` must be null or a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn smaug_report_render(path: *const c_char) -> *mut c_char {
    if path.is_null() {
        return ptr::null_mut();
    }
    // Safety: non-null, caller guarantees a valid C string.
    let path = match unsafe { CStr::from_ptr(path) }.to_str() {
        Ok(path) => path,
        Err(_) => {
            error!("report path is not valid UTF-8");
            return ptr::null_mut();
        }
    };
    let options = match AnalysisOptions::builder()
        .input(path)
        .data_sources(["sections", "symbols"])
        .build()
    {
        Ok(options) => options,
        Err(err) => {
            error!(error = %err, "invalid analysis options");
            return ptr::null_mut();
        }
    };
    let buffer = crate::run(&options).and_then(|report| Ok(report.into_buffer()?));
    match buffer {
        Ok(buffer) => buffer.into_raw(),
        Err(err) => {
            error!(error = %err, path = %path, "analysis failed");
            ptr::null_mut()
        }
    }
}

/// Release a buffer produced by [`smaug_report_render`]. Null is a
/// no-op.
///
/// # Safety
///
/// `report` must be null or a pointer previously returned by
/// [`smaug_report_render`] that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn smaug_report_free(report: *mut c_char) {
    if report.is_null() {
        return;
    }
    // Safety: caller guarantees this came from smaug_report_render.
    drop(unsafe { ReportBuffer::from_raw(report) });
}
