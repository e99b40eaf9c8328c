//! Failure kinds surfaced by a report run.
//!
//! Everything in this crate propagates [`eyre::Report`]s, but the root cause of a failure is
//! always one of the [`ReportError`] variants below. Context added on the way up does not hide
//! it, so callers can tell failures apart with `report.downcast_ref::<ReportError>()`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A required file or setting is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A dated directory that must already exist does not.
    #[error("required directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// The user denied access, the consent flow timed out, or a token was rejected.
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The API answered, but not with what we asked for.
    #[error("unexpected API response: {0}")]
    UnexpectedResponse(String),

    /// A video (or archived row) lacks a field or carries one that does not parse.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

impl ReportError {
    /// Returns the [`ReportError`] at the root of `report`, if there is one.
    pub fn of(report: &eyre::Report) -> Option<&ReportError> {
        report.downcast_ref::<ReportError>()
    }
}
