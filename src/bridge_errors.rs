use std::fmt;

use thiserror::Error;

use crate::print_spooler::SpoolerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobStage {
    Document,
    Page,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Document => f.write_str("document"),
            JobStage::Page => f.write_str("page"),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum PrintError {
    #[error("Failed to open printer '{printer}': {source}")]
    Acquire {
        printer: String,
        #[source]
        source: SpoolerError,
    },

    #[error("Failed to start {stage} on printer '{printer}': {source}")]
    JobStart {
        printer: String,
        stage: JobStage,
        #[source]
        source: SpoolerError,
    },

    #[error("Failed to write to printer '{printer}': {source}")]
    Write {
        printer: String,
        #[source]
        source: SpoolerError,
    },

    #[error("Printer '{printer}' accepted {written} of {expected} bytes")]
    ShortWrite {
        printer: String,
        written: usize,
        expected: usize,
    },

    #[error("Failed to end {stage} on printer '{printer}': {source}")]
    JobTeardown {
        printer: String,
        stage: JobStage,
        #[source]
        source: SpoolerError,
    },

    #[error("Failed to release printer '{printer}': {source}")]
    Release {
        printer: String,
        #[source]
        source: SpoolerError,
    },
}

impl PrintError {
    /// Stable identifier of the failed phase, exposed to the hosted page.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            PrintError::Acquire { .. } => "acquire",
            PrintError::JobStart { .. } => "job_start",
            PrintError::Write { .. } | PrintError::ShortWrite { .. } => "write",
            PrintError::JobTeardown { .. } => "job_teardown",
            PrintError::Release { .. } => "release",
        }
    }

    pub(crate) fn spooler_error(&self) -> Option<&SpoolerError> {
        match self {
            PrintError::Acquire { source, .. }
            | PrintError::JobStart { source, .. }
            | PrintError::Write { source, .. }
            | PrintError::JobTeardown { source, .. }
            | PrintError::Release { source, .. } => Some(source),
            PrintError::ShortWrite { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ListPrintersError {
    #[error("Failed to enumerate printers: {0}")]
    Enumerate(#[source] SpoolerError),

    #[error("Failed to query the default printer: {0}")]
    DefaultPrinter(#[source] SpoolerError),
}

impl ListPrintersError {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ListPrintersError::Enumerate(_) => "enumerate",
            ListPrintersError::DefaultPrinter(_) => "default_printer",
        }
    }
}
