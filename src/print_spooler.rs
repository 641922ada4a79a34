use thiserror::Error;

use crate::{PRINT_DATATYPE_RAW, PRINT_JOB_NAME};

#[cfg(windows)]
pub(crate) type SystemSpooler = crate::spooler_winspool::WinSpooler;
#[cfg(unix)]
pub(crate) type SystemSpooler = crate::spooler_cups::CupsSpooler;
#[cfg(not(any(windows, unix)))]
pub(crate) type SystemSpooler = UnsupportedSpooler;

#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct SpoolerError {
    message: String,
    code: Option<i32>,
}

impl SpoolerError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub(crate) fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }

    /// OS error code reported by the spooler, when it gave one.
    pub(crate) fn code(&self) -> Option<i32> {
        self.code
    }
}

/// Document-level job description passed to the spooler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DocumentInfo<'a> {
    pub(crate) name: &'a str,
    pub(crate) output_file: Option<&'a str>,
    pub(crate) datatype: &'a str,
}

impl DocumentInfo<'static> {
    /// Raw pass-through receipt job: the spooler forwards bytes untouched.
    pub(crate) const RAW_RECEIPT: Self = Self {
        name: PRINT_JOB_NAME,
        output_file: None,
        datatype: PRINT_DATATYPE_RAW,
    };
}

/// The OS print spooler, reduced to what raw printing needs.
///
/// Handles are opened by [`PrintSpooler::open_printer`] and must be passed to
/// [`PrintSpooler::close_printer`] exactly once.
pub(crate) trait PrintSpooler {
    type Handle;

    fn enumerate_printers(&self) -> Result<Vec<String>, SpoolerError>;

    /// `Ok(None)` when the OS has no default printer configured.
    fn default_printer(&self) -> Result<Option<String>, SpoolerError>;

    fn open_printer(&self, printer_name: &str) -> Result<Self::Handle, SpoolerError>;

    fn start_document(
        &self,
        handle: &mut Self::Handle,
        document: &DocumentInfo<'_>,
    ) -> Result<(), SpoolerError>;

    fn start_page(&self, handle: &mut Self::Handle) -> Result<(), SpoolerError>;

    /// Returns how many bytes the spooler accepted.
    fn write(&self, handle: &mut Self::Handle, bytes: &[u8]) -> Result<usize, SpoolerError>;

    fn end_page(&self, handle: &mut Self::Handle) -> Result<(), SpoolerError>;

    fn end_document(&self, handle: &mut Self::Handle) -> Result<(), SpoolerError>;

    fn close_printer(&self, handle: &mut Self::Handle) -> Result<(), SpoolerError>;
}

#[cfg(not(any(windows, unix)))]
#[derive(Debug, Default)]
pub(crate) struct UnsupportedSpooler;

#[cfg(not(any(windows, unix)))]
impl UnsupportedSpooler {
    fn unsupported<T>() -> Result<T, SpoolerError> {
        Err(SpoolerError::new(
            "Raw printing is not supported on this platform.",
        ))
    }
}

#[cfg(not(any(windows, unix)))]
impl PrintSpooler for UnsupportedSpooler {
    type Handle = ();

    fn enumerate_printers(&self) -> Result<Vec<String>, SpoolerError> {
        Self::unsupported()
    }

    fn default_printer(&self) -> Result<Option<String>, SpoolerError> {
        Self::unsupported()
    }

    fn open_printer(&self, _printer_name: &str) -> Result<(), SpoolerError> {
        Self::unsupported()
    }

    fn start_document(&self, _: &mut (), _: &DocumentInfo<'_>) -> Result<(), SpoolerError> {
        Self::unsupported()
    }

    fn start_page(&self, _: &mut ()) -> Result<(), SpoolerError> {
        Self::unsupported()
    }

    fn write(&self, _: &mut (), _: &[u8]) -> Result<usize, SpoolerError> {
        Self::unsupported()
    }

    fn end_page(&self, _: &mut ()) -> Result<(), SpoolerError> {
        Self::unsupported()
    }

    fn end_document(&self, _: &mut ()) -> Result<(), SpoolerError> {
        Self::unsupported()
    }

    fn close_printer(&self, _: &mut ()) -> Result<(), SpoolerError> {
        Ok(())
    }
}
