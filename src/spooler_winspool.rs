//! Win32 print spooler (winspool) bindings.
//!
//! Every `unsafe` block here is a direct winspool call. Strings handed to the
//! spooler are kept alive as `HSTRING`s for the duration of the call.

use windows::{
    core::{Error as WinError, Result as WinResult, HSTRING, PCWSTR, PWSTR},
    Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_INSUFFICIENT_BUFFER, WIN32_ERROR},
    Win32::Graphics::Printing::{
        ClosePrinter, EndDocPrinter, EndPagePrinter, EnumPrintersW, GetDefaultPrinterW,
        OpenPrinterW, StartDocPrinterW, StartPagePrinter, WritePrinter, DOC_INFO_1W,
        PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_HANDLE, PRINTER_INFO_4W,
    },
};

use crate::print_spooler::{DocumentInfo, PrintSpooler, SpoolerError};

const PRINTER_INFO_LEVEL: u32 = 4;
const DOC_INFO_LEVEL: u32 = 1;
const ENUM_ATTEMPTS: usize = 3;

#[derive(Debug, Default)]
pub(crate) struct WinSpooler;

#[derive(Debug)]
pub(crate) struct WinPrinterHandle(PRINTER_HANDLE);

impl From<WinError> for SpoolerError {
    fn from(error: WinError) -> Self {
        SpoolerError::with_code(error.message().to_string(), error.code().0)
    }
}

fn last_error() -> SpoolerError {
    WinError::from_win32().into()
}

fn is_win32_error(error: &WinError, code: WIN32_ERROR) -> bool {
    error.code() == code.to_hresult()
}

/// Reads the outcome of a winspool call made with a missing or short buffer.
///
/// `Ok(true)` asks for a (larger) buffer, `Ok(false)` means there is nothing
/// to read: the call succeeded, or it failed with the `empty` error.
fn needs_buffer(result: WinResult<()>, empty: Option<WIN32_ERROR>) -> Result<bool, SpoolerError> {
    match result {
        Ok(()) => Ok(false),
        Err(error) if is_win32_error(&error, ERROR_INSUFFICIENT_BUFFER) => Ok(true),
        Err(error) if empty.is_some_and(|code| is_win32_error(&error, code)) => Ok(false),
        Err(error) => Err(error.into()),
    }
}

impl PrintSpooler for WinSpooler {
    type Handle = WinPrinterHandle;

    fn enumerate_printers(&self) -> Result<Vec<String>, SpoolerError> {
        let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
        let mut needed = 0u32;
        let mut returned = 0u32;

        let sizing = unsafe {
            EnumPrintersW(
                flags,
                PCWSTR::null(),
                PRINTER_INFO_LEVEL,
                None,
                &mut needed,
                &mut returned,
            )
        };
        if !needs_buffer(sizing, None)? || needed == 0 {
            return Ok(Vec::new());
        }

        // The list can grow between calls; each retry uses the size just reported.
        for _ in 0..ENUM_ATTEMPTS {
            // u64 backing keeps the PRINTER_INFO_4W records pointer-aligned.
            let mut storage = vec![0u64; (needed as usize).div_ceil(8)];
            let buffer = unsafe {
                std::slice::from_raw_parts_mut(storage.as_mut_ptr().cast::<u8>(), needed as usize)
            };
            let filled = unsafe {
                EnumPrintersW(
                    flags,
                    PCWSTR::null(),
                    PRINTER_INFO_LEVEL,
                    Some(buffer),
                    &mut needed,
                    &mut returned,
                )
            };
            if needs_buffer(filled, None)? {
                continue;
            }

            let records = unsafe {
                std::slice::from_raw_parts(
                    storage.as_ptr().cast::<PRINTER_INFO_4W>(),
                    returned as usize,
                )
            };
            return records
                .iter()
                .map(|record| {
                    unsafe { record.pPrinterName.to_string() }.map_err(|error| {
                        SpoolerError::new(format!("Printer name is not valid UTF-16: {error}"))
                    })
                })
                .collect();
        }

        Err(SpoolerError::new(
            "The printer list kept changing while it was being read.",
        ))
    }

    fn default_printer(&self) -> Result<Option<String>, SpoolerError> {
        let mut length = 0u32;
        let sizing = unsafe { GetDefaultPrinterW(PWSTR::null(), &mut length) }.ok();
        if !needs_buffer(sizing, Some(ERROR_FILE_NOT_FOUND))? || length == 0 {
            return Ok(None);
        }

        let mut buffer = vec![0u16; length as usize];
        unsafe { GetDefaultPrinterW(PWSTR(buffer.as_mut_ptr()), &mut length) }
            .ok()
            .map_err(SpoolerError::from)?;

        let end = buffer.iter().position(|unit| *unit == 0).unwrap_or(buffer.len());
        Ok(Some(String::from_utf16_lossy(&buffer[..end])))
    }

    fn open_printer(&self, printer_name: &str) -> Result<WinPrinterHandle, SpoolerError> {
        let name = HSTRING::from(printer_name);
        let mut handle = PRINTER_HANDLE::default();
        unsafe { OpenPrinterW(&name, &mut handle, None) }?;
        Ok(WinPrinterHandle(handle))
    }

    fn start_document(
        &self,
        handle: &mut WinPrinterHandle,
        document: &DocumentInfo<'_>,
    ) -> Result<(), SpoolerError> {
        let doc_name = HSTRING::from(document.name);
        let datatype = HSTRING::from(document.datatype);
        let output_file = document.output_file.map(HSTRING::from);

        let info = DOC_INFO_1W {
            pDocName: PWSTR(doc_name.as_ptr().cast_mut()),
            pOutputFile: output_file
                .as_ref()
                .map_or(PWSTR::null(), |path| PWSTR(path.as_ptr().cast_mut())),
            pDatatype: PWSTR(datatype.as_ptr().cast_mut()),
        };
        let job_id = unsafe { StartDocPrinterW(handle.0, DOC_INFO_LEVEL, &info) };
        if job_id == 0 {
            return Err(last_error());
        }
        Ok(())
    }

    fn start_page(&self, handle: &mut WinPrinterHandle) -> Result<(), SpoolerError> {
        unsafe { StartPagePrinter(handle.0) }
            .ok()
            .map_err(SpoolerError::from)
    }

    fn write(&self, handle: &mut WinPrinterHandle, bytes: &[u8]) -> Result<usize, SpoolerError> {
        let length = u32::try_from(bytes.len())
            .map_err(|_| SpoolerError::new("Print payload exceeds 4 GiB."))?;
        let mut written = 0u32;
        unsafe { WritePrinter(handle.0, bytes.as_ptr().cast(), length, &mut written) }
            .ok()
            .map_err(SpoolerError::from)?;
        Ok(written as usize)
    }

    fn end_page(&self, handle: &mut WinPrinterHandle) -> Result<(), SpoolerError> {
        unsafe { EndPagePrinter(handle.0) }
            .ok()
            .map_err(SpoolerError::from)
    }

    fn end_document(&self, handle: &mut WinPrinterHandle) -> Result<(), SpoolerError> {
        unsafe { EndDocPrinter(handle.0) }
            .ok()
            .map_err(SpoolerError::from)
    }

    fn close_printer(&self, handle: &mut WinPrinterHandle) -> Result<(), SpoolerError> {
        unsafe { ClosePrinter(handle.0) }?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use windows::Win32::Foundation::RPC_S_SERVER_UNAVAILABLE;

    use super::*;

    fn failure(code: WIN32_ERROR) -> WinResult<()> {
        Err(WinError::from(code.to_hresult()))
    }

    #[test]
    fn needs_buffer_asks_for_buffer_on_insufficient_buffer() {
        assert!(needs_buffer(failure(ERROR_INSUFFICIENT_BUFFER), None).expect("sizing"));
    }

    #[test]
    fn needs_buffer_reports_nothing_to_read_after_success() {
        assert!(!needs_buffer(Ok(()), None).expect("sizing"));
    }

    #[test]
    fn needs_buffer_propagates_stopped_spooler() {
        let error = needs_buffer(failure(RPC_S_SERVER_UNAVAILABLE), None)
            .expect_err("spooler outage must fail");
        assert_eq!(error.code(), Some(RPC_S_SERVER_UNAVAILABLE.to_hresult().0));
    }

    #[test]
    fn needs_buffer_treats_missing_default_as_empty_only_when_allowed() {
        assert!(!needs_buffer(failure(ERROR_FILE_NOT_FOUND), Some(ERROR_FILE_NOT_FOUND))
            .expect("missing default printer"));
        assert!(needs_buffer(failure(ERROR_FILE_NOT_FOUND), None).is_err());
    }
}
