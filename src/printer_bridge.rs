use crate::{
    bridge_errors::{JobStage, ListPrintersError, PrintError},
    logging::LoggingContext,
    print_spooler::{DocumentInfo, PrintSpooler, SpoolerError},
    ListPrintersResponse, OperationResult, PrinterList,
};

/// Native printing surface exposed to the hosted page.
pub(crate) struct PrinterBridge<S> {
    spooler: S,
    logging: LoggingContext,
}

impl<S: PrintSpooler> PrinterBridge<S> {
    pub(crate) fn new(spooler: S, logging: LoggingContext) -> Self {
        Self { spooler, logging }
    }

    pub(crate) fn list_printers(&self) -> ListPrintersResponse {
        match self.try_list_printers() {
            Ok(list) => ListPrintersResponse::Listed(list),
            Err(error) => {
                self.logging.error(&describe_failure(&error.to_string(), source_code(&error)));
                ListPrintersResponse::Failed(OperationResult::from(&error))
            }
        }
    }

    pub(crate) fn try_list_printers(&self) -> Result<PrinterList, ListPrintersError> {
        let printers = self
            .spooler
            .enumerate_printers()
            .map_err(ListPrintersError::Enumerate)?;
        let default = self
            .spooler
            .default_printer()
            .map_err(ListPrintersError::DefaultPrinter)?;
        Ok(PrinterList { printers, default })
    }

    pub(crate) fn print_text(&self, printer_name: &str, text: &str) -> OperationResult {
        match self.try_print_text(printer_name, text) {
            Ok(()) => {
                let message = format!("Printed on {printer_name}");
                self.logging.info(&message);
                OperationResult::success(message)
            }
            Err(error) => {
                let code = error.spooler_error().and_then(SpoolerError::code);
                self.logging.error(&describe_failure(&error.to_string(), code));
                OperationResult::from(&error)
            }
        }
    }

    /// Runs one raw job: open, start document, start page, write, end page,
    /// end document, close. The printer handle is released on every path.
    pub(crate) fn try_print_text(&self, printer_name: &str, text: &str) -> Result<(), PrintError> {
        let mut guard = PrinterHandleGuard::acquire(&self.spooler, printer_name, &self.logging)
            .map_err(|source| PrintError::Acquire {
                printer: printer_name.to_string(),
                source,
            })?;

        let submitted = submit_raw_job(
            &self.spooler,
            guard.handle_mut(),
            printer_name,
            text.as_bytes(),
        );

        let released = guard.release();
        match (submitted, released) {
            (Err(error), Err(release_error)) => {
                self.logging.warn(&format!(
                    "failed to release printer '{printer_name}' after error: {release_error}"
                ));
                Err(error)
            }
            (Err(error), Ok(())) => Err(error),
            (Ok(()), Err(source)) => Err(PrintError::Release {
                printer: printer_name.to_string(),
                source,
            }),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

fn submit_raw_job<S: PrintSpooler>(
    spooler: &S,
    handle: &mut S::Handle,
    printer_name: &str,
    payload: &[u8],
) -> Result<(), PrintError> {
    let printer = || printer_name.to_string();

    spooler
        .start_document(handle, &DocumentInfo::RAW_RECEIPT)
        .map_err(|source| PrintError::JobStart {
            printer: printer(),
            stage: JobStage::Document,
            source,
        })?;
    spooler
        .start_page(handle)
        .map_err(|source| PrintError::JobStart {
            printer: printer(),
            stage: JobStage::Page,
            source,
        })?;

    let mut offset = 0;
    while offset < payload.len() {
        let accepted = spooler
            .write(handle, &payload[offset..])
            .map_err(|source| PrintError::Write {
                printer: printer(),
                source,
            })?;
        if accepted == 0 {
            return Err(PrintError::ShortWrite {
                printer: printer(),
                written: offset,
                expected: payload.len(),
            });
        }
        offset += accepted.min(payload.len() - offset);
    }

    spooler
        .end_page(handle)
        .map_err(|source| PrintError::JobTeardown {
            printer: printer(),
            stage: JobStage::Page,
            source,
        })?;
    spooler
        .end_document(handle)
        .map_err(|source| PrintError::JobTeardown {
            printer: printer(),
            stage: JobStage::Document,
            source,
        })
}

/// Owns an open printer handle and closes it exactly once.
pub(crate) struct PrinterHandleGuard<'a, S: PrintSpooler> {
    spooler: &'a S,
    handle: S::Handle,
    printer_name: &'a str,
    logging: &'a LoggingContext,
    released: bool,
}

impl<'a, S: PrintSpooler> PrinterHandleGuard<'a, S> {
    pub(crate) fn acquire(
        spooler: &'a S,
        printer_name: &'a str,
        logging: &'a LoggingContext,
    ) -> Result<Self, SpoolerError> {
        let handle = spooler.open_printer(printer_name)?;
        Ok(Self {
            spooler,
            handle,
            printer_name,
            logging,
            released: false,
        })
    }

    pub(crate) fn handle_mut(&mut self) -> &mut S::Handle {
        &mut self.handle
    }

    pub(crate) fn release(&mut self) -> Result<(), SpoolerError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.spooler.close_printer(&mut self.handle)
    }
}

impl<S: PrintSpooler> Drop for PrinterHandleGuard<'_, S> {
    fn drop(&mut self) {
        if let Err(error) = self.release() {
            self.logging.warn(&format!(
                "failed to release printer '{}': {error}",
                self.printer_name
            ));
        }
    }
}

fn source_code(error: &ListPrintersError) -> Option<i32> {
    match error {
        ListPrintersError::Enumerate(source) | ListPrintersError::DefaultPrinter(source) => {
            source.code()
        }
    }
}

fn describe_failure(message: &str, code: Option<i32>) -> String {
    match code {
        Some(code) => format!("{message} (os error {code})"),
        None => message.to_string(),
    }
}
