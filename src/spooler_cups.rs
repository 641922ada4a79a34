use std::{
    io::Write,
    path::PathBuf,
    process::{Child, Command, Stdio},
};

use crate::print_spooler::{DocumentInfo, PrintSpooler, SpoolerError};

const LP_PROGRAM: &str = "lp";
const LPSTAT_PROGRAM: &str = "lpstat";
const NO_DEFAULT_DESTINATION: &str = "no system default destination";
const DEFAULT_DESTINATION_PREFIX: &str = "system default destination:";

/// CUPS spooler driven through the `lp`/`lpstat` command-line tools.
#[derive(Debug, Clone)]
pub(crate) struct CupsSpooler {
    lp_program: PathBuf,
    lpstat_program: PathBuf,
}

impl Default for CupsSpooler {
    fn default() -> Self {
        Self {
            lp_program: PathBuf::from(LP_PROGRAM),
            lpstat_program: PathBuf::from(LPSTAT_PROGRAM),
        }
    }
}

#[derive(Debug)]
pub(crate) struct CupsPrinterHandle {
    printer: String,
    job: Option<Child>,
}

impl CupsSpooler {
    #[cfg(test)]
    pub(crate) fn with_programs(lp_program: PathBuf, lpstat_program: PathBuf) -> Self {
        Self {
            lp_program,
            lpstat_program,
        }
    }

    fn run_lpstat(&self, args: &[&str]) -> Result<String, SpoolerError> {
        let output = Command::new(&self.lpstat_program)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
            .map_err(|error| {
                SpoolerError::new(format!(
                    "Failed to run '{}': {error}",
                    self.lpstat_program.display()
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        // lpstat exits non-zero when no destinations exist at all.
        if stdout.trim().is_empty() && stderr.contains("No destinations added") {
            return Ok(String::new());
        }
        Err(command_failure(&self.lpstat_program, output.status.code(), &stderr))
    }
}

impl PrintSpooler for CupsSpooler {
    type Handle = CupsPrinterHandle;

    fn enumerate_printers(&self) -> Result<Vec<String>, SpoolerError> {
        self.run_lpstat(&["-e"]).map(|stdout| parse_destinations(&stdout))
    }

    fn default_printer(&self) -> Result<Option<String>, SpoolerError> {
        self.run_lpstat(&["-d"])
            .map(|stdout| parse_default_destination(&stdout))
    }

    fn open_printer(&self, printer_name: &str) -> Result<CupsPrinterHandle, SpoolerError> {
        let known = self.enumerate_printers()?;
        if !known.iter().any(|name| name == printer_name) {
            return Err(SpoolerError::new(format!(
                "The printer or class '{printer_name}' does not exist."
            )));
        }

        Ok(CupsPrinterHandle {
            printer: printer_name.to_string(),
            job: None,
        })
    }

    fn start_document(
        &self,
        handle: &mut CupsPrinterHandle,
        document: &DocumentInfo<'_>,
    ) -> Result<(), SpoolerError> {
        if handle.job.is_some() {
            return Err(SpoolerError::new(format!(
                "A document is already open on '{}'.",
                handle.printer
            )));
        }
        if let Some(output_file) = document.output_file {
            return Err(SpoolerError::new(format!(
                "Redirecting print output to '{output_file}' is not supported by CUPS."
            )));
        }

        let child = Command::new(&self.lp_program)
            .args(lp_arguments(&handle.printer, document))
            .env("LC_ALL", "C")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                SpoolerError::new(format!(
                    "Failed to run '{}': {error}",
                    self.lp_program.display()
                ))
            })?;
        handle.job = Some(child);
        Ok(())
    }

    fn start_page(&self, handle: &mut CupsPrinterHandle) -> Result<(), SpoolerError> {
        open_job(handle).map(|_| ())
    }

    fn write(&self, handle: &mut CupsPrinterHandle, bytes: &[u8]) -> Result<usize, SpoolerError> {
        let printer = handle.printer.clone();
        let stdin = open_job(handle)?
            .stdin
            .as_mut()
            .ok_or_else(|| SpoolerError::new(format!("Print stream to '{printer}' is closed.")))?;
        stdin.write_all(bytes).map_err(|error| {
            SpoolerError::new(format!("Failed to stream job data to '{printer}': {error}"))
        })?;
        Ok(bytes.len())
    }

    fn end_page(&self, handle: &mut CupsPrinterHandle) -> Result<(), SpoolerError> {
        open_job(handle).map(|_| ())
    }

    fn end_document(&self, handle: &mut CupsPrinterHandle) -> Result<(), SpoolerError> {
        let Some(mut child) = handle.job.take() else {
            return Err(SpoolerError::new(format!(
                "No document is open on '{}'.",
                handle.printer
            )));
        };

        // Closing stdin lets lp submit the job.
        drop(child.stdin.take());
        let output = child.wait_with_output().map_err(|error| {
            SpoolerError::new(format!("Failed to wait for '{}': {error}", LP_PROGRAM))
        })?;
        if !output.status.success() {
            return Err(command_failure(
                &self.lp_program,
                output.status.code(),
                &String::from_utf8_lossy(&output.stderr),
            ));
        }
        Ok(())
    }

    fn close_printer(&self, handle: &mut CupsPrinterHandle) -> Result<(), SpoolerError> {
        // An unfinished lp process is killed so the partial job is never submitted.
        if let Some(mut child) = handle.job.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        Ok(())
    }
}

fn open_job(handle: &mut CupsPrinterHandle) -> Result<&mut Child, SpoolerError> {
    let printer = &handle.printer;
    handle
        .job
        .as_mut()
        .ok_or_else(|| SpoolerError::new(format!("No document is open on '{printer}'.")))
}

pub(crate) fn lp_arguments(printer_name: &str, document: &DocumentInfo<'_>) -> Vec<String> {
    let mut args = vec![
        "-d".to_string(),
        printer_name.to_string(),
        "-t".to_string(),
        document.name.to_string(),
    ];
    if document.datatype.eq_ignore_ascii_case("raw") {
        args.push("-o".to_string());
        args.push("raw".to_string());
    }
    args
}

pub(crate) fn parse_destinations(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub(crate) fn parse_default_destination(stdout: &str) -> Option<String> {
    stdout.lines().map(str::trim).find_map(|line| {
        if line.starts_with(NO_DEFAULT_DESTINATION) {
            return None;
        }
        line.strip_prefix(DEFAULT_DESTINATION_PREFIX)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
    })
}

fn command_failure(program: &std::path::Path, code: Option<i32>, stderr: &str) -> SpoolerError {
    let detail = stderr.trim();
    let message = if detail.is_empty() {
        format!("'{}' failed", program.display())
    } else {
        format!("'{}' failed: {detail}", program.display())
    };
    match code {
        Some(code) => SpoolerError::with_code(message, code),
        None => SpoolerError::new(message),
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, os::unix::fs::PermissionsExt, path::Path};

    use super::*;
    use pretty_assertions::assert_eq;

    const FAKE_LPSTAT: &str = r#"#!/bin/sh
case "$1" in
  -e) printf 'HP-1\nVirtual-PDF\n' ;;
  -d) echo 'system default destination: HP-1' ;;
esac
"#;

    fn install_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        path
    }

    /// `lp` stand-in recording its arguments and publishing the job only
    /// after stdin reaches end of file.
    fn recording_spooler(dir: &Path) -> CupsSpooler {
        let lp_body = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{dir}/args'\ncat > '{dir}/job.part' && mv '{dir}/job.part' '{dir}/job'\n",
            dir = dir.display()
        );
        CupsSpooler::with_programs(
            install_script(dir, "lp", &lp_body),
            install_script(dir, "lpstat", FAKE_LPSTAT),
        )
    }

    #[test]
    fn enumerates_and_reports_default_through_lpstat() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let spooler = recording_spooler(dir.path());

        assert_eq!(
            spooler.enumerate_printers().expect("enumerate"),
            vec!["HP-1", "Virtual-PDF"]
        );
        assert_eq!(
            spooler.default_printer().expect("default printer"),
            Some("HP-1".to_string())
        );
    }

    #[test]
    fn raw_job_streams_exact_bytes_to_lp() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let spooler = recording_spooler(dir.path());

        let mut handle = spooler.open_printer("HP-1").expect("open printer");
        spooler
            .start_document(&mut handle, &DocumentInfo::RAW_RECEIPT)
            .expect("start document");
        spooler.start_page(&mut handle).expect("start page");
        let payload = "Total €\n".as_bytes();
        assert_eq!(spooler.write(&mut handle, payload).expect("write"), payload.len());
        spooler.end_page(&mut handle).expect("end page");
        spooler.end_document(&mut handle).expect("end document");
        spooler.close_printer(&mut handle).expect("close printer");

        assert_eq!(
            fs::read_to_string(dir.path().join("args")).expect("read args"),
            "-d\nHP-1\n-t\nReceipt\n-o\nraw\n"
        );
        assert_eq!(fs::read(dir.path().join("job")).expect("read job"), payload);
    }

    #[test]
    fn released_unfinished_job_is_never_submitted() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let spooler = recording_spooler(dir.path());

        let mut handle = spooler.open_printer("HP-1").expect("open printer");
        spooler
            .start_document(&mut handle, &DocumentInfo::RAW_RECEIPT)
            .expect("start document");
        spooler.write(&mut handle, b"partial").expect("write");
        spooler.close_printer(&mut handle).expect("close printer");

        assert!(!dir.path().join("job").exists());
        assert!(handle.job.is_none());
    }

    #[test]
    fn failing_lp_reports_exit_status_and_stderr() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let spooler = CupsSpooler::with_programs(
            install_script(
                dir.path(),
                "lp",
                "#!/bin/sh\ncat > /dev/null\necho 'lp: Unsupported document-format' >&2\nexit 3\n",
            ),
            install_script(dir.path(), "lpstat", FAKE_LPSTAT),
        );

        let mut handle = spooler.open_printer("HP-1").expect("open printer");
        spooler
            .start_document(&mut handle, &DocumentInfo::RAW_RECEIPT)
            .expect("start document");
        spooler.write(&mut handle, b"receipt").expect("write");
        let error = spooler
            .end_document(&mut handle)
            .expect_err("failing lp must fail");

        assert_eq!(error.code(), Some(3));
        assert!(error.to_string().contains("Unsupported document-format"), "{error}");
    }

    #[test]
    fn open_printer_rejects_unknown_destination() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let spooler = recording_spooler(dir.path());

        let error = spooler
            .open_printer("Ghost")
            .expect_err("unknown printer must fail");
        assert!(error.to_string().contains("Ghost"), "{error}");
    }

    #[test]
    fn start_document_rejects_output_file_redirect() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let spooler = recording_spooler(dir.path());
        let mut handle = spooler.open_printer("HP-1").expect("open printer");
        let document = DocumentInfo {
            name: "Receipt",
            output_file: Some("/tmp/receipt.prn"),
            datatype: "RAW",
        };

        assert!(spooler.start_document(&mut handle, &document).is_err());
        assert!(handle.job.is_none());
    }

    #[test]
    fn parse_destinations_keeps_spooler_order() {
        let stdout = "Virtual-PDF\nHP-1\n\n  Kitchen_Receipt  \n";

        assert_eq!(
            parse_destinations(stdout),
            vec!["Virtual-PDF", "HP-1", "Kitchen_Receipt"]
        );
    }

    #[test]
    fn parse_default_destination_reads_named_default() {
        assert_eq!(
            parse_default_destination("system default destination: HP-1\n"),
            Some("HP-1".to_string())
        );
    }

    #[test]
    fn parse_default_destination_handles_missing_default() {
        assert_eq!(
            parse_default_destination("no system default destination\n"),
            None
        );
        assert_eq!(parse_default_destination(""), None);
    }

    #[test]
    fn lp_arguments_request_raw_receipt_job() {
        assert_eq!(
            lp_arguments("HP-1", &DocumentInfo::RAW_RECEIPT),
            vec!["-d", "HP-1", "-t", "Receipt", "-o", "raw"]
        );
    }

    #[test]
    fn lp_arguments_skip_raw_option_for_other_datatypes() {
        let document = DocumentInfo {
            name: "Report",
            output_file: None,
            datatype: "TEXT",
        };

        assert_eq!(
            lp_arguments("HP-1", &document),
            vec!["-d", "HP-1", "-t", "Report"]
        );
    }

    #[test]
    fn open_printer_fails_when_lpstat_is_unavailable() {
        let missing = tempfile::tempdir().expect("create temp dir");
        let spooler = CupsSpooler::with_programs(
            missing.path().join("lp"),
            missing.path().join("lpstat"),
        );

        let error = spooler
            .open_printer("HP-1")
            .expect_err("missing lpstat must fail");
        assert!(error.to_string().contains("lpstat"), "{error}");
    }

    #[test]
    fn page_operations_require_an_open_document() {
        let spooler = CupsSpooler::default();
        let mut handle = CupsPrinterHandle {
            printer: "HP-1".to_string(),
            job: None,
        };

        assert!(spooler.start_page(&mut handle).is_err());
        assert!(spooler.write(&mut handle, b"hello").is_err());
        assert!(spooler.end_document(&mut handle).is_err());
        assert!(spooler.close_printer(&mut handle).is_ok());
    }
}
