use std::io::{self, BufRead, Write};

use tauri::{AppHandle, Runtime};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

use crate::{logging::LoggingContext, MAIN_WINDOW_TITLE};

/// Shows a blocking error dialog and exits once the user acknowledges it.
pub(crate) fn show_startup_error<R: Runtime>(
    app_handle: &AppHandle<R>,
    logging: &LoggingContext,
    message: &str,
) {
    logging.error(&format!("startup failed: {message}"));

    let exit_handle = app_handle.clone();
    app_handle
        .dialog()
        .message(startup_error_text(message))
        .title(MAIN_WINDOW_TITLE)
        .kind(MessageDialogKind::Error)
        .buttons(MessageDialogButtons::Ok)
        .show(move |_| exit_handle.exit(1));
}

/// Fallback when no GUI can be shown at all.
pub(crate) fn wait_for_console_acknowledgement(logging: &LoggingContext, message: &str) {
    logging.error(&format!("startup failed: {message}"));
    eprint!("Press Enter to exit...");
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

pub(crate) fn startup_error_text(message: &str) -> String {
    format!("{MAIN_WINDOW_TITLE} could not start.\n\n{message}")
}
