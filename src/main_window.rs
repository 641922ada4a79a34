use tauri::{AppHandle, Runtime, WebviewUrl, WebviewWindowBuilder};

use crate::{
    shell_config::ShellConfig, MAIN_WINDOW_HEIGHT, MAIN_WINDOW_LABEL, MAIN_WINDOW_TITLE,
    MAIN_WINDOW_WIDTH,
};

pub(crate) fn open_main_window<R: Runtime>(
    app_handle: &AppHandle<R>,
    shell: &ShellConfig,
) -> Result<(), String> {
    WebviewWindowBuilder::new(
        app_handle,
        MAIN_WINDOW_LABEL,
        WebviewUrl::External(shell.web_url.clone()),
    )
    .title(MAIN_WINDOW_TITLE)
    .inner_size(MAIN_WINDOW_WIDTH, MAIN_WINDOW_HEIGHT)
    .center()
    .build()
    .map(|_| ())
    .map_err(|error| format!("Failed to create main window for {}: {error}", shell.web_url))
}
