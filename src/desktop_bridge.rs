use tauri::{ipc::CapabilityBuilder, AppHandle, Manager, Runtime, Webview};
use url::Url;

use crate::{
    logging::LoggingContext, MAIN_WINDOW_LABEL, PRINTER_BRIDGE_CAPABILITY,
    PRINTER_BRIDGE_READY_EVENT,
};

const BRIDGE_PERMISSIONS: [&str; 2] = ["allow-list-printers", "allow-print-text"];

/// Only pages served from the configured origin get the printer bridge.
pub(crate) fn should_inject_printer_bridge(shell_url: &Url, page_url: &Url) -> bool {
    let shell_origin = shell_url.origin();
    shell_origin.is_tuple() && shell_origin == page_url.origin()
}

/// URL pattern granting the configured origin access to the bridge commands.
pub(crate) fn remote_origin_pattern(shell_url: &Url) -> Option<String> {
    let origin = shell_url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/*", origin.ascii_serialization()))
}

pub(crate) fn grant_printer_bridge_access<R: Runtime>(
    app_handle: &AppHandle<R>,
    shell_url: &Url,
) -> Result<(), String> {
    let pattern = remote_origin_pattern(shell_url).ok_or_else(|| {
        format!("Cannot grant printer access to opaque origin of {shell_url}")
    })?;

    let capability = BRIDGE_PERMISSIONS.iter().fold(
        CapabilityBuilder::new(PRINTER_BRIDGE_CAPABILITY)
            .remote(pattern)
            .window(MAIN_WINDOW_LABEL),
        |builder, permission| builder.permission(*permission),
    );
    app_handle
        .add_capability(capability)
        .map_err(|error| format!("Failed to register printer bridge capability: {error}"))
}

pub(crate) fn printer_bridge_script() -> String {
    let ready_event = serde_json::to_string(PRINTER_BRIDGE_READY_EVENT)
        .unwrap_or_else(|_| "\"printerbridge-ready\"".to_string());
    format!(
        r#"(function () {{
  if (window.printerBridge && window.printerBridge.native === true) {{
    return;
  }}
  var internals = window.__TAURI_INTERNALS__;
  if (!internals || typeof internals.invoke !== "function") {{
    console.warn("printer bridge unavailable: IPC is not ready");
    return;
  }}
  var bridge = {{
    native: true,
    listPrinters: function () {{
      return internals.invoke("list_printers");
    }},
    printText: function (printerName, text) {{
      return internals.invoke("print_text", {{ printer_name: printerName, text: text }});
    }}
  }};
  bridge.list_printers = bridge.listPrinters;
  bridge.print_text = bridge.printText;
  window.printerBridge = Object.freeze(bridge);
  window.dispatchEvent(new Event({ready_event}));
}})();"#
    )
}

pub(crate) fn inject_printer_bridge<R: Runtime>(webview: &Webview<R>, logging: &LoggingContext) {
    if let Err(error) = webview.eval(&printer_bridge_script()) {
        logging.warn(&format!("failed to inject printer bridge: {error}"));
    }
}
