use tauri::State;

use crate::{ListPrintersResponse, OperationResult, SystemPrinterBridge};

#[tauri::command]
pub(crate) fn list_printers(bridge: State<'_, SystemPrinterBridge>) -> ListPrintersResponse {
    bridge.list_printers()
}

#[tauri::command(rename_all = "snake_case")]
pub(crate) fn print_text(
    bridge: State<'_, SystemPrinterBridge>,
    printer_name: String,
    text: String,
) -> OperationResult {
    bridge.print_text(&printer_name, &text)
}
