#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_config;
mod app_constants;
mod app_runtime;
mod app_types;
mod bridge_errors;
mod desktop_bridge;
mod desktop_bridge_commands;
mod logging;
mod main_window;
mod print_spooler;
mod printer_bridge;
mod runtime_paths;
mod shell_config;
#[cfg(unix)]
mod spooler_cups;
#[cfg(windows)]
mod spooler_winspool;
mod startup_failure;
mod window_actions;

pub(crate) use app_constants::*;
pub(crate) use app_types::{ListPrintersResponse, OperationResult, PrinterList};
pub(crate) use logging::LoggingContext;
pub(crate) use print_spooler::SystemSpooler;
pub(crate) use printer_bridge::PrinterBridge;

pub(crate) type SystemPrinterBridge = PrinterBridge<SystemSpooler>;

fn main() {
    app_runtime::run();
}
