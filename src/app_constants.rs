pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const MAIN_WINDOW_TITLE: &str = "Posterita Printer Utility";
pub(crate) const MAIN_WINDOW_WIDTH: f64 = 1280.0;
pub(crate) const MAIN_WINDOW_HEIGHT: f64 = 800.0;

pub(crate) const CONFIG_FILE_NAME: &str = "config.properties";
pub(crate) const CONFIG_PATH_ENV: &str = "PRINTER_UTILITY_CONFIG";
pub(crate) const WEB_URL_KEY: &str = "web.url";

pub(crate) const LOG_APP_DIR_NAME: &str = "PosteritaPrinterUtility";
pub(crate) const LOG_FILE_PREFIX: &str = "printer_utility";
pub(crate) const LOG_FILTER_ENV: &str = "PRINTER_UTILITY_LOG";
pub(crate) const LOG_MAX_BYTES: u64 = 1024 * 1024;
pub(crate) const LOG_BACKUP_COUNT: usize = 5;

pub(crate) const PRINT_JOB_NAME: &str = "Receipt";
pub(crate) const PRINT_DATATYPE_RAW: &str = "RAW";

pub(crate) const PRINTER_BRIDGE_CAPABILITY: &str = "printer-bridge";
pub(crate) const PRINTER_BRIDGE_READY_EVENT: &str = "printerbridge-ready";
