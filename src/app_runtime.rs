use tauri::{webview::PageLoadEvent, Manager, RunEvent};

use crate::{
    desktop_bridge, logging, main_window, runtime_paths,
    shell_config::{self, ShellConfig},
    startup_failure, window_actions, LoggingContext, PrinterBridge, SystemPrinterBridge,
    SystemSpooler,
};

pub(crate) fn run() {
    let context = tauri::generate_context!();
    let logging = logging::init_process_logging();
    logging.info("desktop process starting");

    let bundle_dir = runtime_paths::packaged_bundle_dir(context.package_info());
    match &bundle_dir {
        Some(dir) => logging.info(&format!("running from bundle: {}", dir.display())),
        None => logging.info("running from working directory"),
    }

    match shell_config::load_shell_config(bundle_dir.as_deref()) {
        Ok(shell) => {
            logging.info(&format!("config loaded: {}", shell.config_path.display()));
            logging.info(&format!("Loading Web URL: {}", shell.web_url));
            run_shell(context, logging, shell);
        }
        Err(error) => report_startup_failure(context, logging, error.to_string()),
    }
}

fn run_shell(context: tauri::Context<tauri::Wry>, logging: LoggingContext, shell: ShellConfig) {
    let bridge: SystemPrinterBridge = PrinterBridge::new(SystemSpooler::default(), logging.clone());
    let instance_logging = logging.clone();
    let setup_logging = logging.clone();
    let exit_logging = logging.clone();
    let setup_shell = shell.clone();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(move |app, _args, _cwd| {
            instance_logging.info("second instance requested; focusing main window");
            window_actions::show_main_window(app, |message| instance_logging.warn(message));
        }))
        .plugin(tauri_plugin_dialog::init())
        .manage(bridge)
        .manage(shell)
        .manage(logging.clone())
        .invoke_handler(tauri::generate_handler![
            crate::desktop_bridge_commands::list_printers,
            crate::desktop_bridge_commands::print_text,
        ])
        .on_page_load(|webview, payload| {
            let app_handle = webview.app_handle();
            let logging = app_handle.state::<LoggingContext>();
            let shell = app_handle.state::<ShellConfig>();
            match payload.event() {
                PageLoadEvent::Started => {
                    logging.info(&format!("page-load started: {}", payload.url()));
                }
                PageLoadEvent::Finished => {
                    logging.info(&format!("page-load finished: {}", payload.url()));
                }
            }
            if desktop_bridge::should_inject_printer_bridge(&shell.web_url, payload.url()) {
                desktop_bridge::inject_printer_bridge(webview, &logging);
            }
        })
        .setup(move |app| {
            let app_handle = app.handle().clone();
            let opened =
                desktop_bridge::grant_printer_bridge_access(&app_handle, &setup_shell.web_url)
                    .and_then(|()| main_window::open_main_window(&app_handle, &setup_shell));
            if let Err(error) = opened {
                startup_failure::show_startup_error(&app_handle, &setup_logging, &error);
            }
            Ok(())
        })
        .build(context);

    match app {
        Ok(app) => app.run(move |_app_handle, event| {
            if let RunEvent::Exit = event {
                exit_logging.info("desktop process exiting");
            }
        }),
        Err(error) => {
            startup_failure::wait_for_console_acknowledgement(
                &logging,
                &format!("Failed to start the desktop runtime: {error}"),
            );
            std::process::exit(1);
        }
    }
}

fn report_startup_failure(
    context: tauri::Context<tauri::Wry>,
    logging: LoggingContext,
    message: String,
) {
    let setup_logging = logging.clone();
    let setup_message = message.clone();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(move |app| {
            startup_failure::show_startup_error(app.handle(), &setup_logging, &setup_message);
            Ok(())
        })
        .build(context);

    match app {
        Ok(app) => app.run(|_, _| {}),
        Err(error) => {
            logging.error(&format!("Failed to start the desktop runtime: {error}"));
            startup_failure::wait_for_console_acknowledgement(&logging, &message);
            std::process::exit(1);
        }
    }
}
