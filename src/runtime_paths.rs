use std::{
    env,
    path::{Path, PathBuf},
};

use tauri::{Env, PackageInfo};

use crate::{CONFIG_FILE_NAME, CONFIG_PATH_ENV};

/// Resource directory of the installed bundle, or `None` when running from a
/// development build.
pub(crate) fn packaged_bundle_dir(package_info: &PackageInfo) -> Option<PathBuf> {
    if !cfg!(all(feature = "custom-protocol", not(debug_assertions))) {
        return None;
    }

    tauri::utils::platform::resource_dir(package_info, &Env::default()).ok()
}

pub(crate) fn resolve_resource_path(relative_path: &str, bundle_dir: Option<&Path>) -> PathBuf {
    let base_dir = match bundle_dir {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    absolutize(base_dir.join(relative_path))
}

pub(crate) fn resolve_config_path(bundle_dir: Option<&Path>) -> PathBuf {
    let override_path = env::var(CONFIG_PATH_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    match override_path {
        Some(path) => resolve_resource_path(&path, bundle_dir),
        None => resolve_resource_path(CONFIG_FILE_NAME, bundle_dir),
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}
