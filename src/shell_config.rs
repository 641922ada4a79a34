use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use crate::{app_config, app_config::ConfigError, runtime_paths};

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid 'web.url' value '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },
}

/// Everything the shell needs to open its window.
#[derive(Debug, Clone)]
pub(crate) struct ShellConfig {
    pub(crate) web_url: Url,
    pub(crate) config_path: PathBuf,
}

pub(crate) fn load_shell_config(bundle_dir: Option<&Path>) -> Result<ShellConfig, StartupError> {
    let config_path = runtime_paths::resolve_config_path(bundle_dir);
    let raw_url = app_config::load_config(&config_path)?;
    let web_url = parse_web_url(&raw_url)?;
    Ok(ShellConfig {
        web_url,
        config_path,
    })
}

pub(crate) fn parse_web_url(raw_url: &str) -> Result<Url, StartupError> {
    let invalid = |reason: String| StartupError::InvalidUrl {
        value: raw_url.to_string(),
        reason,
    };

    let parsed = Url::parse(raw_url).map_err(|error| invalid(error.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(invalid(format!(
            "unsupported URL scheme '{scheme}', only http/https are allowed"
        ))),
    }
}
