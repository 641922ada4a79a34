use std::{
    collections::{HashMap, HashSet},
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::WEB_URL_KEY;

const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("Config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid config {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("Failed to parse config {} at line {line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Loads `web.url` from a flat `key=value` properties file.
///
/// The returned value is trimmed and never empty.
pub(crate) fn load_config(path: &Path) -> Result<String, ConfigError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let content = String::from_utf8(raw).map_err(|error| ConfigError::Parse {
        path: path.to_path_buf(),
        line: line_of_byte_offset(error.as_bytes(), error.utf8_error().valid_up_to()),
        reason: "file is not valid UTF-8".to_string(),
    })?;

    let entries = parse_properties(&content).map_err(|error| ConfigError::Parse {
        path: path.to_path_buf(),
        line: error.line,
        reason: error.reason,
    })?;

    let web_url = entries
        .get(WEB_URL_KEY)
        .map(|value| value.trim())
        .unwrap_or_default();
    if web_url.is_empty() {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: format!("missing '{WEB_URL_KEY}' entry"),
        });
    }

    Ok(web_url.to_string())
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct PropertiesError {
    pub(crate) line: usize,
    pub(crate) reason: String,
}

/// Parses the implicit leading section of a properties file.
///
/// Entries under a `[section]` header are validated like any other line but
/// only the implicit section's values are returned. An explicit `[DEFAULT]`
/// header names the implicit section again.
pub(crate) fn parse_properties(content: &str) -> Result<HashMap<String, String>, PropertiesError> {
    let mut entries: HashMap<String, String> = HashMap::new();
    let mut named_sections: HashMap<String, HashSet<String>> = HashMap::new();
    let mut current_section: Option<String> = None;
    let mut current_key: Option<String> = None;

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.strip_prefix('\u{feff}').unwrap_or(raw_line);
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            if let Some(key) = current_key.as_ref() {
                if current_section.is_none() {
                    if let Some(value) = entries.get_mut(key) {
                        if !value.is_empty() {
                            value.push('\n');
                        }
                        value.push_str(trimmed);
                    }
                }
                continue;
            }
        }

        if let Some(name) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            current_key = None;
            if name == DEFAULT_SECTION {
                current_section = None;
                continue;
            }
            if named_sections.contains_key(name) {
                return Err(PropertiesError {
                    line: line_number,
                    reason: format!("duplicate section '{name}'"),
                });
            }
            named_sections.insert(name.to_string(), HashSet::new());
            current_section = Some(name.to_string());
            continue;
        }

        let Some(delimiter) = trimmed.find(['=', ':']) else {
            return Err(PropertiesError {
                line: line_number,
                reason: format!("expected 'key=value', found '{trimmed}'"),
            });
        };

        let key = trimmed[..delimiter].trim();
        let value = trimmed[delimiter + 1..].trim();
        if key.is_empty() {
            return Err(PropertiesError {
                line: line_number,
                reason: "entry has an empty key".to_string(),
            });
        }

        let is_new_key = match current_section.as_ref() {
            None => !entries.contains_key(key),
            Some(section) => named_sections
                .get_mut(section)
                .is_some_and(|keys| keys.insert(key.to_string())),
        };
        if !is_new_key {
            return Err(PropertiesError {
                line: line_number,
                reason: format!("duplicate key '{key}'"),
            });
        }

        if current_section.is_none() {
            entries.insert(key.to_string(), value.to_string());
        }
        current_key = Some(key.to_string());
    }

    Ok(entries)
}

fn line_of_byte_offset(bytes: &[u8], offset: usize) -> usize {
    bytes[..offset.min(bytes.len())]
        .iter()
        .filter(|byte| **byte == b'\n')
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(dir: &tempfile::TempDir, content: &[u8]) -> PathBuf {
        let path = dir.path().join("config.properties");
        fs::write(&path, content).expect("write config fixture");
        path
    }

    #[test]
    fn load_config_returns_trimmed_web_url() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_config(&dir, b"web.url = https://example.test/pos\n");

        let url = load_config(&path).expect("config should load");
        assert_eq!(url, "https://example.test/pos");
    }

    #[test]
    fn load_config_ignores_comments_and_other_keys() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_config(
            &dir,
            b"# terminal settings\n; legacy comment\n\nstore.id=42\nweb.url: https://example.test/a%20b\n",
        );

        assert_eq!(
            load_config(&path).expect("config should load"),
            "https://example.test/a%20b"
        );
    }

    #[test]
    fn load_config_accepts_utf8_bom() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_config(&dir, "\u{feff}web.url=https://example.test/\n".as_bytes());

        assert_eq!(
            load_config(&path).expect("config should load"),
            "https://example.test/"
        );
    }

    #[test]
    fn load_config_reports_missing_file_as_not_found() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("missing.properties");

        let error = load_config(&path).expect_err("missing file must fail");
        assert!(matches!(error, ConfigError::NotFound { path: ref p } if p == &path));
    }

    #[test]
    fn load_config_rejects_missing_key() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_config(&dir, b"store.id=42\n");

        let error = load_config(&path).expect_err("missing key must fail");
        assert!(matches!(error, ConfigError::Invalid { .. }));
    }

    #[test]
    fn load_config_rejects_blank_value() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_config(&dir, b"web.url =    \n");

        let error = load_config(&path).expect_err("blank value must fail");
        assert!(matches!(error, ConfigError::Invalid { .. }));
    }

    #[test]
    fn load_config_reports_malformed_line_number() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_config(&dir, b"web.url=https://example.test/\nthis line is garbage\n");

        let error = load_config(&path).expect_err("garbage line must fail");
        match error {
            ConfigError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_config_rejects_non_utf8_content() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_config(&dir, b"store.id=1\nweb.url=\xff\xfe\n");

        let error = load_config(&path).expect_err("invalid utf-8 must fail");
        match error {
            ConfigError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_properties_keeps_key_case_and_joins_continuations() {
        let entries =
            parse_properties("Web.Url=first\n  second\nweb.url=lower\n").expect("parse");

        assert_eq!(entries.get("Web.Url").map(String::as_str), Some("first\nsecond"));
        assert_eq!(entries.get("web.url").map(String::as_str), Some("lower"));
    }

    #[test]
    fn parse_properties_rejects_duplicate_keys() {
        let error = parse_properties("web.url=a\nweb.url=b\n").expect_err("duplicate must fail");
        assert_eq!(error.line, 2);
    }

    #[test]
    fn parse_properties_hides_entries_after_section_header() {
        let entries =
            parse_properties("store.id=1\n[printing]\nweb.url=https://example.test/\n")
                .expect("parse");

        assert_eq!(entries.get("store.id").map(String::as_str), Some("1"));
        assert!(!entries.contains_key("web.url"));
    }

    #[test]
    fn load_config_reads_web_url_under_explicit_default_header() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_config(&dir, b"[DEFAULT]\nweb.url=https://example.test/\n");

        assert_eq!(
            load_config(&path).expect("config should load"),
            "https://example.test/"
        );
    }

    #[test]
    fn parse_properties_returns_to_implicit_section_on_default_header() {
        let entries = parse_properties(
            "store.id=1\n[printing]\nwidth=42\n[DEFAULT]\nweb.url=https://example.test/\n",
        )
        .expect("parse");

        assert_eq!(
            entries.get("web.url").map(String::as_str),
            Some("https://example.test/")
        );
        assert!(!entries.contains_key("width"));
    }

    #[test]
    fn load_config_reports_malformed_line_inside_named_section() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_config(&dir, b"web.url=https://example.test/\n[main]\ngarbage line\n");

        let error = load_config(&path).expect_err("garbage line must fail");
        match error {
            ConfigError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_properties_rejects_duplicate_keys_inside_named_section() {
        let error = parse_properties("web.url=a\n[main]\nwidth=1\nwidth=2\n")
            .expect_err("duplicate must fail");
        assert_eq!(error.line, 4);
    }

    #[test]
    fn parse_properties_allows_same_key_in_different_sections() {
        let entries = parse_properties("width=1\n[main]\nwidth=2\n[kitchen]\nwidth=3\n")
            .expect("parse");

        assert_eq!(entries.get("width").map(String::as_str), Some("1"));
    }

    #[test]
    fn parse_properties_rejects_repeated_section_header() {
        let error = parse_properties("[main]\na=1\n[main]\nb=2\n")
            .expect_err("repeated section must fail");
        assert_eq!(error.line, 3);
    }

    #[test]
    fn parse_properties_rejects_empty_key() {
        let error = parse_properties("=value\n").expect_err("empty key must fail");
        assert_eq!(error.line, 1);
    }
}
