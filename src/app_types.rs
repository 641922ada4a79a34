use serde::Serialize;

use crate::bridge_errors::{ListPrintersError, PrintError};

/// Outcome of a bridge operation as seen by the hosted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(crate) enum OperationResult {
    Success {
        message: String,
    },
    Error {
        kind: &'static str,
        message: String,
    },
}

impl OperationResult {
    pub(crate) fn success(message: impl Into<String>) -> Self {
        OperationResult::Success {
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success { .. })
    }
}

impl From<&PrintError> for OperationResult {
    fn from(error: &PrintError) -> Self {
        OperationResult::Error {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<&ListPrintersError> for OperationResult {
    fn from(error: &ListPrintersError) -> Self {
        OperationResult::Error {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PrinterList {
    pub(crate) printers: Vec<String>,
    pub(crate) default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub(crate) enum ListPrintersResponse {
    Listed(PrinterList),
    Failed(OperationResult),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::print_spooler::SpoolerError;

    #[test]
    fn success_result_serializes_with_status_tag() {
        let result = OperationResult::success("Printed on HP-1");

        assert_eq!(
            serde_json::to_value(&result).expect("serialize"),
            json!({"status": "success", "message": "Printed on HP-1"})
        );
        assert!(result.is_success());
    }

    #[test]
    fn error_result_carries_kind_and_message() {
        let error = PrintError::Acquire {
            printer: "Ghost".to_string(),
            source: SpoolerError::new("The printer name is invalid."),
        };
        let result = OperationResult::from(&error);

        assert_eq!(
            serde_json::to_value(&result).expect("serialize"),
            json!({
                "status": "error",
                "kind": "acquire",
                "message": "Failed to open printer 'Ghost': The printer name is invalid."
            })
        );
        assert!(!result.is_success());
    }

    #[test]
    fn printer_list_serializes_as_plain_object() {
        let response = ListPrintersResponse::Listed(PrinterList {
            printers: vec!["HP-1".to_string(), "Virtual-PDF".to_string()],
            default: Some("HP-1".to_string()),
        });

        assert_eq!(
            serde_json::to_value(&response).expect("serialize"),
            json!({"printers": ["HP-1", "Virtual-PDF"], "default": "HP-1"})
        );
    }

    #[test]
    fn printer_list_without_default_serializes_null() {
        let response = ListPrintersResponse::Listed(PrinterList {
            printers: Vec::new(),
            default: None,
        });

        assert_eq!(
            serde_json::to_value(&response).expect("serialize"),
            json!({"printers": [], "default": null})
        );
    }

    #[test]
    fn failed_listing_serializes_as_error_result() {
        let error = ListPrintersError::Enumerate(SpoolerError::new("spooler stopped"));
        let response = ListPrintersResponse::Failed(OperationResult::from(&error));

        assert_eq!(
            serde_json::to_value(&response).expect("serialize"),
            json!({
                "status": "error",
                "kind": "enumerate",
                "message": "Failed to enumerate printers: spooler stopped"
            })
        );
    }
}
