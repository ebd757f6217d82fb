#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
//! Shared HTTP DTOs for the Autocompose web API.
//!
//! The Flask server owns selection state and job execution; these types pin
//! down the JSON contracts the browser controller relies on. Raw response
//! bodies decode leniently (optional fields everywhere) and are validated into
//! typed results so a malformed payload is reported instead of half-applied.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier values arrive as JSON strings or integers depending on the route.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Text(text) => text,
            WireId::Number(number) => number.to_string(),
        }
    }
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "WireId", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as sent on the wire.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<WireId> for $name {
            fn from(value: WireId) -> Self {
                Self(String::from(value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Opaque container identifier as rendered into `data-container-id`.
    ItemId
);

opaque_id!(
    /// Opaque, server-assigned job identifier.
    JobId
);

/// Validation failures for response bodies that decoded but do not honour the contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponseError {
    /// A field required on the success path was absent.
    #[error("response missing required field")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// The server answered `success: false`.
    #[error("server rejected the request")]
    Rejected {
        /// Server-provided reason when present.
        detail: Option<String>,
    },
    /// The confirmation referred to a different item than the one toggled.
    #[error("response identifier does not match request")]
    IdMismatch {
        /// Identifier sent in the request.
        expected: ItemId,
        /// Identifier returned by the server.
        actual: ItemId,
    },
}

impl ResponseError {
    /// Human-readable detail suitable for an alert.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::MissingField { field } => format!("malformed server response (missing `{field}`)"),
            Self::Rejected { detail } => detail
                .clone()
                .unwrap_or_else(|| "Unknown server error".to_string()),
            Self::IdMismatch { expected, actual } => {
                format!("server confirmed item {actual} instead of {expected}")
            }
        }
    }
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Error text used by the selection routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Message text used by the job and settings routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Prefer `error`, then `message`; blank strings count as absent.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        [self.error.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }
}

/// `POST /api/toggle_selection` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleSelectionRequest {
    /// Container identifier to flip.
    pub container_id: ItemId,
    /// Display name stored alongside the selection.
    pub container_name: String,
}

/// `POST /api/toggle_selection` raw response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleSelectionResponse {
    /// Whether the server applied the toggle.
    #[serde(default)]
    pub success: bool,
    /// Identifier echoed back for confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    /// Display name echoed back by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Authoritative selection state after the toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    /// Authoritative number of selected containers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_count: Option<u32>,
    /// Failure reason when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validated toggle result carrying only server-authoritative values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfirmation {
    /// Item the confirmation applies to.
    pub id: ItemId,
    /// Selection state to render.
    pub selected: bool,
    /// Selected count to render.
    pub selected_count: u32,
}

impl ToggleSelectionResponse {
    /// Validate the response against the item that was toggled.
    ///
    /// # Errors
    /// Returns [`ResponseError::Rejected`] for `success: false`,
    /// [`ResponseError::MissingField`] when a success field is absent, or
    /// [`ResponseError::IdMismatch`] when the echoed id differs from `expected`.
    pub fn into_confirmation(
        self,
        expected: &ItemId,
    ) -> Result<SelectionConfirmation, ResponseError> {
        if !self.success {
            return Err(ResponseError::Rejected { detail: self.error });
        }
        let id = self.id.ok_or(ResponseError::MissingField { field: "id" })?;
        if &id != expected {
            return Err(ResponseError::IdMismatch {
                expected: expected.clone(),
                actual: id,
            });
        }
        let selected = self
            .selected
            .ok_or(ResponseError::MissingField { field: "selected" })?;
        let selected_count = self.selected_count.ok_or(ResponseError::MissingField {
            field: "selected_count",
        })?;
        Ok(SelectionConfirmation {
            id,
            selected,
            selected_count,
        })
    }
}

/// Generated compose file referenced by a job, mirroring the server's batch entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct JobFile {
    /// Timestamped output directory the file was generated into.
    pub subdir_name: String,
    /// File name inside `subdir_name`.
    pub filename: String,
}

/// `POST /{action}` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartJobRequest {
    /// Files the job operates on.
    pub files: Vec<JobFile>,
}

/// `POST /{action}` raw response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartJobResponse {
    /// Identifier of the created job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    /// Failure reason when the job could not be created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StartJobResponse {
    /// Extract the created job id.
    ///
    /// # Errors
    /// Returns [`ResponseError::Rejected`] when the server reported an error
    /// without an id, or [`ResponseError::MissingField`] when neither is present.
    pub fn into_job_id(self) -> Result<JobId, ResponseError> {
        match (self.job_id, self.error) {
            (Some(id), _) => Ok(id),
            (None, Some(detail)) => Err(ResponseError::Rejected {
                detail: Some(detail),
            }),
            (None, None) => Err(ResponseError::MissingField { field: "job_id" }),
        }
    }
}

/// Job lifecycle state reported by `GET /check_job_status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    /// Job is still running; poll again.
    InProgress,
    /// Job finished successfully.
    Completed,
    /// Job finished with an error.
    Failed,
    /// Any other value; treated as terminal.
    Unrecognized(String),
}

impl JobStatus {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        match value {
            JobStatus::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

/// `GET /check_job_status/{job_id}` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobStatusReport {
    /// Current job status.
    pub status: JobStatus,
    /// Optional human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional flash category used for styling (`success`, `danger`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// `POST /update_columns` request body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateColumnsRequest {
    /// Grid column count chosen on the slider.
    pub num_cols: u32,
}

/// `POST /update_columns` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateColumnsResponse {
    /// Whether the server stored the value.
    #[serde(default)]
    pub success: bool,
    /// Server message, logged only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_accept_strings_and_integers() {
        let from_text: ItemId = serde_json::from_value(json!("c0ffee")).unwrap();
        let from_number: ItemId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(from_text.as_str(), "c0ffee");
        assert_eq!(from_number, ItemId::new("42"));
        assert_eq!(serde_json::to_value(&from_number).unwrap(), json!("42"));
    }

    #[test]
    fn toggle_confirmation_uses_server_values() {
        let body: ToggleSelectionResponse = serde_json::from_value(json!({
            "success": true,
            "id": "abc",
            "name": "web",
            "selected": false,
            "selected_count": 4
        }))
        .unwrap();
        let confirmation = body.into_confirmation(&ItemId::new("abc")).unwrap();
        assert!(!confirmation.selected);
        assert_eq!(confirmation.selected_count, 4);
    }

    #[test]
    fn toggle_rejection_carries_server_error() {
        let body: ToggleSelectionResponse = serde_json::from_value(json!({
            "success": false,
            "error": "Missing container_id or container_name"
        }))
        .unwrap();
        let err = body.into_confirmation(&ItemId::new("abc")).unwrap_err();
        assert_eq!(err.detail(), "Missing container_id or container_name");
    }

    #[test]
    fn toggle_without_count_is_malformed() {
        let body = ToggleSelectionResponse {
            success: true,
            id: Some(ItemId::new("abc")),
            selected: Some(true),
            ..ToggleSelectionResponse::default()
        };
        assert_eq!(
            body.into_confirmation(&ItemId::new("abc")),
            Err(ResponseError::MissingField {
                field: "selected_count"
            })
        );
    }

    #[test]
    fn toggle_for_other_item_is_rejected() {
        let body = ToggleSelectionResponse {
            success: true,
            id: Some(ItemId::new("other")),
            selected: Some(true),
            selected_count: Some(1),
            ..ToggleSelectionResponse::default()
        };
        assert!(matches!(
            body.into_confirmation(&ItemId::new("abc")),
            Err(ResponseError::IdMismatch { .. })
        ));
    }

    #[test]
    fn job_status_keeps_unknown_values() {
        let report: JobStatusReport =
            serde_json::from_value(json!({"status": "queued"})).unwrap();
        assert_eq!(report.status, JobStatus::Unrecognized("queued".into()));
        assert_eq!(
            serde_json::to_value(JobStatus::InProgress).unwrap(),
            json!("in_progress")
        );
    }

    #[test]
    fn start_job_response_requires_id() {
        let ok: StartJobResponse = serde_json::from_value(json!({"job_id": "abc123"})).unwrap();
        assert_eq!(ok.into_job_id().unwrap(), JobId::new("abc123"));
        let empty: StartJobResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            empty.into_job_id(),
            Err(ResponseError::MissingField { field: "job_id" })
        );
    }

    #[test]
    fn start_job_request_matches_batch_entry_shape() {
        let request = StartJobRequest {
            files: vec![JobFile {
                subdir_name: "compose_20240101_120000".into(),
                filename: "web.yml".into(),
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"files": [{"subdir_name": "compose_20240101_120000", "filename": "web.yml"}]})
        );
    }

    #[test]
    fn error_body_prefers_error_then_message() {
        let body = ErrorBody {
            error: Some("  ".into()),
            message: Some("rate limited".into()),
        };
        assert_eq!(body.reason(), Some("rate limited"));
        let body = ErrorBody {
            error: Some("bad id".into()),
            message: Some("ignored".into()),
        };
        assert_eq!(body.reason(), Some("bad id"));
    }
}
