use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{CreatedAck, RegenAck, Report, ReportDraft, Section, StatusProbe};

mod http;
pub mod retry;

pub use http::HttpReportClient;

/// Shared handle to the report backend, as held by pollers and views.
pub type SharedApi = Arc<dyn ReportApi + Send + Sync>;

/// Typed contract against the reporting backend. Network I/O only; no local
/// state is retained between calls.
#[async_trait]
pub trait ReportApi {
    async fn list_reports(&self) -> Result<Vec<Report>, ApiError>;
    async fn get_report(&self, id: i64) -> Result<Report, ApiError>;
    async fn report_status(&self, id: i64) -> Result<StatusProbe, ApiError>;
    async fn create_report(&self, draft: &ReportDraft) -> Result<CreatedAck, ApiError>;
    async fn regenerate_section(&self, id: i64, section: Section) -> Result<RegenAck, ApiError>;
    async fn download_pdf(&self, id: i64) -> Result<Vec<u8>, ApiError>;
}

/// Failure taxonomy at the fetcher seam.
///
/// A `Transport` failure never halts polling (the next tick retries); a
/// `Validation` failure is raised before any request is sent; a `Backend`
/// rejection carries the server-provided message when one was parseable.
/// Absent visuals sub-fields are not errors at all and never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Transport(String),
    Validation(String),
    Backend { status: u16, message: String },
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Validation(_) => false,
            ApiError::Backend { status, .. } => retry::is_retryable_http_status(*status),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "transport failure: {}", msg),
            ApiError::Validation(msg) => write!(f, "validation failure: {}", msg),
            ApiError::Backend { status, message } => {
                write!(f, "backend rejection ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_readable() {
        let e = ApiError::Transport("connection refused".to_string());
        assert_eq!(e.to_string(), "transport failure: connection refused");

        let e = ApiError::Backend { status: 404, message: "Report not found".to_string() };
        assert_eq!(e.to_string(), "backend rejection (404): Report not found");

        let e = ApiError::Validation("industry must be at least 2 characters".to_string());
        assert!(e.to_string().starts_with("validation failure"));
    }

    #[test]
    fn test_retryability_by_variant() {
        assert!(ApiError::Transport("timeout".to_string()).is_retryable());
        assert!(!ApiError::Validation("bad draft".to_string()).is_retryable());
        assert!(!ApiError::Backend { status: 404, message: String::new() }.is_retryable());
        assert!(ApiError::Backend { status: 503, message: String::new() }.is_retryable());
    }
}
