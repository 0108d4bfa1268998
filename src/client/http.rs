use anyhow::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::client::retry::{retry_async, RetryConfig};
use crate::client::{ApiError, ReportApi};
use crate::config::Config;
use crate::model::{CreatedAck, RegenAck, Report, ReportDraft, Section, StatusProbe};

/// reqwest-backed implementation of the backend contract.
pub struct HttpReportClient {
    client: Client,
    root: Url,
    retry: RetryConfig,
}

impl HttpReportClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let root = cfg.api_root()?;
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(cfg.http_timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            root,
            retry: RetryConfig::from_config(cfg),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.root
            .join(path)
            .map_err(|e| ApiError::Transport(format!("bad endpoint {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        retry_async(&self.retry, path, || async {
            let resp = self.client.get(url.clone()).send().await?;
            let resp = check_status(resp).await?;
            resp.json::<T>().await.map_err(ApiError::from)
        })
        .await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        // POSTs enqueue work server-side and are never retried here.
        let url = self.endpoint(path)?;
        let resp = self.client.post(url).json(body).send().await?;
        let resp = check_status(resp).await?;
        resp.json::<T>().await.map_err(ApiError::from)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Backend { status: status.as_u16(), message: extract_detail(&body, status.as_u16()) })
}

/// The backend reports errors as {"detail": "..."}; fall back to a generic
/// message when the body carries no usable detail.
fn extract_detail(body: &str, status: u16) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(str::to_string)))
        .unwrap_or_else(|| format!("request failed with HTTP {}", status))
}

#[async_trait::async_trait]
impl ReportApi for HttpReportClient {
    async fn list_reports(&self) -> Result<Vec<Report>, ApiError> {
        self.get_json("reports").await
    }

    async fn get_report(&self, id: i64) -> Result<Report, ApiError> {
        self.get_json(&format!("reports/{}", id)).await
    }

    async fn report_status(&self, id: i64) -> Result<StatusProbe, ApiError> {
        self.get_json(&format!("reports/{}/status", id)).await
    }

    async fn create_report(&self, draft: &ReportDraft) -> Result<CreatedAck, ApiError> {
        draft.validate().map_err(ApiError::Validation)?;
        self.post_json("reports", draft).await
    }

    async fn regenerate_section(&self, id: i64, section: Section) -> Result<RegenAck, ApiError> {
        self.post_json(
            &format!("reports/{}/regenerate-section", id),
            &json!({ "section_name": section.as_str() }),
        )
        .await
    }

    async fn download_pdf(&self, id: i64) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&format!("reports/{}/pdf", id))?;
        retry_async(&self.retry, "download_pdf", || async {
            let resp = self.client.get(url.clone()).send().await?;
            let resp = check_status(resp).await?;
            Ok(resp.bytes().await?.to_vec())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportDraft;

    fn test_config() -> Config {
        Config {
            base_url: "http://localhost:8000".to_string(),
            poll_interval_secs: 5,
            http_timeout_secs: 10,
            retry_max: 3,
            retry_base_ms: 1,
            retry_max_ms: 10,
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let client = HttpReportClient::new(&test_config()).unwrap();
        assert_eq!(
            client.endpoint("reports/12").unwrap().as_str(),
            "http://localhost:8000/api/reports/12"
        );
        assert_eq!(
            client.endpoint("reports/12/regenerate-section").unwrap().as_str(),
            "http://localhost:8000/api/reports/12/regenerate-section"
        );
    }

    #[test]
    fn test_extract_detail_from_backend_body() {
        assert_eq!(extract_detail(r#"{"detail": "Report not found"}"#, 404), "Report not found");
        // Non-string detail (e.g. validation arrays) falls back to generic.
        assert_eq!(
            extract_detail(r#"{"detail": [{"loc": ["body"]}]}"#, 422),
            "request failed with HTTP 422"
        );
        assert_eq!(extract_detail("<html>gateway</html>", 502), "request failed with HTTP 502");
        assert_eq!(extract_detail("", 500), "request failed with HTTP 500");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_draft_before_sending() {
        // Base URL points nowhere routable; validation must fail first,
        // without any network attempt.
        let cfg = Config { base_url: "http://0.0.0.0:1".to_string(), ..test_config() };
        let client = HttpReportClient::new(&cfg).unwrap();

        let mut draft = ReportDraft::default();
        draft.industry = "X".to_string();

        match client.create_report(&draft).await {
            Err(ApiError::Validation(msg)) => assert!(msg.contains("industry")),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
