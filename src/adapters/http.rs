use crate::core::pipeline::records_from_json;
use crate::domain::model::SurveyRecord;
use crate::domain::ports::SourceSpec;
use crate::utils::error::{FeedbackError, Result};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Pulls survey responses from a JSON export endpoint.
pub struct HttpSource {
    client: Client,
    endpoint: String,
    headers: BTreeMap<String, String>,
    bearer_token: Option<String>,
}

impl HttpSource {
    pub fn new(
        endpoint: String,
        headers: BTreeMap<String, String>,
        bearer_token: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            headers,
            bearer_token,
        })
    }

    pub fn from_spec(spec: &SourceSpec) -> Result<Self> {
        match spec {
            SourceSpec::Api {
                endpoint,
                headers,
                bearer_token,
                timeout_seconds,
            } => Self::new(
                endpoint.clone(),
                headers.clone(),
                bearer_token.clone(),
                *timeout_seconds,
            ),
            SourceSpec::File { path } => Err(FeedbackError::ConfigError {
                message: format!("'{}' is a file source, not an HTTP endpoint", path),
            }),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn fetch(&self) -> Result<Vec<SurveyRecord>> {
        tracing::debug!("Fetching survey responses from: {}", self.endpoint);

        let mut request = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json");
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Export endpoint status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedbackError::ApiStatusError {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response.json().await?;
        records_from_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn source(url: String, token: Option<&str>) -> HttpSource {
        HttpSource::new(url, BTreeMap::new(), token.map(str::to_string), 5).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_array_export() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/export")
                .header("Authorization", "Bearer secret");
            then.status(200).json_body(serde_json::json!([
                {"id": "r1", "How well does the person collaborate with others?": 4},
                {"id": "r2", "How well does the person collaborate with others?": 5}
            ]));
        });

        let records = source(server.url("/export"), Some("secret"))
            .fetch()
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_fetch_unwraps_documents_envelope() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/export");
            then.status(200)
                .json_body(serde_json::json!({"documents": [{"id": "only"}]}));
        });

        let records = source(server.url("/export"), None).fetch().await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_status() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/export");
            then.status(503).body("maintenance");
        });

        let err = source(server.url("/export"), None).fetch().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, FeedbackError::ApiStatusError { status: 503, .. }));
    }

    #[test]
    fn test_from_file_spec_is_rejected() {
        let spec = SourceSpec::File {
            path: "responses.json".to_string(),
        };
        assert!(HttpSource::from_spec(&spec).is_err());
    }
}
