//! HTTP client for the portwayd control API.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::CliError;

/// API client for communicating with the daemon.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given base URL.
    pub fn new(api_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        let response = self.client.get(self.url(path)).send().await?;

        self.handle_response(response).await
    }

    /// Make a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CliError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;

        self.handle_response(response).await
    }

    /// Make a PUT request.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CliError> {
        let response = self.client.put(self.url(path)).json(body).send().await?;

        self.handle_response(response).await
    }

    /// Make a DELETE request. The daemon takes resource keys in the body.
    pub async fn delete<B: Serialize>(&self, path: &str, body: &B) -> Result<(), CliError> {
        let response = self.client.delete(self.url(path)).json(body).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error(response).await
        }
    }

    /// Handle a successful or error response.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CliError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to parse response: {}", e)))
        } else {
            self.handle_error(response).await
        }
    }

    /// Handle an error response (RFC 7807 problem document).
    async fn handle_error<T>(&self, response: reqwest::Response) -> Result<T, CliError> {
        let status = response.status().as_u16();

        let problem: ProblemDocument = response.json().await.unwrap_or_else(|_| ProblemDocument {
            code: "unknown".to_string(),
            detail: "Unknown error".to_string(),
        });

        Err(CliError::api(status, problem.code, problem.detail))
    }
}

/// The subset of the daemon's problem document the CLI surfaces.
#[derive(Debug, Deserialize)]
struct ProblemDocument {
    #[serde(default)]
    code: String,
    #[serde(default)]
    detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = ApiClient::new("http://127.0.0.1:7070/").unwrap();
        assert_eq!(
            client.url("/v1/mappings"),
            "http://127.0.0.1:7070/v1/mappings"
        );
    }

    #[test]
    fn test_problem_document_tolerates_missing_fields() {
        let problem: ProblemDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(problem.code, "");
        assert_eq!(problem.detail, "");
    }
}
