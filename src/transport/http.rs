use crate::config::SeederConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

const REST_ACCEPT: &str = "application/vnd.github.v3+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Raw response of a REST call. Status handling is the caller's job.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(v) = value.parse() {
            self.headers.insert(name, v);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Body prefix for log lines.
    pub fn body_excerpt(&self) -> String {
        self.body.chars().take(100).collect()
    }
}

/// The REST operations the issue client needs.
///
/// Kept as a trait so the retry loop can be driven by a scripted transport in tests.
#[async_trait]
pub trait RestTransport: Send + Sync {
    /// POST a JSON body to `path` (relative to the API base). Only network-level
    /// failures are errors; any HTTP status is returned as a response.
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<ApiResponse, TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    api_base: String,
    graphql_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(config: &SeederConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.settings.http_timeout())
            // Single lane: one idle connection per host is all we ever reuse.
            .pool_max_idle_per_host(1)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            api_base: config.api_base.as_str().trim_end_matches('/').to_string(),
            graphql_url: config.graphql_url.to_string(),
            token: config.token().to_string(),
        })
    }

    fn user_agent() -> String {
        format!("repo-seeder/{}", env!("CARGO_PKG_VERSION"))
    }

    fn rest(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.api_base, path);
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, REST_ACCEPT)
            .header(API_VERSION_HEADER, API_VERSION)
            .header(USER_AGENT, Self::user_agent())
    }

    async fn into_api_response(
        resp: reqwest::Response,
    ) -> std::result::Result<ApiResponse, TransportError> {
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.text().await?;
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    /// GET a REST path.
    pub async fn get(&self, path: &str) -> std::result::Result<ApiResponse, TransportError> {
        let resp = self.rest(reqwest::Method::GET, path).send().await?;
        Self::into_api_response(resp).await
    }

    /// Execute a GraphQL query and return its `data` object.
    ///
    /// Non-200 statuses become [`Error::Remote`]; a payload carrying `errors`
    /// becomes [`Error::GraphQl`].
    pub async fn graphql(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let mut payload = serde_json::json!({ "query": query });
        if let Some(vars) = variables {
            payload["variables"] = vars;
        }

        let resp = self
            .client
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .header(USER_AGENT, Self::user_agent())
            .json(&payload)
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(TransportError::from)?;
        if status != 200 {
            error!(http_status = status, "GraphQL request failed");
            return Err(Error::Remote {
                status,
                message: body.chars().take(200).collect(),
            });
        }

        let envelope: GraphQlEnvelope = serde_json::from_str(&body)?;
        if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
            let message = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            error!(errors = %message, "GraphQL returned errors");
            return Err(Error::GraphQl { message });
        }
        Ok(envelope.data.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl RestTransport for HttpTransport {
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<ApiResponse, TransportError> {
        debug!(path, "POST");
        let resp = self
            .rest(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        Self::into_api_response(resp).await
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphQlErrorItem>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorItem {
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
