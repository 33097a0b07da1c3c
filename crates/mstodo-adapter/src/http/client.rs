/*
[INPUT]:  HTTP configuration (base URLs, timeouts, bearer token)
[OUTPUT]: Configured reqwest client ready for Graph API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::http::{GraphError, Result};

/// Base URLs for the Microsoft identity platform and Graph API
const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Main HTTP client for Microsoft Graph
#[derive(Debug, Clone)]
pub struct GraphClient {
    http_client: Client,
    login_base_url: Url,
    graph_base_url: Url,
    bearer_token: Option<String>,
}

impl GraphClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_urls(config, LOGIN_BASE_URL, GRAPH_BASE_URL)
    }

    /// Create a new client with custom configuration and base URLs.
    ///
    /// Tests point both URLs at a local mock server.
    pub fn with_config_and_base_urls(
        config: ClientConfig,
        login_base_url: &str,
        graph_base_url: &str,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            login_base_url: Url::parse(login_base_url)?,
            graph_base_url: Url::parse(graph_base_url)?,
            bearer_token: None,
        })
    }

    /// Set the bearer token presented on Graph requests
    pub fn set_bearer_token(&mut self, token: impl Into<String>) {
        self.bearer_token = Some(token.into());
    }

    /// Get the bearer token if set
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Build full URL for identity-platform endpoints
    fn login_url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.login_base_url.join(endpoint)?)
    }

    /// Build full URL for Graph endpoints.
    ///
    /// The Graph base carries a `/v1.0` path segment, so endpoints are
    /// appended rather than joined to keep it.
    fn graph_url(&self, endpoint: &str) -> Result<Url> {
        let mut raw = self.graph_base_url.as_str().trim_end_matches('/').to_string();
        raw.push_str(endpoint);
        Ok(Url::parse(&raw)?)
    }

    /// Build request builder for identity-platform endpoints (no auth)
    pub(crate) fn login_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.login_url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Build bearer-authenticated request builder for Graph endpoints
    pub(crate) fn graph_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.graph_url(endpoint)?;
        self.request_with_bearer(method, url)
    }

    /// Build bearer-authenticated request builder for an absolute URL.
    ///
    /// Used to follow `@odata.nextLink` continuation URLs.
    pub(crate) fn graph_request_url(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        self.request_with_bearer(method, Url::parse(url)?)
    }

    fn request_with_bearer(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self
            .bearer_token
            .as_deref()
            .ok_or_else(|| GraphError::Authentication {
                message: "no bearer token set, authenticate first".to_string(),
            })?;
        Ok(self.http_client.request(method, url).bearer_auth(token))
    }

    /// Send a request and decode the JSON body.
    ///
    /// Any status >= 400 is surfaced as `GraphError::Api` carrying the
    /// status code and the raw response body.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::api_error(status, body));
        }
        Ok(response.json().await?)
    }
}
