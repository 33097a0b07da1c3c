/*
[INPUT]:  Application id, tenant id, and the operator completing sign-in
[OUTPUT]: Bearer access tokens via device-authorization or silent reuse
[POS]:    Auth layer - orchestrates the OAuth device-code flow
[UPDATE]: When identity-platform endpoints or grant handling change
*/

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::token_cache::{default_cache_dir, CachedToken, TokenCache};
use crate::http::{GraphClient, GraphError, Result};

/// Shared multi-tenant marker used when no tenant id is configured
pub const DEFAULT_TENANT: &str = "common";

/// Delegated read scope plus offline_access for refresh tokens
pub const SCOPE: &str = "https://graph.microsoft.com/Tasks.Read offline_access";

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const REFRESH_TOKEN_GRANT: &str = "refresh_token";
const SLOW_DOWN_BACKOFF_SECONDS: u64 = 5;

fn default_poll_interval() -> u64 {
    5
}

/// Response from the devicecode endpoint, displayed to the operator
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    #[serde(default = "default_poll_interval")]
    pub interval: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful token response from the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Error body returned while the device-code grant is not yet redeemable
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Manages token acquisition against the Microsoft identity platform
#[derive(Debug)]
pub struct DeviceAuthManager {
    client: GraphClient,
    token_cache: TokenCache,
    client_id: String,
    tenant: String,
}

impl DeviceAuthManager {
    /// Create a new auth manager using the default token cache directory.
    ///
    /// Default: `./.mstodo-export/tokens` relative to current working directory.
    pub fn new(client: GraphClient, client_id: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self::with_cache_dir(client, client_id, tenant, default_cache_dir())
    }

    /// Create a new auth manager with an explicit token cache directory.
    pub fn with_cache_dir(
        client: GraphClient,
        client_id: impl Into<String>,
        tenant: impl Into<String>,
        cache_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            client,
            token_cache: TokenCache::new(cache_dir),
            client_id: client_id.into(),
            tenant: tenant.into(),
        }
    }

    /// Get the token cache
    pub fn token_cache(&self) -> &TokenCache {
        &self.token_cache
    }

    /// Try to obtain a token without user interaction.
    ///
    /// Returns a cached unexpired access token, or redeems a cached
    /// refresh token. Every failure on this path is a silent miss; the
    /// caller falls through to the interactive flow.
    pub async fn acquire_token_silent(&self) -> Option<String> {
        let cached = self.token_cache.load(&self.client_id)?;
        if !cached.is_expired() {
            debug!("reusing cached access token");
            return Some(cached.access_token);
        }

        let refresh_token = cached.refresh_token?;
        match self.redeem_refresh_token(&refresh_token).await {
            Ok(grant) => Some(grant.access_token),
            Err(err) => {
                debug!(error = %err, "silent token refresh missed");
                None
            }
        }
    }

    /// Step 1: Start the device-authorization flow.
    ///
    /// POST /{tenant}/oauth2/v2.0/devicecode
    ///
    /// The returned verification URI and user code must be shown to the
    /// operator, who completes sign-in out-of-band in a browser.
    pub async fn begin_device_flow(&self) -> Result<DeviceCodeResponse> {
        let endpoint = format!("/{}/oauth2/v2.0/devicecode", self.tenant);
        let form = [("client_id", self.client_id.as_str()), ("scope", SCOPE)];

        let builder = self.client.login_request(Method::POST, &endpoint)?.form(&form);
        self.client.send_json(builder).await
    }

    /// Step 2: Block until the operator completes authorization.
    ///
    /// POST /{tenant}/oauth2/v2.0/token
    ///
    /// Polls the token endpoint at the server-provided interval;
    /// `authorization_pending` keeps polling and `slow_down` widens the
    /// interval. The loop is bounded by the flow's own expiry.
    pub async fn wait_for_device_authorization(
        &self,
        flow: &DeviceCodeResponse,
    ) -> Result<TokenGrant> {
        let endpoint = format!("/{}/oauth2/v2.0/token", self.tenant);
        let started = Instant::now();
        let mut interval = flow.interval;

        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if started.elapsed().as_secs() >= flow.expires_in {
                return Err(GraphError::DeviceCodeExpired);
            }

            let form = [
                ("grant_type", DEVICE_CODE_GRANT),
                ("client_id", self.client_id.as_str()),
                ("device_code", flow.device_code.as_str()),
            ];
            let builder = self.client.login_request(Method::POST, &endpoint)?.form(&form);
            let response = builder.send().await?;
            let status = response.status();

            if status.is_success() {
                let grant: TokenGrant = response.json().await?;
                self.store_grant(&grant);
                return Ok(grant);
            }

            let body = response.text().await.unwrap_or_default();
            if status.as_u16() >= 500 {
                return Err(GraphError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let error: TokenErrorBody = serde_json::from_str(&body)
                .map_err(|_| GraphError::InvalidResponse(body.clone()))?;
            match error.error.as_str() {
                "authorization_pending" => continue,
                "slow_down" => {
                    interval += SLOW_DOWN_BACKOFF_SECONDS;
                }
                "expired_token" => return Err(GraphError::DeviceCodeExpired),
                _ => {
                    return Err(GraphError::Authentication {
                        message: error.error_description.unwrap_or(error.error),
                    });
                }
            }
        }
    }

    /// Redeem a refresh token for a new access token.
    ///
    /// POST /{tenant}/oauth2/v2.0/token
    pub async fn redeem_refresh_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        let endpoint = format!("/{}/oauth2/v2.0/token", self.tenant);
        let form = [
            ("grant_type", REFRESH_TOKEN_GRANT),
            ("client_id", self.client_id.as_str()),
            ("scope", SCOPE),
            ("refresh_token", refresh_token),
        ];

        let builder = self.client.login_request(Method::POST, &endpoint)?.form(&form);
        let grant: TokenGrant = self.client.send_json(builder).await?;
        self.store_grant(&grant);
        Ok(grant)
    }

    /// Persist a grant for silent reuse. Cache write failures are
    /// logged, not fatal; the acquired token is still usable this run.
    fn store_grant(&self, grant: &TokenGrant) {
        let cached = CachedToken {
            access_token: grant.access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(grant.expires_in as i64),
            refresh_token: grant.refresh_token.clone(),
        };
        if let Err(err) = self.token_cache.save(&self.client_id, &cached) {
            warn!(error = %err, "failed to persist token cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::path::PathBuf;

    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::ClientConfig;

    fn temp_dir() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("mstodo-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn mock_client(server: &MockServer) -> GraphClient {
        GraphClient::with_config_and_base_urls(ClientConfig::default(), &server.uri(), &server.uri())
            .expect("client init")
    }

    fn instant_flow() -> DeviceCodeResponse {
        DeviceCodeResponse {
            device_code: "dev-code".to_string(),
            user_code: "ABCD1234".to_string(),
            verification_uri: "https://microsoft.com/devicelogin".to_string(),
            expires_in: 30,
            interval: 0,
            message: None,
        }
    }

    #[tokio::test]
    async fn test_begin_device_flow() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/devicecode"))
            .and(body_string_contains("client_id=app-123"))
            .and(body_string_contains("Tasks.Read"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "device_code": "dev-code",
                "user_code": "ABCD1234",
                "verification_uri": "https://microsoft.com/devicelogin",
                "expires_in": 900,
                "interval": 5,
                "message": "To sign in, use a web browser..."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let auth = DeviceAuthManager::with_cache_dir(mock_client(&server), "app-123", DEFAULT_TENANT, &dir);

        let flow = auth.begin_device_flow().await.expect("begin_device_flow failed");
        assert_eq!(flow.user_code, "ABCD1234");
        assert_eq!(flow.verification_uri, "https://microsoft.com/devicelogin");
        assert_eq!(flow.interval, 5);

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_wait_polls_through_authorization_pending() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "authorization_pending",
                "error_description": "operator has not signed in yet"
            })))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .and(body_string_contains("device_code=dev-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-xyz",
                "refresh_token": "refresh-xyz",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let auth = DeviceAuthManager::with_cache_dir(mock_client(&server), "app-123", DEFAULT_TENANT, &dir);

        let grant = auth
            .wait_for_device_authorization(&instant_flow())
            .await
            .expect("device authorization failed");
        assert_eq!(grant.access_token, "access-xyz");

        // Token is persisted for the next run
        let cached = auth.token_cache().load("app-123").expect("cache populated");
        assert_eq!(cached.access_token, "access-xyz");
        assert_eq!(cached.refresh_token.as_deref(), Some("refresh-xyz"));
        assert!(!cached.is_expired());

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_wait_surfaces_access_denied() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "access_denied",
                "error_description": "operator declined the request"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let auth = DeviceAuthManager::with_cache_dir(mock_client(&server), "app-123", DEFAULT_TENANT, &dir);

        let err = auth
            .wait_for_device_authorization(&instant_flow())
            .await
            .unwrap_err();
        match err {
            GraphError::Authentication { message } => {
                assert!(message.contains("declined"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_wait_surfaces_expired_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "expired_token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let auth = DeviceAuthManager::with_cache_dir(mock_client(&server), "app-123", DEFAULT_TENANT, &dir);

        let err = auth
            .wait_for_device_authorization(&instant_flow())
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::DeviceCodeExpired));

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_silent_reuses_unexpired_cached_token() {
        let server = MockServer::start().await;
        let dir = temp_dir();

        let auth = DeviceAuthManager::with_cache_dir(mock_client(&server), "app-123", DEFAULT_TENANT, &dir);
        auth.token_cache()
            .save(
                "app-123",
                &CachedToken {
                    access_token: "cached-token".to_string(),
                    expires_at: Utc::now() + ChronoDuration::hours(1),
                    refresh_token: None,
                },
            )
            .unwrap();

        // No mocks mounted: any network call would fail the test
        let token = auth.acquire_token_silent().await;
        assert_eq!(token.as_deref(), Some("cached-token"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_silent_redeems_refresh_token_when_expired() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=old-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-token",
                "refresh_token": "new-refresh",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let auth = DeviceAuthManager::with_cache_dir(mock_client(&server), "app-123", DEFAULT_TENANT, &dir);
        auth.token_cache()
            .save(
                "app-123",
                &CachedToken {
                    access_token: "stale-token".to_string(),
                    expires_at: Utc::now() - ChronoDuration::minutes(5),
                    refresh_token: Some("old-refresh".to_string()),
                },
            )
            .unwrap();

        let token = auth.acquire_token_silent().await;
        assert_eq!(token.as_deref(), Some("fresh-token"));

        let cached = auth.token_cache().load("app-123").unwrap();
        assert_eq!(cached.refresh_token.as_deref(), Some("new-refresh"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_silent_miss_is_none_not_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "refresh token revoked"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let auth = DeviceAuthManager::with_cache_dir(mock_client(&server), "app-123", DEFAULT_TENANT, &dir);
        auth.token_cache()
            .save(
                "app-123",
                &CachedToken {
                    access_token: "stale-token".to_string(),
                    expires_at: Utc::now() - ChronoDuration::minutes(5),
                    refresh_token: Some("revoked".to_string()),
                },
            )
            .unwrap();

        assert!(auth.acquire_token_silent().await.is_none());

        fs::remove_dir_all(dir).unwrap();
    }
}
