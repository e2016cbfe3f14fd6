//! Shelf HTTP client
//!
//! Every request goes through [`ShelfClient::execute`], which attaches the
//! stored access token and transparently refreshes it once on a 401.

pub mod admin;
pub mod auth;
pub mod borrow;
pub mod error;
pub mod media;
pub mod refresh;
pub mod users;

use crate::events::{Notification, SessionEvents, TracingEvents};
use crate::storage::TokenStore;
use crate::types::{RefreshRequest, RefreshResponse};
use error::ClientError;
use refresh::{RefreshCoordinator, Ticket};
use reqwest::{Client, ClientBuilder, Method, Request, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use shelf_core::ClientSettings;
use std::sync::Arc;
use std::time::Duration;

/// Session endpoints; a 401 from them never triggers a refresh
const SESSION_PATHS: [&str; 4] = [
    "/auth/login",
    "/auth/register",
    "/auth/refresh",
    "/auth/logout",
];

const USER_AGENT: &str = concat!("shelf-client/", env!("CARGO_PKG_VERSION"));

/// Media-library API client
///
/// Cloning is cheap; clones share the token store and the refresh
/// coordinator, so a refresh triggered through one clone is seen by all.
#[derive(Clone)]
pub struct ShelfClient {
    client: Client,
    base_url: Arc<str>,
    base_path: Arc<str>,
    tokens: TokenStore,
    events: Arc<dyn SessionEvents>,
    refresh: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for ShelfClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShelfClient")
            .field("base_url", &self.base_url)
            .field("refreshing", &self.refresh.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl ShelfClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ShelfClientBuilder {
        ShelfClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session token storage used by this client
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Notification and navigation sink
    pub fn events(&self) -> &Arc<dyn SessionEvents> {
        &self.events
    }

    /// Whether a token refresh is in flight
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    /// Create a request builder for `path` under the base URL
    ///
    /// The bearer token is attached at send time, not here.
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Execute a request and decode a JSON body
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Execute a request whose response body is irrelevant
    pub async fn execute_empty(&self, request: reqwest::RequestBuilder) -> Result<(), ClientError> {
        self.send(request).await.map(|_| ())
    }

    /// Send with bearer auth, refreshing and replaying once on 401
    pub async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ClientError> {
        let mut request = request.build()?;
        let refreshable = !is_session_path(&self.base_path, request.url().path());
        let replay = if refreshable { request.try_clone() } else { None };

        let token = self.current_token().await?;
        let generation = self.refresh.generation();
        if let Some(token) = &token {
            set_bearer(&mut request, token)?;
        }

        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "Sending request");
        let response = self.client.execute(request).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return self.check(response).await;
        }
        let Some(mut replay) = replay else {
            return self.check(response).await;
        };

        debug!(%method, %path, "Request unauthorized, refreshing access token");
        let fresh = self.fresh_token(token.as_deref(), generation).await?;
        set_bearer(&mut replay, &fresh)?;

        // The replay is final: a second 401 is surfaced as-is.
        let response = self.client.execute(replay).await?;
        self.check(response).await
    }

    /// The token to attach, queueing behind an in-flight refresh if needed
    async fn current_token(&self) -> Result<Option<String>, ClientError> {
        if let Some(waiter) = self.refresh.wait_if_refreshing() {
            debug!("Refresh in flight, waiting before sending");
            return waiter
                .wait()
                .await
                .map(Some)
                .map_err(ClientError::SessionExpired);
        }
        Ok(self.tokens.access_token())
    }

    /// Obtain a token newer than `stale`, refreshing at most once across callers
    ///
    /// `generation` is the session generation the failing request was sent in.
    async fn fresh_token(
        &self,
        stale: Option<&str>,
        generation: u64,
    ) -> Result<String, ClientError> {
        // Another caller may have refreshed between our send and its 401.
        if let Some(current) = self.tokens.access_token()
            && Some(current.as_str()) != stale
            && !self.refresh.is_refreshing()
            && self.refresh.generation() == generation
        {
            return Ok(current);
        }

        match self.refresh.join(generation) {
            Ticket::Ended => {
                debug!("Unauthorized response from an ended session");
                Err(ClientError::SessionExpired(
                    "session ended while the request was in flight".to_string(),
                ))
            }
            Ticket::Follower(waiter) => {
                debug!(pending = self.refresh.pending(), "Queued behind token refresh");
                waiter.wait().await.map_err(ClientError::SessionExpired)
            }
            Ticket::Leader(guard) => {
                let outcome = self.refresh_access_token().await;
                match &outcome {
                    Ok(_) => {
                        let released = guard.settle(&outcome);
                        info!(released, "Access token refreshed");
                    }
                    Err(reason) => {
                        warn!(reason = %reason, "Token refresh failed, ending session");
                        if let Err(e) = self.tokens.clear() {
                            error!(error = %e, "Failed to clear stored session");
                        }
                        let released = guard.settle(&outcome);
                        debug!(released, "Rejected queued requests");
                        self.events.notify(Notification::warning(
                            "Your session has expired. Please log in again.",
                        ));
                        self.events.redirect_to_login();
                    }
                }
                outcome.map_err(ClientError::SessionExpired)
            }
        }
    }

    /// Call the refresh endpoint and persist the result
    async fn refresh_access_token(&self) -> Result<String, String> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .ok_or_else(|| "no refresh token stored".to_string())?;

        let response = self
            .request(Method::POST, "/auth/refresh")
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| format!("refresh request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ClientError::from_response_body(status, &body);
            return Err(err
                .server_message()
                .map_or_else(|| err.to_string(), str::to_string));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid refresh response: {e}"))?;

        self.tokens
            .store_access_token(&body.access_token)
            .map_err(|e| format!("failed to store access token: {e}"))?;
        if let Some(rotated) = &body.refresh_token {
            self.tokens
                .store_refresh_token(rotated)
                .map_err(|e| format!("failed to store refresh token: {e}"))?;
        }
        Ok(body.access_token)
    }

    /// Map error statuses, surfacing the user-visible ones
    async fn check(&self, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_response_body(status, &body);
        if let Some(message) = err.user_message() {
            self.events.notify(Notification::error(message));
        }
        debug!(status = status.as_u16(), error = %err, "Request failed");
        Err(err)
    }
}

/// Whether `path` is a session endpoint under `base_path`
fn is_session_path(base_path: &str, path: &str) -> bool {
    path.strip_prefix(base_path)
        .is_some_and(|rest| SESSION_PATHS.contains(&rest))
}

fn set_bearer(request: &mut Request, token: &str) -> Result<(), ClientError> {
    let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| ClientError::Configuration("access token is not a valid header value".into()))?;
    request.headers_mut().insert(header::AUTHORIZATION, value);
    Ok(())
}

/// Builder for ShelfClient
#[derive(Default)]
pub struct ShelfClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    tokens: Option<TokenStore>,
    events: Option<Arc<dyn SessionEvents>>,
}

impl ShelfClientBuilder {
    /// Start from loaded settings
    pub fn from_settings(settings: &ClientSettings) -> Self {
        let builder = Self::default().base_url(settings.api_url.clone());
        match settings.timeout() {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the session storage (defaults to in-memory)
    pub fn tokens(mut self, tokens: TokenStore) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the notification sink (defaults to [`TracingEvents`])
    pub fn events(mut self, events: Arc<dyn SessionEvents>) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ShelfClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        let parsed = url::Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url '{base_url}': {e}")))?;
        let base_path = parsed.path().trim_end_matches('/').to_string();

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        client_builder =
            client_builder.user_agent(self.user_agent.unwrap_or_else(|| USER_AGENT.to_string()));

        let client = client_builder.build()?;

        Ok(ShelfClient {
            client,
            base_url: base_url.into(),
            base_path: base_path.into(),
            tokens: self.tokens.unwrap_or_default(),
            events: self.events.unwrap_or_else(|| Arc::new(TracingEvents)),
            refresh: Arc::new(RefreshCoordinator::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_paths_are_not_refreshable() {
        assert!(is_session_path("/api", "/api/auth/login"));
        assert!(is_session_path("", "/auth/refresh"));
        assert!(is_session_path("/api", "/api/auth/logout"));
        assert!(!is_session_path("/api", "/api/users/me"));
    }

    #[test]
    fn test_session_paths_match_only_under_base() {
        assert!(!is_session_path("/api", "/api/media/auth/login"));
        assert!(!is_session_path("", "/admin/auth/refresh"));
        assert!(!is_session_path("/api", "/auth/login"));
        assert!(!is_session_path("/api", "/api/auth/login/extra"));
    }

    #[test]
    fn test_builder_records_base_path() {
        let client = ShelfClient::new("http://localhost:5000/api/").unwrap();
        assert_eq!(&*client.base_path, "/api");
        let client = ShelfClient::new("http://localhost:5000").unwrap();
        assert_eq!(&*client.base_path, "");
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = ShelfClient::new("http://localhost:5000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let result = ShelfClient::new("localhost without scheme");
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_forbidden_is_notified_and_propagated() {
        use crate::events::{MockSessionEvents, NotificationLevel};
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/media/m1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "message": "Admin only"
            })))
            .mount(&server)
            .await;

        let mut events = MockSessionEvents::new();
        events
            .expect_notify()
            .withf(|n| {
                n.level == NotificationLevel::Error
                    && n.message == "You do not have permission to perform this action."
            })
            .times(1)
            .return_const(());
        events.expect_redirect_to_login().never();

        let client = ShelfClient::builder()
            .base_url(server.uri())
            .events(Arc::new(events))
            .build()
            .unwrap();

        let err = client.delete_media("m1").await.unwrap_err();
        assert!(matches!(err, ClientError::Forbidden(_)));
        assert_eq!(err.server_message(), Some("Admin only"));
    }

    #[test]
    fn test_from_settings_uses_api_url() {
        let settings = ClientSettings::default();
        let client = ShelfClientBuilder::from_settings(&settings).build().unwrap();
        assert_eq!(client.base_url(), settings.api_url);
    }
}
