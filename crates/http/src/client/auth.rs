//! Authentication API client methods

use super::{ClientError, ShelfClient};
use crate::types::{
    AuthResponse, LoginRequest, LogoutRequest, MessageResponse, RegisterRequest, RegisterResponse,
};
use reqwest::Method;

impl ShelfClient {
    /// Exchange credentials for a token pair
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/login").json(&LoginRequest {
            email: email.into(),
            password: password.into(),
        });
        self.execute(req).await
    }

    /// Create an account
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/register").json(request);
        self.execute(req).await
    }

    /// Invalidate the refresh token server-side
    pub async fn logout(&self, refresh_token: impl Into<String>) -> Result<MessageResponse, ClientError> {
        let req = self
            .request(Method::POST, "/auth/logout")
            .json(&LogoutRequest {
                refresh_token: refresh_token.into(),
            });
        let response = self.send(req).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(MessageResponse::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
