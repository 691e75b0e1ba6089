//! Authentication API.

use crate::client::MemoryBankClient;
use crate::error::Result;
use crate::types::{
    AccessTokenResponse, EmailLoginRequest, EmailRegisterRequest, GoogleAuthRequest,
    RefreshTokenRequest, TokenResponse,
};

/// Auth API client.
///
/// Returned tokens are not persisted here; hand them to a
/// `SessionStore` to sign in.
pub struct AuthApi {
    client: MemoryBankClient,
}

impl AuthApi {
    pub(crate) fn new(client: MemoryBankClient) -> Self {
        Self { client }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<TokenResponse> {
        let request = EmailRegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.map(str::to_string),
        };
        self.client.post(&["auth", "register"], &request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let request = EmailLoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.client.post(&["auth", "login"], &request).await
    }

    /// Sign in with a Google ID token.
    pub async fn google(&self, id_token: &str) -> Result<TokenResponse> {
        let request = GoogleAuthRequest {
            id_token: id_token.to_string(),
        };
        self.client.post(&["auth", "google"], &request).await
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessTokenResponse> {
        let request = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.client.post(&["auth", "refresh"], &request).await
    }
}
