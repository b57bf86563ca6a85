//! Bearer-token session management for the Ingestion API.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use vigia_config::Credentials;

use crate::error::{UploadError, UploadResult};

/// Nominal server-side lifetime of an issued token.
const TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Safety margin subtracted from the nominal lifetime so the session
/// refreshes well before the server invalidates the token.
const REFRESH_MARGIN: Duration = Duration::from_secs(23 * 60 * 60);

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

struct SessionState {
    token: String,
    expires_at: Instant,
}

/// Owns the bearer credential and its conservative validity window.
///
/// One instance is shared process-wide. Mutation is confined to `login`;
/// the concurrency-1 batch queue means `with_auth` is never entered
/// concurrently from the pipeline, and the lock keeps the type honest if
/// that discipline ever changes.
pub struct AuthSession {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    state: RwLock<Option<SessionState>>,
}

impl AuthSession {
    /// Construct a session for the given API base URL and credentials.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, credentials: Credentials) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            state: RwLock::new(None),
        }
    }

    /// Authenticate against the Ingestion API and store the fresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the login request fails or the server rejects
    /// the credentials.
    pub async fn login(&self) -> UploadResult<()> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                email: &self.credentials.email,
                password: &self.credentials.password,
            })
            .send()
            .await
            .map_err(|source| UploadError::http("login", &url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::status("login", &url, status.as_u16()));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|source| UploadError::http("login", &url, source))?;

        let mut state = self.state.write().await;
        *state = Some(SessionState {
            token: body.token,
            expires_at: Instant::now() + (TOKEN_LIFETIME - REFRESH_MARGIN),
        });
        info!("authenticated against ingestion api");
        Ok(())
    }

    /// Whether a token is held and its conservative window has not lapsed.
    pub async fn is_valid(&self) -> bool {
        self.state
            .read()
            .await
            .as_ref()
            .is_some_and(|session| Instant::now() < session.expires_at)
    }

    /// Run a request with a valid bearer token, forcing one re-login and
    /// retry when the server answers 401.
    ///
    /// # Errors
    ///
    /// Returns the request's error unchanged, except that a second 401
    /// after the forced re-login surfaces as a fatal
    /// [`UploadError::AuthRejected`].
    pub async fn with_auth<T, F, Fut>(&self, operation: &'static str, request: F) -> UploadResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = UploadResult<T>>,
    {
        if !self.is_valid().await {
            debug!(operation, "session invalid, logging in");
            self.login().await?;
        }

        let token = self.current_token().await?;
        match request(token).await {
            Err(error) if error.is_unauthorized() => {
                warn!(operation, "server rejected token, forcing re-login");
                self.login().await?;
                let token = self.current_token().await?;
                match request(token).await {
                    Err(error) if error.is_unauthorized() => {
                        Err(UploadError::AuthRejected { operation })
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn current_token(&self) -> UploadResult<String> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|session| session.token.clone())
            .ok_or(UploadError::AuthRejected { operation: "token" })
    }

    /// Seed the session with an arbitrary token, bypassing login.
    #[cfg(test)]
    pub(crate) async fn seed_token(&self, token: &str, valid: bool) {
        let expires_at = if valid {
            Instant::now() + Duration::from_secs(60)
        } else {
            Instant::now() - Duration::from_secs(1)
        };
        let mut state = self.state.write().await;
        *state = Some(SessionState {
            token: token.to_string(),
            expires_at,
        });
    }
}
