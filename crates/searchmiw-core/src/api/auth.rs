//! Login, registration and logout against the auth gateway.

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::dispatcher::Dispatcher;
use super::error::{RequestError, RequestErrorKind, RequestResult, extract_error_message};
use super::wire;
use crate::session::AuthResult;

pub const LOGIN_ENDPOINT: &str = "/api/auth/login";
pub const REGISTER_ENDPOINT: &str = "/api/auth/register";

/// Fixed message for locally rejected credentials.
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter both email and password.";

const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
const ACCOUNT_EXISTS_MESSAGE: &str = "Registration failed: account already exists";
const MISSING_TOKEN_MESSAGE: &str = "Authentication response did not include a token";

/// Failure of a login/registration.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request itself failed (classified).
    #[error(transparent)]
    Request(#[from] RequestError),
    /// The server accepted the credentials but the session could not be saved.
    #[error("Failed to save session: {0:#}")]
    Session(anyhow::Error),
}

impl AuthError {
    /// Returns the request error kind, if the failure came from the request.
    pub fn kind(&self) -> Option<RequestErrorKind> {
        match self {
            AuthError::Request(e) => Some(e.kind),
            AuthError::Session(_) => None,
        }
    }

    pub fn request_error(&self) -> Option<&RequestError> {
        match self {
            AuthError::Request(e) => Some(e),
            AuthError::Session(_) => None,
        }
    }
}

/// Body of a successful auth response: `{token, userId, name, email}`.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(rename = "userId", default, deserialize_with = "wire::opt_id")]
    user_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl AuthResponse {
    fn into_result(self) -> RequestResult<AuthResult> {
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| RequestError::server(MISSING_TOKEN_MESSAGE))?;
        Ok(AuthResult {
            token,
            user_id: self.user_id,
            display_name: self.name.filter(|n| !n.is_empty()),
            email: self.email.filter(|e| !e.is_empty()),
        })
    }
}

fn classify_login(status: u16, body: &str) -> RequestError {
    if matches!(status, 401 | 403) {
        let message =
            extract_error_message(body).unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string());
        return RequestError::auth_rejected(message).with_status(status);
    }
    RequestError::from_status(status, body)
}

fn classify_register(status: u16, body: &str) -> RequestError {
    if status == 409 {
        let message =
            extract_error_message(body).unwrap_or_else(|| ACCOUNT_EXISTS_MESSAGE.to_string());
        return RequestError::validation(message).with_status(status);
    }
    RequestError::from_status(status, body)
}

fn require_credentials(email: &str, password: &str) -> RequestResult<()> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(RequestError::validation(MISSING_CREDENTIALS_MESSAGE));
    }
    Ok(())
}

/// Auth gateway client. Owns every write to the session.
pub struct AuthClient<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> AuthClient<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Logs in and stores the session.
    ///
    /// # Errors
    /// - `ValidationError` for an empty email or password (no request sent)
    /// - `AuthRejected` on HTTP 401/403
    /// - `ServerError` on other failures or a response without a token
    /// - `Network` when the gateway is unreachable
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        require_credentials(email, password)?;

        let body = json!({
            "email": email.trim(),
            "password": password,
        });
        let outgoing = self
            .dispatcher
            .outgoing(Method::POST, LOGIN_ENDPOINT)
            .body(Some(&body))
            .anonymous()
            .classify_with(classify_login);
        let raw = self.dispatcher.execute(outgoing).await?;

        self.store(raw)
    }

    /// Creates an account and stores the session.
    ///
    /// # Errors
    /// - `ValidationError` for an empty email or password (no request sent),
    ///   or when the server reports a conflict (HTTP 409)
    /// - `AuthRejected` on HTTP 401/403
    /// - `ServerError` on other failures
    /// - `Network` when the gateway is unreachable
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthResult, AuthError> {
        require_credentials(email, password)?;

        let body = json!({
            "name": display_name.trim(),
            "email": email.trim(),
            "password": password,
        });
        let outgoing = self
            .dispatcher
            .outgoing(Method::POST, REGISTER_ENDPOINT)
            .body(Some(&body))
            .anonymous()
            .classify_with(classify_register);
        let raw = self.dispatcher.execute(outgoing).await?;

        self.store(raw)
    }

    /// Clears the session. Returns whether one existed.
    ///
    /// # Errors
    /// Returns an error if the session file cannot be removed.
    pub fn logout(&self) -> anyhow::Result<bool> {
        self.dispatcher.session().clear()
    }

    fn store(&self, raw: serde_json::Value) -> Result<AuthResult, AuthError> {
        let response: AuthResponse = serde_json::from_value(raw)
            .map_err(|e| RequestError::server(format!("Invalid authentication response: {e}")))?;
        let result = response.into_result()?;

        self.dispatcher
            .session()
            .set(result.clone())
            .map_err(AuthError::Session)?;
        tracing::info!(
            user_id = result.user_id.as_deref().unwrap_or("-"),
            "authenticated"
        );
        Ok(result)
    }
}
