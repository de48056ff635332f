//! Profile of the signed-in user.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{from_payload, require_session};
use crate::api::wire;
use crate::api::{Dispatcher, RequestError, RequestResult};

pub const PROFILE_ENDPOINT: &str = "/api/profile";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

pub struct ProfileService<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> ProfileService<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Fetches the profile of the session's user.
    ///
    /// # Errors
    /// `AuthRejected` without a session (no request sent), `ServerError` for
    /// an empty body; otherwise the dispatcher's classification.
    pub async fn get_profile(&self) -> RequestResult<Profile> {
        require_session(self.dispatcher)?;

        let payload = self
            .dispatcher
            .dispatch(Method::GET, PROFILE_ENDPOINT, None)
            .await?;
        if payload.is_null() {
            return Err(RequestError::server("Empty profile response"));
        }
        from_payload(payload, "profile")
    }
}
