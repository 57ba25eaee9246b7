//! Token types and token verification against the API

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::VK_API_VERSION;
use crate::errors::{AuthError, Result};

/// A user access token recovered from the callback fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserToken {
    /// Only present when the `email` permission was granted
    pub email: Option<String>,

    pub user_id: u64,

    pub access_token: String,

    /// Seconds until expiry; 0 means the token does not expire (`offline`)
    pub expires_in: u64,
}

impl UserToken {
    /// Absolute expiry for a token issued at `issued_at`
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        expiry(issued_at, self.expires_in)
    }
}

/// A community access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupToken {
    pub group_id: u64,
    pub access_token: String,
}

/// All community tokens issued by one authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTokens {
    pub tokens: Vec<GroupToken>,
    pub expires_in: u64,
}

impl GroupTokens {
    pub fn token_for(&self, group_id: u64) -> Option<&str> {
        self.tokens
            .iter()
            .find(|token| token.group_id == group_id)
            .map(|token| token.access_token.as_str())
    }

    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        expiry(issued_at, self.expires_in)
    }
}

fn expiry(issued_at: DateTime<Utc>, expires_in: u64) -> Option<DateTime<Utc>> {
    if expires_in == 0 {
        return None;
    }
    let seconds = i64::try_from(expires_in).ok()?;
    issued_at.checked_add_signed(Duration::seconds(seconds))
}

/// Profile of the token owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
}

/// Envelope of every API method response
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiResponse<T> {
    Ok { response: T },
    Err { error: ApiErrorBody },
}

/// `error` object of a failed API call
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_code: u32,
    #[serde(default)]
    error_msg: String,
}

/// Checks a user token by calling `users.get` with it.
/// API errors are classified into [`AuthError::Api`].
pub async fn fetch_profile(
    client: &reqwest::Client,
    api_url: &str,
    access_token: &str,
) -> Result<UserProfile> {
    let url = format!("{}/users.get", api_url.trim_end_matches('/'));
    debug!("Verifying token via {}", url);

    let response: ApiResponse<Vec<UserProfile>> = client
        .post(&url)
        .form(&[("access_token", access_token), ("v", VK_API_VERSION)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    match response {
        ApiResponse::Ok { response } => response
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::api(113, "users.get returned no users")),
        ApiResponse::Err { error } => Err(AuthError::api(error.error_code, error.error_msg)),
    }
}
