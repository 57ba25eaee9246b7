//! Parsing of the final redirect reached by the flow driver
//!
//! The callback carries its result in the URL fragment, not the query:
//!
//! - success: `access_token=..&expires_in=..&user_id=..[&email=..]`
//! - failure: `error=..&error_description=..`

use tracing::warn;
use url::Url;

use crate::errors::{AuthError, AuthErrorCode, Result};
use crate::tokens::{GroupToken, GroupTokens, UserToken};

/// Decoded `key=value` pairs of a URL fragment, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentParams(Vec<(String, String)>);

impl FragmentParams {
    /// Extracts the fragment of `final_url`. A URL that does not parse, or
    /// that has no fragment at all, is a structural break in the flow.
    pub fn from_url(final_url: &str) -> Result<Self> {
        let url = Url::parse(final_url).map_err(|e| AuthError::MalformedRedirect {
            url: final_url.to_string(),
            reason: e.to_string(),
        })?;

        let fragment = url.fragment().ok_or_else(|| AuthError::MalformedRedirect {
            url: final_url.to_string(),
            reason: "no fragment in redirect".to_string(),
        })?;

        Ok(Self::parse(fragment))
    }

    /// Parses a raw fragment (without the leading `#`)
    pub fn parse(fragment: &str) -> Self {
        Self(
            url::form_urlencoded::parse(fragment.as_bytes())
                .into_owned()
                .collect(),
        )
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` is present, even with an empty value
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Integer field where a missing or empty value reads as zero
    fn number(&self, key: &str, final_url: &str) -> Result<u64> {
        match self.get(key) {
            None | Some("") => Ok(0),
            Some(raw) => raw.parse().map_err(|_| AuthError::MalformedRedirect {
                url: final_url.to_string(),
                reason: format!("{key}={raw} is not an integer"),
            }),
        }
    }

    /// Returns the remote rejection when an `error` parameter is present
    fn failure(&self) -> Option<AuthorizationFailure> {
        if !self.has("error") {
            return None;
        }

        Some(AuthorizationFailure {
            error: self.get("error").unwrap_or_default().to_string(),
            description: self
                .get("error_description")
                .filter(|description| !description.is_empty())
                .unwrap_or("Unknown error")
                .to_string(),
        })
    }
}

/// A rejection reported by the remote service through the redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationFailure {
    /// Raw `error` parameter, e.g. `access_denied`
    pub error: String,
    /// `error_description`, or "Unknown error" when absent
    pub description: String,
}

impl AuthorizationFailure {
    pub fn code(&self) -> AuthErrorCode {
        AuthErrorCode::AuthorizationFailed
    }
}

/// Result of one authorization attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome<T> {
    Success(T),
    Failure(AuthorizationFailure),
}

impl<T> AuthorizationOutcome<T> {
    /// Turns a failure into [`AuthError::AuthorizationFailed`]
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Success(token) => Ok(token),
            Self::Failure(failure) => Err(AuthError::AuthorizationFailed {
                description: failure.description,
            }),
        }
    }
}

/// Parses the callback of a user token request
pub fn parse_user_redirect(final_url: &str) -> Result<AuthorizationOutcome<UserToken>> {
    let params = FragmentParams::from_url(final_url)?;

    if let Some(failure) = params.failure() {
        return Ok(AuthorizationOutcome::Failure(failure));
    }

    let access_token = params.get("access_token").unwrap_or_default();
    if access_token.is_empty() {
        warn!("redirect fragment has no access_token");
    }

    Ok(AuthorizationOutcome::Success(UserToken {
        email: params.get("email").map(str::to_string),
        user_id: params.number("user_id", final_url)?,
        access_token: access_token.to_string(),
        expires_in: params.number("expires_in", final_url)?,
    }))
}

/// Parses the callback of a community token request.
/// Tokens arrive as `access_token_<group id>` keys.
pub fn parse_group_redirect(final_url: &str) -> Result<AuthorizationOutcome<GroupTokens>> {
    let params = FragmentParams::from_url(final_url)?;

    if let Some(failure) = params.failure() {
        return Ok(AuthorizationOutcome::Failure(failure));
    }

    let mut tokens = Vec::new();
    for (key, value) in params.iter() {
        let Some(id) = key.strip_prefix("access_token_") else {
            continue;
        };

        let group_id = id.parse().map_err(|_| AuthError::MalformedRedirect {
            url: final_url.to_string(),
            reason: format!("{key} does not name a group id"),
        })?;

        tokens.push(GroupToken {
            group_id,
            access_token: value.to_string(),
        });
    }

    Ok(AuthorizationOutcome::Success(GroupTokens {
        tokens,
        expires_in: params.number("expires_in", final_url)?,
    }))
}
