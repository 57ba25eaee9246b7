//! Error types for the authorization flow and the VK API error vocabulary

use thiserror::Error;

pub type Result<T, E = AuthError> = std::result::Result<T, E>;

/// Stable codes for authorization failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    AuthorizationFailed,
    UnknownPermission,
    MalformedRedirect,
    PageBlocked,
    InvalidCredentials,
    FailedPassedCaptcha,
    FailedPassedTwoFactor,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationFailed => "AUTHORIZATION_FAILED",
            Self::UnknownPermission => "UNKNOWN_PERMISSION",
            Self::MalformedRedirect => "MALFORMED_REDIRECT",
            Self::PageBlocked => "PAGE_BLOCKED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::FailedPassedCaptcha => "FAILED_PASSED_CAPTCHA",
            Self::FailedPassedTwoFactor => "FAILED_PASSED_TWO_FACTOR",
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while resolving, running or parsing an authorization attempt
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unknown permission: {name}")]
    UnknownPermission { name: String },

    #[error("Failed passed grant access: {description}")]
    AuthorizationFailed { description: String },

    #[error("Malformed redirect {url}: {reason}")]
    MalformedRedirect { url: String, reason: String },

    #[error("API error {}: {message}", .kind.code())]
    Api { kind: ApiErrorKind, message: String },

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Builds an [`AuthError::Api`] from a raw remote error code
    pub fn api(code: u32, message: impl Into<String>) -> Self {
        Self::Api {
            kind: ApiErrorKind::classify(code),
            message: message.into(),
        }
    }

    /// Authorization error code, if this error belongs to that vocabulary
    pub fn code(&self) -> Option<AuthErrorCode> {
        match self {
            Self::UnknownPermission { .. } => Some(AuthErrorCode::UnknownPermission),
            Self::AuthorizationFailed { .. } => Some(AuthErrorCode::AuthorizationFailed),
            Self::MalformedRedirect { .. } => Some(AuthErrorCode::MalformedRedirect),
            Self::Flow(flow) => flow.code(),
            Self::Api { .. } | Self::Http(_) => None,
        }
    }
}

/// Failures raised by a flow driver while walking the authorization pages
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Captcha required")]
    CaptchaRequired,

    #[error("Captcha was not accepted")]
    FailedCaptcha,

    #[error("Two-factor code required")]
    TwoFactorRequired,

    #[error("Two-factor code was not accepted")]
    FailedTwoFactor,

    #[error("Page is blocked")]
    PageBlocked,

    #[error("Unexpected page: {url}")]
    UnexpectedPage { url: String },

    #[error("Authorization did not finish within {limit} steps")]
    TooManySteps { limit: usize },

    #[error("Challenge handler failed: {0}")]
    Challenge(String),
}

impl FlowError {
    pub fn code(&self) -> Option<AuthErrorCode> {
        match self {
            Self::InvalidCredentials => Some(AuthErrorCode::InvalidCredentials),
            Self::CaptchaRequired | Self::FailedCaptcha => Some(AuthErrorCode::FailedPassedCaptcha),
            Self::TwoFactorRequired | Self::FailedTwoFactor => {
                Some(AuthErrorCode::FailedPassedTwoFactor)
            }
            Self::PageBlocked => Some(AuthErrorCode::PageBlocked),
            _ => None,
        }
    }
}

/// Semantic kinds of the numeric error codes returned by the VK API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    UnknownError,
    AppSwitchedOff,
    UnknownMethod,
    AuthFailure,
    TooManyRequests,
    ScopeNeeded,
    IncorrectRequest,
    TooManySimilarActions,
    InternalError,
    CaptchaRequired,
    AccessDenied,
    UserValidationRequired,
    PageBlocked,
    StandaloneOnly,
    StandaloneAndOpenApiOnly,
    MethodDisabled,
    ConfirmationRequired,
    GroupTokenNotValid,
    AppTokenNotValid,
    WrongParameter,
    IncorrectUserId,
    AlbumAccessDenied,
    AudioAccessDenied,
    GroupAccessDenied,
    AlbumOverflow,
    PaymentsDisabled,
    CommercialAccessDenied,
    CommercialError,
    /// A code with no mapped kind, kept verbatim
    UnknownRemote(u32),
}

/// Code → kind table
const API_ERRORS: &[(u32, ApiErrorKind)] = &[
    (1, ApiErrorKind::UnknownError),
    (2, ApiErrorKind::AppSwitchedOff),
    (3, ApiErrorKind::UnknownMethod),
    (5, ApiErrorKind::AuthFailure),
    (6, ApiErrorKind::TooManyRequests),
    (7, ApiErrorKind::ScopeNeeded),
    (8, ApiErrorKind::IncorrectRequest),
    (9, ApiErrorKind::TooManySimilarActions),
    (10, ApiErrorKind::InternalError),
    (14, ApiErrorKind::CaptchaRequired),
    (15, ApiErrorKind::AccessDenied),
    (17, ApiErrorKind::UserValidationRequired),
    (18, ApiErrorKind::PageBlocked),
    (20, ApiErrorKind::StandaloneOnly),
    (21, ApiErrorKind::StandaloneAndOpenApiOnly),
    (23, ApiErrorKind::MethodDisabled),
    (24, ApiErrorKind::ConfirmationRequired),
    (27, ApiErrorKind::GroupTokenNotValid),
    (28, ApiErrorKind::AppTokenNotValid),
    (100, ApiErrorKind::WrongParameter),
    (113, ApiErrorKind::IncorrectUserId),
    (200, ApiErrorKind::AlbumAccessDenied),
    (201, ApiErrorKind::AudioAccessDenied),
    (203, ApiErrorKind::GroupAccessDenied),
    (300, ApiErrorKind::AlbumOverflow),
    (500, ApiErrorKind::PaymentsDisabled),
    (600, ApiErrorKind::CommercialAccessDenied),
    (603, ApiErrorKind::CommercialError),
];

impl ApiErrorKind {
    /// Maps a remote error code to its kind. Unmapped codes become
    /// [`ApiErrorKind::UnknownRemote`] carrying the code.
    pub fn classify(code: u32) -> Self {
        API_ERRORS
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::UnknownRemote(code))
    }

    /// Raw code for this kind
    pub fn code(&self) -> u32 {
        match self {
            Self::UnknownRemote(code) => *code,
            kind => API_ERRORS
                .iter()
                .find(|(_, known)| known == kind)
                .map(|(code, _)| *code)
                .unwrap_or_default(),
        }
    }

    /// Whether repeating the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TooManyRequests | Self::TooManySimilarActions | Self::InternalError
        )
    }
}
