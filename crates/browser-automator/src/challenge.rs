use async_trait::async_trait;
use oauth::FlowError;
use url::Url;

/// Answers interactive challenges met while walking the authorization pages.
///
/// Both hooks default to failing, so a driver without a handler stops at the
/// first captcha or two-factor page.
#[async_trait]
pub trait ChallengeHandler: Send + Sync {
    /// Returns the text of the captcha identified by `sid`
    async fn captcha(&self, _sid: &str, _image: &Url) -> Result<String, FlowError> {
        Err(FlowError::CaptchaRequired)
    }

    /// Returns the current two-factor code
    async fn two_factor_code(&self) -> Result<String, FlowError> {
        Err(FlowError::TwoFactorRequired)
    }
}

/// Handler that answers no challenges
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChallenges;

#[async_trait]
impl ChallengeHandler for NoChallenges {}
