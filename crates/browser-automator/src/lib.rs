//! Browserless driver for the VK authorization pages
//!
//! [`ProtocolDriver`] implements [`oauth::FlowDriver`]: it follows redirects,
//! fills the login form, hands captcha and two-factor pages to a
//! [`ChallengeHandler`], submits the consent form and stops at the blank
//! callback.

pub mod challenge;
pub mod form;
pub mod protocol_driver;

use common::config::{AccountConfig, HttpConfig};
use oauth::FlowError;
use std::sync::Arc;
use std::time::Duration;

pub use challenge::{ChallengeHandler, NoChallenges};
pub use form::{FormKind, HtmlForm};
pub use protocol_driver::{Credentials, ProtocolDriver, ProtocolDriverBuilder};

/// Builds a driver from configuration
pub fn driver_from_config(
    account: &AccountConfig,
    http: &HttpConfig,
    challenges: Arc<dyn ChallengeHandler>,
) -> Result<ProtocolDriver, FlowError> {
    let credentials = Credentials {
        login: account.login.clone().unwrap_or_default(),
        password: account.password.clone().unwrap_or_default(),
    };

    let mut builder = ProtocolDriver::builder(credentials).challenges(challenges);

    if let Some(timeout) = http.timeout_secs {
        builder = builder.timeout(Duration::from_secs(timeout));
    }
    if let Some(user_agent) = &http.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    builder.build()
}
