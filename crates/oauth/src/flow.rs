//! Implicit grant flow
//!
//! 1. Resolve the scope and build the authorization URL (strategy)
//! 2. Hand the URL to a [`FlowDriver`], which walks login/consent pages
//!    until it is redirected to the blank callback
//! 3. Parse the callback fragment into a token or a typed failure (strategy)

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::errors::{FlowError, Result};
use crate::request::default_oauth_base;
use crate::strategy::ImplicitFlowStrategy;

/// Last response reached after all automated steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalResponse {
    /// Absolute URL, fragment included
    pub url: String,
    pub status: u16,
}

/// Walks the authorization pages starting at the authorization URL
#[async_trait]
pub trait FlowDriver: Send + Sync {
    async fn drive(&self, start: Url) -> std::result::Result<FinalResponse, FlowError>;
}

/// Runs implicit grant strategies through a driver
pub struct ImplicitFlow<D> {
    driver: D,
    oauth_base: Url,
}

impl<D: FlowDriver> ImplicitFlow<D> {
    /// Flow against the production OAuth host
    pub fn new(driver: D) -> Self {
        Self::with_base(driver, default_oauth_base())
    }

    /// Flow against another OAuth host (proxies, test servers)
    pub fn with_base(driver: D, oauth_base: Url) -> Self {
        Self { driver, oauth_base }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Authorization URL the strategy would start from
    pub fn authorization_url<S: ImplicitFlowStrategy>(&self, strategy: &S) -> Result<Url> {
        Ok(strategy.authorization_request()?.to_url(&self.oauth_base))
    }

    /// Runs one attempt. Dropping the future aborts the in-flight request and
    /// yields no outcome.
    pub async fn run<S: ImplicitFlowStrategy>(&self, strategy: &S) -> Result<S::Token> {
        let url = self.authorization_url(strategy)?;
        debug!("Starting implicit flow at {}", url);

        let response = self.driver.drive(url).await?;
        debug!(
            "Flow finished at {} (status {})",
            redact_fragment(&response.url),
            response.status
        );

        let token = strategy.parse_redirect(&response.url)?.into_result()?;
        info!("Implicit flow authorization succeeded");

        Ok(token)
    }
}

/// Keeps fragment keys but hides values, which carry tokens
fn redact_fragment(url: &str) -> String {
    match url.split_once('#') {
        Some((head, fragment)) => {
            let keys: Vec<&str> = fragment
                .split('&')
                .map(|pair| pair.split('=').next().unwrap_or_default())
                .collect();
            format!("{}#{}", head, keys.join("&"))
        }
        None => url.to_string(),
    }
}
