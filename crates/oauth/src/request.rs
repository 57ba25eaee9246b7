//! Authorization endpoint request construction

use url::Url;

use crate::constants::{VK_API_VERSION, VK_AUTHORIZE_PATH, VK_CALLBACK_BLANK, VK_OAUTH_URL};
use crate::permissions::ScopeMask;

/// Parses the default OAuth host
pub fn default_oauth_base() -> Url {
    Url::parse(VK_OAUTH_URL).expect("VK_OAUTH_URL is a valid URL")
}

/// One implicit grant request. Fully determines the authorization URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub client_id: u64,
    pub scope: ScopeMask,
    /// Community ids, set only for community token requests
    pub group_ids: Vec<u64>,
}

impl AuthorizationRequest {
    /// Request for a user access token
    pub fn new(client_id: u64, scope: ScopeMask) -> Self {
        Self {
            client_id,
            scope,
            group_ids: Vec::new(),
        }
    }

    /// Request for community access tokens
    pub fn for_groups(client_id: u64, scope: ScopeMask, group_ids: Vec<u64>) -> Self {
        Self {
            client_id,
            scope,
            group_ids,
        }
    }

    /// Query parameters in the order they are sent
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("redirect_uri", VK_CALLBACK_BLANK.to_string()),
            ("response_type", "token".to_string()),
            ("display", "page".to_string()),
            ("v", VK_API_VERSION.to_string()),
            ("client_id", self.client_id.to_string()),
            // Always force the consent page instead of reusing an earlier grant
            ("revoke", "1".to_string()),
            ("scope", self.scope.to_string()),
        ];

        if !self.group_ids.is_empty() {
            let ids: Vec<String> = self.group_ids.iter().map(u64::to_string).collect();
            params.push(("group_ids", ids.join(",")));
        }

        params
    }

    /// Authorization URL on the given OAuth host
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_path(VK_AUTHORIZE_PATH);
        url.set_fragment(None);
        url.query_pairs_mut().clear().extend_pairs(self.params());
        url
    }
}
