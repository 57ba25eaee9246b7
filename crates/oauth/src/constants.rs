//! Protocol constants for the VK OAuth service
//!
//! These values are shared by the request builder, the flow driver and the
//! API client.

/// VK API version sent as `v` on every request
pub const VK_API_VERSION: &str = "5.68";

/// OAuth host
pub const VK_OAUTH_URL: &str = "https://oauth.vk.com";

/// Path of the authorization endpoint on the OAuth host
pub const VK_AUTHORIZE_PATH: &str = "/authorize";

/// Reserved "blank page" callback. Navigation halts when a redirect points here.
pub const VK_CALLBACK_BLANK: &str = "https://oauth.vk.com/blank.html";

/// API method endpoint
pub const VK_API_URL: &str = "https://api.vk.com/method";

/// User-Agent header for every outbound request
pub const VK_USER_AGENT: &str = concat!("vk-auth/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout applied by the flow driver and API client
pub const DEFAULT_TIMEOUT_SECS: u64 = 6;

/// Upper bound on automated fetch/submit steps in one authorization attempt
pub const MAX_FLOW_STEPS: usize = 16;
