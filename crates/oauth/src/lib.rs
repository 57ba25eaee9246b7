//! Browserless VK implicit grant authorization
//!
//! This crate resolves requested permissions into a scope bitmask, builds the
//! authorization URL, and recovers the access token (or a typed failure) from
//! the fragment of the final redirect. Walking the intermediate login and
//! consent pages is delegated to a [`FlowDriver`].

pub mod constants;
pub mod errors;
pub mod flow;
pub mod permissions;
pub mod redirect;
pub mod request;
pub mod scope;
pub mod strategy;
pub mod tokens;

pub use errors::{ApiErrorKind, AuthError, AuthErrorCode, FlowError};
pub use flow::{FinalResponse, FlowDriver, ImplicitFlow};
pub use permissions::{PermissionCatalog, ScopeMask};
pub use redirect::{AuthorizationFailure, AuthorizationOutcome};
pub use request::AuthorizationRequest;
pub use scope::ScopeSpec;
pub use strategy::{GroupImplicitFlow, ImplicitFlowStrategy, UserImplicitFlow};
pub use tokens::{fetch_profile, GroupToken, GroupTokens, UserProfile, UserToken};
