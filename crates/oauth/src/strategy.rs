//! Authentication strategies: how a request is built and how its callback is read

use crate::errors::Result;
use crate::permissions::PermissionCatalog;
use crate::redirect::{parse_group_redirect, parse_user_redirect, AuthorizationOutcome};
use crate::request::AuthorizationRequest;
use crate::scope::ScopeSpec;
use crate::tokens::{GroupTokens, UserToken};

/// The two hooks an implicit grant variant supplies to the shared flow
pub trait ImplicitFlowStrategy: Send + Sync {
    type Token: Send;

    /// Resolves the scope and builds the request. Fails before any network I/O.
    fn authorization_request(&self) -> Result<AuthorizationRequest>;

    /// Reads the outcome out of the final redirect URL
    fn parse_redirect(&self, final_url: &str) -> Result<AuthorizationOutcome<Self::Token>>;
}

/// User access token via the implicit grant
#[derive(Debug, Clone)]
pub struct UserImplicitFlow {
    pub client_id: u64,
    pub scope: ScopeSpec,
}

impl UserImplicitFlow {
    pub fn new(client_id: u64, scope: ScopeSpec) -> Self {
        Self { client_id, scope }
    }
}

impl ImplicitFlowStrategy for UserImplicitFlow {
    type Token = UserToken;

    fn authorization_request(&self) -> Result<AuthorizationRequest> {
        let scope = self.scope.resolve(&PermissionCatalog::USER)?;
        Ok(AuthorizationRequest::new(self.client_id, scope))
    }

    fn parse_redirect(&self, final_url: &str) -> Result<AuthorizationOutcome<UserToken>> {
        parse_user_redirect(final_url)
    }
}

/// Community access tokens via the implicit grant
#[derive(Debug, Clone)]
pub struct GroupImplicitFlow {
    pub client_id: u64,
    pub scope: ScopeSpec,
    pub group_ids: Vec<u64>,
}

impl GroupImplicitFlow {
    pub fn new(client_id: u64, scope: ScopeSpec, group_ids: Vec<u64>) -> Self {
        Self {
            client_id,
            scope,
            group_ids,
        }
    }
}

impl ImplicitFlowStrategy for GroupImplicitFlow {
    type Token = GroupTokens;

    fn authorization_request(&self) -> Result<AuthorizationRequest> {
        let scope = self.scope.resolve(&PermissionCatalog::GROUP)?;
        Ok(AuthorizationRequest::for_groups(
            self.client_id,
            scope,
            self.group_ids.clone(),
        ))
    }

    fn parse_redirect(&self, final_url: &str) -> Result<AuthorizationOutcome<GroupTokens>> {
        parse_group_redirect(final_url)
    }
}
