use anyhow::{Context, Result};
use browser_automator::{ChallengeHandler, NoChallenges, driver_from_config};
use chrono::Utc;
use common::config::Config;
use oauth::constants::VK_API_URL;
use oauth::{
    GroupImplicitFlow, ImplicitFlow, PermissionCatalog, ScopeSpec, UserImplicitFlow,
    fetch_profile,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::args::LoginArgs;
use crate::prompt::TerminalChallenges;

/// Command line value wins over the config file; neither means everything
fn scope_spec(arg: Option<&str>, config: Option<&toml::Value>) -> Result<ScopeSpec> {
    match (arg, config) {
        (Some(arg), _) => Ok(ScopeSpec::from(arg)),
        (None, Some(value)) => value
            .clone()
            .try_into()
            .context("Invalid scope in config file"),
        (None, None) => Ok(ScopeSpec::All),
    }
}

fn catalog(groups: bool) -> &'static PermissionCatalog {
    if groups {
        &PermissionCatalog::GROUP
    } else {
        &PermissionCatalog::USER
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn login(args: LoginArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    let account = &mut config.account;
    if args.login.is_some() {
        account.login = args.login.clone();
    }
    if args.password.is_some() {
        account.password = args.password.clone();
    }
    if !args.group_ids.is_empty() {
        account.group_ids = args.group_ids.clone();
    }

    let app_id = args
        .app_id
        .or(account.app_id)
        .context("No application id: pass --app-id or set account.app_id")?;
    let scope = scope_spec(args.scope.as_deref(), account.scope.as_ref())?;

    let challenges: Arc<dyn ChallengeHandler> = if args.interactive {
        Arc::new(TerminalChallenges)
    } else {
        Arc::new(NoChallenges)
    };
    let driver = driver_from_config(&config.account, &config.http, challenges)?;

    let flow = match args.oauth_url.as_ref().or(config.http.oauth_url.as_ref()) {
        Some(base) => ImplicitFlow::with_base(driver, Url::parse(base).context("Invalid OAuth URL")?),
        None => ImplicitFlow::new(driver),
    };

    let issued_at = Utc::now();

    if !config.account.group_ids.is_empty() {
        let strategy = GroupImplicitFlow::new(app_id, scope, config.account.group_ids.clone());
        let tokens = flow.run(&strategy).await?;
        info!("Received {} community tokens", tokens.tokens.len());

        return print_json(&json!({
            "tokens": tokens.tokens,
            "expires_in": tokens.expires_in,
            "expires_at": tokens.expires_at(issued_at),
        }));
    }

    let token = flow.run(&UserImplicitFlow::new(app_id, scope)).await?;
    info!("Authorized user {}", token.user_id);

    let profile = if args.verify {
        let api_url = config.http.api_url.as_deref().unwrap_or(VK_API_URL);
        Some(fetch_profile(flow.driver().client(), api_url, &token.access_token).await?)
    } else {
        None
    };

    print_json(&json!({
        "user_id": token.user_id,
        "email": token.email,
        "access_token": token.access_token,
        "expires_in": token.expires_in,
        "expires_at": token.expires_at(issued_at),
        "profile": profile,
    }))
}

pub fn scope(spec: &str, groups: bool) -> Result<()> {
    let catalog = catalog(groups);
    let mask = ScopeSpec::from(spec).resolve(catalog)?;

    print_json(&json!({
        "mask": mask,
        "permissions": catalog.describe(mask),
    }))
}

pub fn permissions(groups: bool) -> Result<()> {
    for (name, bit) in catalog(groups).entries() {
        println!("{name:<16}{bit}");
    }
    Ok(())
}

pub async fn verify(token: &str, api_url: Option<String>) -> Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(oauth::constants::VK_USER_AGENT)
        .build()?;
    let api_url = api_url.as_deref().unwrap_or(VK_API_URL);

    let profile = fetch_profile(&client, api_url, token).await?;
    print_json(&json!({ "profile": profile }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_spec_precedence() {
        let config: toml::Value = toml::Value::Array(vec!["friends".into(), "wall".into()]);

        assert_eq!(
            scope_spec(Some("photos"), Some(&config)).unwrap(),
            ScopeSpec::names(["photos"])
        );
        assert_eq!(
            scope_spec(None, Some(&config)).unwrap(),
            ScopeSpec::names(["friends", "wall"])
        );
        assert_eq!(
            scope_spec(None, Some(&toml::Value::Integer(4096))).unwrap(),
            ScopeSpec::Mask(4096)
        );
        assert_eq!(scope_spec(None, None).unwrap(), ScopeSpec::All);
    }

    #[test]
    fn test_catalog_selection() {
        assert_eq!(catalog(false).all(), PermissionCatalog::USER.all());
        assert_eq!(catalog(true).lookup("manage"), Some(262144));
    }
}
