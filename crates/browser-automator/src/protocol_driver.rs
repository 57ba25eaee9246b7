use async_trait::async_trait;
use oauth::constants::{DEFAULT_TIMEOUT_SECS, MAX_FLOW_STEPS, VK_CALLBACK_BLANK, VK_USER_AGENT};
use oauth::{FinalResponse, FlowDriver, FlowError};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::challenge::{ChallengeHandler, NoChallenges};
use crate::form::{FormKind, FormMethod, HtmlForm, find_captcha_image};

/// Captcha answers tried before giving up
const MAX_CAPTCHA_ATTEMPTS: usize = 3;

/// Login and password submitted on the login page
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Walks the authorization pages over plain HTTP with a cookie jar.
///
/// Redirects are followed by hand so the walk can stop at the blank callback
/// without fetching it; the token lives in that URL's fragment.
#[derive(Clone)]
pub struct ProtocolDriver {
    client: Client,
    credentials: Credentials,
    challenges: Arc<dyn ChallengeHandler>,
    callback: String,
    max_steps: usize,
}

enum Step {
    Get(Url),
    Submit(HtmlForm),
}

impl ProtocolDriver {
    pub fn new(credentials: Credentials) -> Result<Self, FlowError> {
        Self::builder(credentials).build()
    }

    pub fn builder(credentials: Credentials) -> ProtocolDriverBuilder {
        ProtocolDriverBuilder {
            credentials,
            challenges: Arc::new(NoChallenges),
            user_agent: VK_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_steps: MAX_FLOW_STEPS,
        }
    }

    /// The underlying HTTP client, sharing this driver's cookies
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn is_callback(&self, url: &Url) -> bool {
        let mut bare = url.clone();
        bare.set_fragment(None);
        bare.set_query(None);
        bare.as_str() == self.callback
    }

    async fn send(&self, step: Step) -> Result<Response, FlowError> {
        let request = match step {
            Step::Get(url) => {
                debug!("GET {}", url);
                self.client.get(url)
            }
            Step::Submit(form) => {
                debug!("Submitting form to {}", form.action);
                match form.method {
                    FormMethod::Post => self.client.post(form.action.clone()).form(form.fields()),
                    FormMethod::Get => self.client.get(form.action.clone()).query(form.fields()),
                }
            }
        };

        Ok(request.send().await?)
    }
}

#[async_trait]
impl FlowDriver for ProtocolDriver {
    async fn drive(&self, start: Url) -> Result<FinalResponse, FlowError> {
        let mut step = Step::Get(start);
        let mut logins = 0;
        let mut captchas = 0;
        let mut two_factor = 0;

        for _ in 0..self.max_steps {
            let response = self.send(step).await?;
            let page_url = response.url().clone();
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|location| page_url.join(location).ok())
                    .ok_or_else(|| FlowError::UnexpectedPage {
                        url: page_url.to_string(),
                    })?;

                if self.is_callback(&location) {
                    return Ok(FinalResponse {
                        url: location.to_string(),
                        status: status.as_u16(),
                    });
                }

                step = Step::Get(location);
                continue;
            }

            if self.is_callback(&page_url) {
                return Ok(FinalResponse {
                    url: page_url.to_string(),
                    status: status.as_u16(),
                });
            }

            let html = response.text().await?;

            let Some(mut form) = HtmlForm::first(&html, &page_url) else {
                if page_url.as_str().contains("blocked") {
                    return Err(FlowError::PageBlocked);
                }
                return Err(FlowError::UnexpectedPage {
                    url: page_url.to_string(),
                });
            };

            match form.kind() {
                FormKind::Captcha => {
                    if captchas == MAX_CAPTCHA_ATTEMPTS {
                        return Err(FlowError::FailedCaptcha);
                    }
                    captchas += 1;
                    warn!("Captcha requested (attempt {})", captchas);

                    let sid = form.field("captcha_sid").unwrap_or_default().to_string();
                    let image = match find_captcha_image(&html, &page_url) {
                        Some(image) => image,
                        None => page_url
                            .join(&format!("/captcha.php?sid={sid}"))
                            .map_err(|_| FlowError::UnexpectedPage {
                                url: page_url.to_string(),
                            })?,
                    };

                    let key = self.challenges.captcha(&sid, &image).await?;
                    form.set("captcha_key", key);
                    if form.has_field("pass") {
                        self.fill_credentials(&mut form);
                    }
                }
                FormKind::Login => {
                    if logins > 0 {
                        return Err(FlowError::InvalidCredentials);
                    }
                    logins += 1;
                    self.fill_credentials(&mut form);
                }
                FormKind::TwoFactor => {
                    if two_factor > 0 {
                        return Err(FlowError::FailedTwoFactor);
                    }
                    two_factor += 1;
                    warn!("Two-factor code requested");

                    let code = self.challenges.two_factor_code().await?;
                    form.set("code", code);
                    form.set("remember", "1");
                }
                FormKind::Consent => debug!("Granting access at {}", form.action),
            }

            step = Step::Submit(form);
        }

        Err(FlowError::TooManySteps {
            limit: self.max_steps,
        })
    }
}

impl ProtocolDriver {
    fn fill_credentials(&self, form: &mut HtmlForm) {
        form.set("email", self.credentials.login.clone());
        form.set("pass", self.credentials.password.clone());
    }
}

pub struct ProtocolDriverBuilder {
    credentials: Credentials,
    challenges: Arc<dyn ChallengeHandler>,
    user_agent: String,
    timeout: Duration,
    max_steps: usize,
}

impl ProtocolDriverBuilder {
    pub fn challenges(mut self, challenges: Arc<dyn ChallengeHandler>) -> Self {
        self.challenges = challenges;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn build(self) -> Result<ProtocolDriver, FlowError> {
        let client = ClientBuilder::new()
            .cookie_store(true)
            .redirect(Policy::none())
            .user_agent(self.user_agent)
            .timeout(self.timeout)
            .build()?;

        Ok(ProtocolDriver {
            client,
            credentials: self.credentials,
            challenges: self.challenges,
            callback: VK_CALLBACK_BLANK.to_string(),
            max_steps: self.max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Form, Query};
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::response::{Html, IntoResponse, Redirect, Response as AxumResponse};
    use axum::routing::{get, post};
    use axum::Router;
    use oauth::{AuthError, ImplicitFlow, ImplicitFlowStrategy, ScopeSpec, UserImplicitFlow};
    use std::collections::HashMap;

    const SUCCESS: &str =
        "https://oauth.vk.com/blank.html#access_token=tok&expires_in=86400&user_id=7&email=u%40x.io";

    const LOGIN_FORM: &str = r#"<html><form method="post" action="/login?act=login&amp;soft=1">
        <input type="hidden" name="ip_h" value="abc">
        <input type="text" name="email"><input type="password" name="pass">
        </form></html>"#;

    const CAPTCHA_FORM: &str = r#"<html><form method="post" action="/login?act=login">
        <input type="hidden" name="ip_h" value="abc">
        <input type="hidden" name="captcha_sid" value="555">
        <img src="/captcha.php?sid=555">
        <input type="text" name="email"><input type="password" name="pass">
        <input type="text" name="captcha_key">
        </form></html>"#;

    const TWO_FACTOR_FORM: &str = r#"<html><form method="post" action="/login?act=authcheck_code">
        <input type="hidden" name="hash" value="h">
        <input type="text" name="code">
        </form></html>"#;

    const CONSENT_FORM: &str = r#"<html><form method="post" action="/grant">
        <input type="hidden" name="grant_hash" value="g">
        <input type="submit" value="Allow">
        </form></html>"#;

    async fn authorize(headers: HeaderMap) -> AxumResponse {
        if headers.get(header::USER_AGENT).is_none() {
            return StatusCode::BAD_REQUEST.into_response();
        }
        ([(header::SET_COOKIE, "session=abc; Path=/")], Html(LOGIN_FORM)).into_response()
    }

    async fn login(Form(form): Form<HashMap<String, String>>) -> AxumResponse {
        let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();

        if field("ip_h") != "abc" {
            return StatusCode::BAD_REQUEST.into_response();
        }

        match (field("email"), field("pass")) {
            ("captcha@x.io", "secret") if field("captcha_key") == "k" => {
                Redirect::to("/consent").into_response()
            }
            ("captcha@x.io", _) => Html(CAPTCHA_FORM).into_response(),
            ("2fa@x.io", "secret") => Redirect::to("/authcheck").into_response(),
            (_, "secret") => Redirect::to("/consent").into_response(),
            _ => Html(LOGIN_FORM).into_response(),
        }
    }

    async fn authcheck_code(Form(form): Form<HashMap<String, String>>) -> AxumResponse {
        if form.get("code").map(String::as_str) == Some("123456") {
            Redirect::to("/consent").into_response()
        } else {
            Html(TWO_FACTOR_FORM).into_response()
        }
    }

    async fn login_dispatch(
        Query(query): Query<HashMap<String, String>>,
        form: Form<HashMap<String, String>>,
    ) -> AxumResponse {
        match query.get("act").map(String::as_str) {
            Some("authcheck_code") => authcheck_code(form).await,
            _ => login(form).await,
        }
    }

    async fn grant(headers: HeaderMap) -> AxumResponse {
        let has_session = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("session=abc"));

        if has_session {
            (StatusCode::FOUND, [(header::LOCATION, SUCCESS)]).into_response()
        } else {
            Html("<html>session lost</html>").into_response()
        }
    }

    async fn spawn_server() -> Url {
        let app = Router::new()
            .route("/authorize", get(authorize))
            .route("/login", post(login_dispatch))
            .route("/authcheck", get(|| async { Html(TWO_FACTOR_FORM) }))
            .route("/consent", get(|| async { Html(CONSENT_FORM) }))
            .route("/grant", post(grant))
            .route(
                "/deny",
                get(|| async {
                    Redirect::to(
                        "https://oauth.vk.com/blank.html#error=access_denied&error_description=User%20denied",
                    )
                }),
            )
            .route("/loop", get(|| async { Redirect::to("/loop") }))
            .route("/blocked", get(|| async { Html("<html>blocked</html>") }))
            .route("/empty", get(|| async { Html("<html>nothing here</html>") }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn credentials(login: &str, password: &str) -> Credentials {
        Credentials {
            login: login.into(),
            password: password.into(),
        }
    }

    struct Answers;

    #[async_trait]
    impl ChallengeHandler for Answers {
        async fn captcha(&self, sid: &str, image: &Url) -> Result<String, FlowError> {
            assert_eq!(sid, "555");
            assert!(image.as_str().ends_with("/captcha.php?sid=555"));
            Ok("k".into())
        }

        async fn two_factor_code(&self) -> Result<String, FlowError> {
            Ok("123456".into())
        }
    }

    #[tokio::test]
    async fn test_full_flow_through_login_and_consent() {
        let base = spawn_server().await;
        let driver = ProtocolDriver::new(credentials("user@x.io", "secret")).unwrap();
        let flow = ImplicitFlow::with_base(driver, base);

        let token = flow
            .run(&UserImplicitFlow::new(1, ScopeSpec::All))
            .await
            .unwrap();

        assert_eq!(token.access_token, "tok");
        assert_eq!(token.user_id, 7);
        assert_eq!(token.expires_in, 86400);
        assert_eq!(token.email.as_deref(), Some("u@x.io"));
    }

    #[tokio::test]
    async fn test_stops_at_callback_with_fragment() {
        let base = spawn_server().await;
        let driver = ProtocolDriver::new(credentials("user@x.io", "secret")).unwrap();

        let response = driver.drive(base.join("/authorize").unwrap()).await.unwrap();
        assert_eq!(response.url, SUCCESS);
        assert_eq!(response.status, 302);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let base = spawn_server().await;
        let driver = ProtocolDriver::new(credentials("user@x.io", "wrong")).unwrap();

        let err = driver.drive(base.join("/authorize").unwrap()).await.unwrap_err();
        assert!(matches!(err, FlowError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_captcha_without_handler() {
        let base = spawn_server().await;
        let driver = ProtocolDriver::new(credentials("captcha@x.io", "secret")).unwrap();

        let err = driver.drive(base.join("/authorize").unwrap()).await.unwrap_err();
        assert!(matches!(err, FlowError::CaptchaRequired));
    }

    #[tokio::test]
    async fn test_captcha_and_two_factor_with_handler() {
        let base = spawn_server().await;

        for login in ["captcha@x.io", "2fa@x.io"] {
            let driver = ProtocolDriver::builder(credentials(login, "secret"))
                .challenges(Arc::new(Answers))
                .build()
                .unwrap();

            let response = driver.drive(base.join("/authorize").unwrap()).await.unwrap();
            assert_eq!(response.url, SUCCESS, "{login}");
        }
    }

    #[tokio::test]
    async fn test_two_factor_without_handler() {
        let base = spawn_server().await;
        let driver = ProtocolDriver::new(credentials("2fa@x.io", "secret")).unwrap();

        let err = driver.drive(base.join("/authorize").unwrap()).await.unwrap_err();
        assert!(matches!(err, FlowError::TwoFactorRequired));
    }

    #[tokio::test]
    async fn test_denied_redirect_becomes_authorization_failure() {
        let base = spawn_server().await;
        let driver = ProtocolDriver::new(credentials("user@x.io", "secret")).unwrap();

        let response = driver.drive(base.join("/deny").unwrap()).await.unwrap();
        let err = UserImplicitFlow::new(1, ScopeSpec::All)
            .parse_redirect(&response.url)
            .unwrap()
            .into_result()
            .unwrap_err();
        assert!(matches!(err, AuthError::AuthorizationFailed { ref description } if description == "User denied"));
    }

    #[tokio::test]
    async fn test_dead_ends() {
        let base = spawn_server().await;
        let driver = ProtocolDriver::builder(credentials("user@x.io", "secret"))
            .max_steps(4)
            .build()
            .unwrap();

        let err = driver.drive(base.join("/loop").unwrap()).await.unwrap_err();
        assert!(matches!(err, FlowError::TooManySteps { limit: 4 }));

        let err = driver.drive(base.join("/blocked").unwrap()).await.unwrap_err();
        assert!(matches!(err, FlowError::PageBlocked));

        let err = driver.drive(base.join("/empty").unwrap()).await.unwrap_err();
        assert!(matches!(err, FlowError::UnexpectedPage { .. }));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let driver = ProtocolDriver::new(credentials("user@x.io", "secret")).unwrap();
        let err = driver
            .drive(Url::parse("http://127.0.0.1:1/authorize").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Transport(_)));
    }
}
