use async_trait::async_trait;
use browser_automator::ChallengeHandler;
use oauth::FlowError;
use std::io::{BufRead, Write};
use url::Url;

/// Asks the user on the terminal for captcha and two-factor answers
pub struct TerminalChallenges;

impl TerminalChallenges {
    async fn ask(question: String) -> Result<String, FlowError> {
        tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            write!(stderr, "{question}: ")?;
            stderr.flush()?;

            let mut answer = String::new();
            std::io::stdin().lock().read_line(&mut answer)?;
            Ok::<_, std::io::Error>(answer.trim().to_string())
        })
        .await
        .map_err(|e| FlowError::Challenge(e.to_string()))?
        .map_err(|e| FlowError::Challenge(e.to_string()))
    }
}

#[async_trait]
impl ChallengeHandler for TerminalChallenges {
    async fn captcha(&self, _sid: &str, image: &Url) -> Result<String, FlowError> {
        Self::ask(format!("Captcha ({image})")).await
    }

    async fn two_factor_code(&self) -> Result<String, FlowError> {
        Self::ask("Two-factor code".to_string()).await
    }
}
