use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "vk-auth", version, about = "Obtain VK access tokens without a browser")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the implicit grant flow and print the token as JSON
    Login(LoginArgs),

    /// Resolve a scope specification into its bitmask
    Scope {
        /// "all", a number, or comma separated permission names
        spec: String,

        /// Resolve against community permissions
        #[arg(long)]
        groups: bool,
    },

    /// List known permissions and their bits
    Permissions {
        #[arg(long)]
        groups: bool,
    },

    /// Check a user token by fetching its owner's profile
    Verify {
        #[arg(long, env = "VK_TOKEN")]
        token: String,

        #[arg(long)]
        api_url: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Config file (defaults to the platform config path)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "VK_APP_ID")]
    pub app_id: Option<u64>,

    #[arg(long, env = "VK_LOGIN")]
    pub login: Option<String>,

    #[arg(long, env = "VK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// "all", a number, or comma separated permission names
    #[arg(long, env = "VK_SCOPE")]
    pub scope: Option<String>,

    /// Request community tokens for these group ids
    #[arg(long, value_delimiter = ',')]
    pub group_ids: Vec<u64>,

    /// Override the OAuth host
    #[arg(long)]
    pub oauth_url: Option<String>,

    /// Call users.get with the new token before printing it
    #[arg(long)]
    pub verify: bool,

    /// Prompt on the terminal for captcha and two-factor codes
    #[arg(long)]
    pub interactive: bool,
}
