use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Run mode. Dev mode permits clearing a stale running file on startup so
/// local restarts don't require manual cleanup.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Prod,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Dev => write!(f, "dev"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub reddit: RedditConfig,
    pub email: EmailConfig,
    pub bot: BotConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedditConfig {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub server: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Account that receives escalation PMs and is named in the reply footer.
    pub operator_user: String,
    pub operator_email: String,
    pub random_org_api_key: String,
    #[serde(default = "default_running_file")]
    pub running_file: PathBuf,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_running_file() -> PathBuf {
    PathBuf::from("randombot.running")
}

fn default_poll_interval_secs() -> u64 {
    300
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [reddit]
        username = "randomnumberbot"
        password = "hunter2"
        client_id = "abc"
        client_secret = "def"

        [email]
        server = "smtp.example.com"
        username = "bot@example.com"
        password = "hunter2"

        [bot]
        environment = "dev"
        operator_user = "BoyAndHisBlob"
        operator_email = "operator@example.com"
        random_org_api_key = "00000000-0000-0000-0000-000000000000"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.reddit.username, "randomnumberbot");
        assert_eq!(config.email.server, "smtp.example.com");
        assert_eq!(config.bot.environment, Environment::Dev);
        assert_eq!(config.bot.operator_user, "BoyAndHisBlob");
    }

    #[test]
    fn test_defaults_applied() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.bot.running_file, PathBuf::from("randombot.running"));
        assert_eq!(config.bot.poll_interval_secs, 300);
    }

    #[test]
    fn test_environment_defaults_to_prod() {
        let sample = SAMPLE.replace("environment = \"dev\"", "");
        let config: Config = toml::from_str(&sample).unwrap();
        assert_eq!(config.bot.environment, Environment::Prod);
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Dev.to_string(), "dev");
        assert_eq!(Environment::Prod.to_string(), "prod");
    }
}
