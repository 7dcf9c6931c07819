use crate::errors::HabitError;
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer credential obtained at login. Held in memory only.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, HabitError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HabitError> {
        let mut config = Self::default();

        if let Some(url) = lookup("HABIT_API_URL") {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(HabitError::Config(format!(
                    "HABIT_API_URL must be an http(s) url, got `{url}`"
                )));
            }
            config.base_url = url.trim_end_matches('/').to_string();
        }

        config.token = lookup("HABIT_API_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        if let Some(secs) = lookup("HABIT_API_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                HabitError::Config(format!("HABIT_API_TIMEOUT_SECS must be a number, got `{secs}`"))
            })?;
            config.timeout = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
