use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};

use super::credential::Credential;
use super::knowledge::KnowledgeBase;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_SESSIONS: usize = 1000;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: String,
    pub api_key: Credential,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub knowledge: KnowledgeBase,
    // API server only
    pub max_sessions: usize,
    pub session_idle: Duration,
}

impl AppConfig {
    /// Resolve the config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve the config using `lookup` to fetch each variable. An
    /// invalid credential is a startup error so a session never
    /// begins without one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_key = lookup("CAMPUS_API_KEY")
            .ok_or_else(|| anyhow!("Missing env var CAMPUS_API_KEY"))?;
        let api_key = Credential::parse(&raw_key)
            .context("CAMPUS_API_KEY is invalid, expected format sk-or-v1-...")?;

        let api_url = lookup("CAMPUS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let model = lookup("CAMPUS_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = match lookup("CAMPUS_TEMPERATURE") {
            Some(v) => v
                .trim()
                .parse::<f32>()
                .with_context(|| format!("Invalid CAMPUS_TEMPERATURE: {}", v))?,
            None => DEFAULT_TEMPERATURE,
        };
        validate_temperature(temperature)?;

        let max_tokens = match lookup("CAMPUS_MAX_TOKENS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid CAMPUS_MAX_TOKENS: {}", v))?,
            None => DEFAULT_MAX_TOKENS,
        };

        let timeout_secs = match lookup("CAMPUS_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid CAMPUS_TIMEOUT_SECS: {}", v))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("CAMPUS_TIMEOUT_SECS must be greater than 0");
        }

        let max_sessions = match lookup("CAMPUS_MAX_SESSIONS") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid CAMPUS_MAX_SESSIONS: {}", v))?,
            None => DEFAULT_MAX_SESSIONS,
        };
        if max_sessions == 0 {
            bail!("CAMPUS_MAX_SESSIONS must be greater than 0");
        }

        let session_idle_secs = match lookup("CAMPUS_SESSION_IDLE_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid CAMPUS_SESSION_IDLE_SECS: {}", v))?,
            None => DEFAULT_SESSION_IDLE_SECS,
        };

        let knowledge = match lookup("CAMPUS_KNOWLEDGE_PATH") {
            Some(path) => KnowledgeBase::from_file(path)?,
            None => KnowledgeBase::default(),
        };

        let referer =
            Some(lookup("CAMPUS_REFERER").unwrap_or_else(|| "https://amrita.edu".to_string()));
        let title =
            Some(lookup("CAMPUS_TITLE").unwrap_or_else(|| "Amrita College Chatbot".to_string()));

        tracing::debug!(
            "Config resolved: url={} model={} temperature={} key={}",
            api_url,
            model,
            temperature,
            api_key.redacted()
        );

        Ok(Self {
            api_url,
            api_key,
            model,
            temperature,
            max_tokens: Some(max_tokens),
            timeout: Duration::from_secs(timeout_secs),
            referer,
            title,
            knowledge,
            max_sessions,
            session_idle: Duration::from_secs(session_idle_secs),
        })
    }

    /// Apply per-session overrides for the model and temperature.
    pub fn with_overrides(mut self, model: Option<String>, temperature: Option<f32>) -> Result<Self> {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(temperature) = temperature {
            validate_temperature(temperature)?;
            self.temperature = temperature;
        }
        Ok(self)
    }
}

pub fn validate_temperature(temperature: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&temperature) {
        bail!("Temperature must be between 0.0 and 1.0, got {}", temperature);
    }
    Ok(())
}
