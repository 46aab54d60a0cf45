//! Environment-driven settings
//!
//! Everything the binary needs to reach the model deployment and the hosted
//! FAQ agent. A `.env` file in the working directory is loaded first when
//! present.

use crate::core::{DeskError, DeskResult};
use crate::desk::DEFAULT_MAX_TURNS;
use crate::threads::ConnectionString;

pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const OPENAI_API_KEY: &str = "MY_OPENAI_API_KEY";
pub const AZURE_OPENAI_DEPLOYMENT_NAME: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const AIPROJECT_CONNECTION_STRING: &str = "AIPROJECT_CONNECTION_STRING";
pub const AIPROJECT_ACCESS_TOKEN: &str = "AIPROJECT_ACCESS_TOKEN";
pub const FAQ_AGENT_ID: &str = "FAQ_AGENT_ID";
pub const DESK_MAX_TURNS: &str = "DESK_MAX_TURNS";

/// Resolved settings for one desk process
#[derive(Clone)]
pub struct DeskSettings {
    pub endpoint: String,
    pub api_version: String,
    pub api_key: String,
    pub deployment: String,
    pub connection: ConnectionString,
    pub access_token: String,
    pub faq_agent_id: String,
    pub max_turns: usize,
}

impl DeskSettings {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> DeskResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("[Config] Ignoring unreadable .env file: {}", e);
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source
    pub fn from_lookup<F>(lookup: F) -> DeskResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> DeskResult<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| DeskError::missing_var(name))
        };

        let connection = ConnectionString::parse(&required(AIPROJECT_CONNECTION_STRING)?)?;

        let max_turns = match lookup(DESK_MAX_TURNS) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(DeskError::InvalidConfig(format!(
                        "{} must be a positive integer, got {:?}",
                        DESK_MAX_TURNS, raw
                    )))
                }
            },
            None => DEFAULT_MAX_TURNS,
        };

        Ok(Self {
            endpoint: required(AZURE_OPENAI_ENDPOINT)?,
            api_version: required(AZURE_OPENAI_API_VERSION)?,
            api_key: required(OPENAI_API_KEY)?,
            deployment: required(AZURE_OPENAI_DEPLOYMENT_NAME)?,
            connection,
            access_token: required(AIPROJECT_ACCESS_TOKEN)?,
            faq_agent_id: required(FAQ_AGENT_ID)?,
            max_turns,
        })
    }
}

impl std::fmt::Debug for DeskSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeskSettings")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("connection", &self.connection)
            .field("access_token", &"<redacted>")
            .field("faq_agent_id", &self.faq_agent_id)
            .field("max_turns", &self.max_turns)
            .finish()
    }
}
