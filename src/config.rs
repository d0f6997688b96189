use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::bot::{AmbiguousPolicy, ModerationFailurePolicy};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const CHANNEL_ID: &str = "FOXY_CHANNEL_ID";

const REQUIRED: [&str; 3] = [OPENAI_API_KEY, TELEGRAM_BOT_TOKEN, CHANNEL_ID];

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required variables are unset or empty.
    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("config validation error: {0}")]
    Validation(String),
    #[error("failed to write '{}': {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
}

pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub telegram_bot_token: String,
    /// Chats the bot listens and replies in.
    pub channel_ids: HashSet<i64>,
    pub bot_name: String,
    /// Replaces the default persona prompt.
    pub persona: Option<String>,
    pub decision_model: String,
    pub reply_model: String,
    pub caption_endpoint: Option<String>,
    pub caption_token: Option<String>,
    pub on_ambiguous: AmbiguousPolicy,
    pub on_moderation_error: ModerationFailurePolicy,
    pub dry_run: bool,
    /// Directory for logs.
    pub data_dir: PathBuf,
}

impl Config {
    /// Build from the process environment. Call [`load_env_file`] first to merge `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<&'static str> = REQUIRED.into_iter().filter(|k| get(*k).is_none()).collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let openai_api_key = get(OPENAI_API_KEY).unwrap_or_default();
        let telegram_bot_token = get(TELEGRAM_BOT_TOKEN).unwrap_or_default();
        let raw_channels = get(CHANNEL_ID).unwrap_or_default();

        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(format!(
                "{TELEGRAM_BOT_TOKEN} appears invalid (expected format: 123456789:ABCdefGHI...)"
            )));
        }

        let channel_ids = raw_channels
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| ConfigError::Validation(format!("{CHANNEL_ID} contains invalid chat id '{s}'")))
            })
            .collect::<Result<HashSet<_>, _>>()?;
        if channel_ids.is_empty() {
            return Err(ConfigError::Validation(format!("{CHANNEL_ID} must contain at least one chat id")));
        }

        let on_ambiguous = match get("FOXY_ON_AMBIGUOUS") {
            Some(v) => v.parse().map_err(ConfigError::Validation)?,
            None => AmbiguousPolicy::default(),
        };
        let on_moderation_error = match get("FOXY_ON_MODERATION_ERROR") {
            Some(v) => v.parse().map_err(ConfigError::Validation)?,
            None => ModerationFailurePolicy::default(),
        };

        let dry_run = get("FOXY_DRY_RUN")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL"),
            telegram_bot_token,
            channel_ids,
            bot_name: get("FOXY_BOT_NAME").unwrap_or_else(|| "Foxy".to_string()),
            persona: get("FOXY_PERSONA"),
            decision_model: get("FOXY_DECISION_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            reply_model: get("FOXY_REPLY_MODEL").unwrap_or_else(|| "gpt-4".to_string()),
            caption_endpoint: get("FOXY_CAPTION_ENDPOINT"),
            caption_token: get("FOXY_CAPTION_TOKEN"),
            on_ambiguous,
            on_moderation_error,
            dry_run,
            data_dir: get("FOXY_DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

const ENV_TEMPLATE: &str = r#"# Foxy configuration. Fill in the required values and start the bot again.

# Required
OPENAI_API_KEY=
TELEGRAM_BOT_TOKEN=
# Chat id of the group to talk in (comma-separate several)
FOXY_CHANNEL_ID=

# Optional
# FOXY_BOT_NAME=Foxy
# FOXY_PERSONA=
# FOXY_DECISION_MODEL=gpt-3.5-turbo
# FOXY_REPLY_MODEL=gpt-4
# OPENAI_BASE_URL=https://api.openai.com/v1
# FOXY_CAPTION_ENDPOINT=
# FOXY_CAPTION_TOKEN=
# FOXY_ON_AMBIGUOUS=silent
# FOXY_ON_MODERATION_ERROR=drop
# FOXY_DRY_RUN=false
# FOXY_DATA_DIR=.
"#;

/// Merge the nearest `.env` (searched upward from the working directory) into the
/// process environment. Returns the file that was read, if any.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Where the template belongs: the `.env` that was loaded, else `./.env`.
pub fn template_path(loaded: Option<&Path>) -> PathBuf {
    loaded.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".env"))
}

/// Write the `.env` template unless a file already exists. Returns whether it wrote.
pub fn write_template(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(path, ENV_TEMPLATE).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}
