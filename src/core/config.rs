use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use crate::core::errors::{AppError, AppResult};

pub const ENV_PREFIX: &str = "PLANSCOPE";

/// Oracle output is parsed at most this many times per chunk.
pub const MAX_PARSE_ATTEMPTS: usize = 3;

/// Process-wide limits, read once at startup and passed down explicitly.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub max_pdf_mb: u64,
    pub max_pages: usize,
    pub parser_workers: usize,
    pub max_chunk_chars: usize,
    /// Lets a free-tier caller without a user id through the sign-in check.
    pub allow_anonymous: bool,
    pub openai_model: String,
    pub openai_base_url: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_pdf_mb: 40,
            max_pages: 400,
            parser_workers: 4,
            max_chunk_chars: 6000,
            allow_anonymous: false,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.2,
            request_timeout_secs: 60,
        }
    }
}

impl Settings {
    pub fn from_env() -> AppResult<Self> {
        let settings: Settings = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> AppResult<()> {
        let limits = [
            ("max_pdf_mb", self.max_pdf_mb as usize),
            ("max_pages", self.max_pages),
            ("parser_workers", self.parser_workers),
            ("max_chunk_chars", self.max_chunk_chars),
            ("request_timeout_secs", self.request_timeout_secs as usize),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(AppError::Config(format!("{name} must be at least 1")));
            }
        }
        if self.openai_model.trim().is_empty() {
            return Err(AppError::Config("openai_model cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn max_pdf_bytes(&self) -> u64 {
        self.max_pdf_mb * 1024 * 1024
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
