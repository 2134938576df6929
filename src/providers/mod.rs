pub mod openai;

use serde::{Deserialize, Serialize};

use crate::core::errors::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// The text-extraction service behind the pipeline.
///
/// `complete` blocks the calling thread; callers dispatch it through
/// [`crate::core::pool::BlockingPool`]. The returned string is the raw model
/// output and carries no schema guarantee.
pub trait ExtractionOracle: Send + Sync {
    fn complete(&self, messages: &[ChatMessage]) -> AppResult<String>;

    fn name(&self) -> &str;
}
