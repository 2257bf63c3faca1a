use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// A single entry in the chat log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Strictly increasing within a session, never reused
    pub id: u64,

    pub text: String,

    pub sender: Sender,

    /// Set on the opening line of a roleplay scenario
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_roleplay_prompt: bool,

    pub created_at: DateTime<Utc>,
}
