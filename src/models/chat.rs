use serde::{ Deserialize, Deserializer, Serialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Anything that is not `user` (the browser UI sends `bot`).
    #[serde(other)]
    Assistant,
}

impl Default for Role {
    fn default() -> Self {
        Role::Assistant
    }
}

/// Only the string `"user"` is a user turn; a missing, null or non-string
/// role renders as the bot.
fn deserialize_role<'de, D>(deserializer: D) -> Result<Role, D::Error>
    where D: Deserializer<'de>
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if s == "user" => Role::User,
        _ => Role::Assistant,
    })
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(default, deserialize_with = "deserialize_role")]
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub response: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}
