//! Backend session record and its display name

use serde::{Deserialize, Serialize};

/// The backend session a canvas files its work under.
///
/// Created on the first prompt submission and kept for the canvas lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub created_prompt: String,
}

/// Display name derived from the prompt that opened the session
pub fn session_name(prompt: &str) -> String {
    const MAX_CHARS: usize = 48;
    let prompt = prompt.trim();
    if prompt.chars().count() <= MAX_CHARS {
        return prompt.to_string();
    }
    let mut name: String = prompt.chars().take(MAX_CHARS).collect();
    name.push('…');
    name
}
