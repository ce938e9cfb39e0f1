//! # Gemini Wire Primitives
//!
//! The building blocks shared by requests and responses: a `Content` is a list
//! of `Part`s spoken by a `Role`. Only text parts are produced by this crate;
//! any other part kind the service sends back is kept as raw JSON and ignored
//! when extracting answer text.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user
    User,
    /// Message from the model
    Model,
}

/// Content part that can be included in a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content
    Text {
        /// The text content
        text: String,
        /// Whether this is a thought summary (Gemini 2.5 series only)
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
        /// The thought signature for the text (Gemini 2.5 series only)
        #[serde(rename = "thoughtSignature", skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    /// Any part kind this crate does not model (function calls, inline data, ...)
    Other(serde_json::Value),
}

impl Part {
    /// The answer text carried by this part, if any.
    ///
    /// Thought summaries are not part of the answer and yield `None`.
    pub fn answer_text(&self) -> Option<&str> {
        match self {
            Part::Text {
                thought: Some(true),
                ..
            } => None,
            Part::Text { text, .. } => Some(text),
            Part::Other(_) => None,
        }
    }
}

/// Content of a message
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Parts of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    /// Role of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Content {
    /// Create a new text content
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: Some(vec![Part::Text {
                text: text.into(),
                thought: None,
                thought_signature: None,
            }]),
            role: None,
        }
    }

    /// Create a user turn holding a single text part
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(text).with_role(Role::User)
    }

    /// Add a role to this content
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}
