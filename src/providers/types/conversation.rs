use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Customer,
    Agent,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Customer => "customer",
            Speaker::Agent => "agent",
        }
    }

    /// Capitalized name used when rendering the transcript.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Customer => "Customer",
            Speaker::Agent => "Agent",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ConversationTurn {
    pub fn new(speaker: Speaker, text: &str) -> Self {
        Self {
            speaker,
            text: text.to_string(),
        }
    }

    pub fn customer(text: &str) -> Self {
        Self::new(Speaker::Customer, text)
    }

    pub fn agent(text: &str) -> Self {
        Self::new(Speaker::Agent, text)
    }
}

/// The transcript of the current session, oldest turn first.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    turns: Vec<ConversationTurn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn unless `text` is blank. Returns whether a turn was added.
    pub fn add_message(&mut self, speaker: Speaker, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.turns.push(ConversationTurn::new(speaker, text));
        true
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// Static context sent alongside every transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMeta {
    pub customer_name: String,
    pub zip_code: String,
    pub utility_company: String,
    pub available_providers: Vec<String>,
    pub agent_name: String,
}
