use anyhow::Result;

use crate::providers::types::conversation::{ConversationTurn, Speaker};

pub mod cliclack;

pub trait Prompt {
    fn render_transcript(&mut self, turns: &[ConversationTurn]);
    fn render_reply(&mut self, reply: &str);
    fn render_error(&mut self, error: &anyhow::Error);
    fn render_notice(&mut self, notice: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
    fn intro(&self) {
        println!("\nChatbot Simulation\n");
    }
    // Used for testing. Allows us to downcast to any type.
    #[cfg(test)]
    fn as_any(&self) -> &dyn std::any::Any;
}

pub struct Input {
    pub input_type: InputType,
    pub speaker: Option<Speaker>,
    pub content: Option<String>, // Only set for messages
}

impl Input {
    pub fn message(speaker: Speaker, content: &str) -> Self {
        Self {
            input_type: InputType::Message,
            speaker: Some(speaker),
            content: Some(content.to_string()),
        }
    }

    pub fn command(input_type: InputType) -> Self {
        Self {
            input_type,
            speaker: None,
            content: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    AskAgain, // Ask the operator for input again. Control flow command.
    Message,  // Append a turn to the transcript
    Submit,   // Send the transcript and append the agent reply
    Reset,    // Drop the transcript and start over
    Exit,     // Leave the session
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}
