use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::{input, select, spinner};
use console::style;

use super::{Input, InputType, Prompt, Theme};
use crate::providers::types::conversation::{ConversationTurn, Speaker};

pub struct CliclackPrompt {
    spinner: cliclack::ProgressBar,
    speaker: Speaker,
    theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    AddMessage,
    Submit,
    ToggleTheme,
    Reset,
    Exit,
}

impl CliclackPrompt {
    pub fn new() -> Self {
        CliclackPrompt {
            spinner: spinner(),
            speaker: Speaker::Customer,
            theme: Theme::Dark,
        }
    }

    fn bat_theme(&self) -> &'static str {
        match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }

    fn read_message(&mut self) -> Result<Input> {
        let speaker = select("Who is speaking?")
            .item(Speaker::Customer, Speaker::Customer.as_str(), "")
            .item(Speaker::Agent, Speaker::Agent.as_str(), "")
            .initial_value(self.speaker)
            .interact()?;
        self.speaker = speaker;

        let message: String = input("Message")
            .placeholder("")
            .required(false)
            .interact()?;

        Ok(Input::message(speaker, &message))
    }
}

impl Default for CliclackPrompt {
    fn default() -> Self {
        Self::new()
    }
}

fn print_markdown(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()).name("Agent reply"))
        .theme(theme)
        .language("Markdown")
        .header(true)
        .grid(true)
        .wrapping_mode(WrappingMode::Character)
        .print();

    if let Err(e) = printed {
        tracing::warn!("Failed to render reply: {}", e);
        println!("{}", content);
    }
}

impl Prompt for CliclackPrompt {
    fn render_transcript(&mut self, turns: &[ConversationTurn]) {
        println!("\n{}", style("Conversation History").bold());
        if turns.is_empty() {
            println!("{}", style("(no messages yet)").dim());
        }
        for (idx, turn) in turns.iter().enumerate() {
            let header = format!("Message {} ({})", idx + 1, turn.speaker.label());
            if let Err(e) = cliclack::note(header, &turn.text) {
                tracing::warn!("Failed to render message {}: {}", idx + 1, e);
            }
        }
        println!();
        let _ = io::stdout().flush();
    }

    fn render_reply(&mut self, reply: &str) {
        print_markdown(reply, self.bat_theme());
        println!();
    }

    fn render_error(&mut self, error: &anyhow::Error) {
        if cliclack::log::error(format!("{:#}", error)).is_err() {
            eprintln!("Error: {:#}", error);
        }
    }

    fn render_notice(&mut self, notice: &str) {
        if cliclack::log::info(notice).is_err() {
            println!("{}", notice);
        }
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start("awaiting reply");
    }

    fn hide_busy(&mut self) {
        self.spinner.stop("");
    }

    fn get_input(&mut self) -> Result<Input> {
        let action = select("What next?")
            .item(Action::AddMessage, "Add Message", "append a turn to the transcript")
            .item(Action::Submit, "Submit", "send the transcript for an agent reply")
            .item(Action::ToggleTheme, "Toggle theme", "switch light/dark rendering")
            .item(Action::Reset, "Reset", "clear the transcript")
            .item(Action::Exit, "Exit", "")
            .interact()?;

        match action {
            Action::AddMessage => self.read_message(),
            Action::Submit => Ok(Input::command(InputType::Submit)),
            Action::ToggleTheme => {
                self.theme = match self.theme {
                    Theme::Light => {
                        println!("Switching to Dark theme");
                        Theme::Dark
                    }
                    Theme::Dark => {
                        println!("Switching to Light theme");
                        Theme::Light
                    }
                };
                Ok(Input::command(InputType::AskAgain))
            }
            Action::Reset => Ok(Input::command(InputType::Reset)),
            Action::Exit => Ok(Input::command(InputType::Exit)),
        }
    }

    fn intro(&self) {
        if cliclack::intro(style(" Chatbot Simulation ").on_cyan().black()).is_err() {
            println!("\nChatbot Simulation\n");
        }
    }

    fn close(&self) {
        let _ = cliclack::outro("Session closed");
    }

    #[cfg(test)]
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
