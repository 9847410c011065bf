use anyhow::{Context, Result};
use tracing::{debug, info, info_span};

use crate::prompt::{Input, InputType, Prompt};
use crate::providers::base::Executor;
use crate::providers::types::conversation::{
    ConversationMeta, ConversationState, ConversationTurn, Speaker,
};
use crate::providers::types::objectid::create_object_id;
use crate::providers::utils::{build_sequence_payload, extract_answer, sequence_inputs};

/// Send the transcript to the chat sequence and return the agent's reply.
pub fn get_agent_response(
    executor: &dyn Executor,
    sequence_name: &str,
    turns: &[ConversationTurn],
    meta: &ConversationMeta,
) -> Result<String> {
    debug!(inputs = %sequence_inputs(turns, meta), "conversation sent to the sequence");
    let payload = build_sequence_payload(turns, meta).context("Failed to encode sequence inputs")?;

    let preds = executor.execute(sequence_name, &payload)?;
    let answer = extract_answer(&preds)?;
    info!(chars = answer.len(), "received agent reply");
    Ok(answer)
}

/// Owns the transcript for one operator session and drives the prompt.
pub struct Session<'a> {
    id: String,
    executor: Box<dyn Executor + 'a>,
    prompt: Box<dyn Prompt + 'a>,
    sequence_name: String,
    meta: ConversationMeta,
    state: ConversationState,
}

impl<'a> Session<'a> {
    pub fn new(
        executor: Box<dyn Executor + 'a>,
        prompt: Box<dyn Prompt + 'a>,
        sequence_name: String,
        meta: ConversationMeta,
    ) -> Self {
        Session {
            id: create_object_id("session"),
            executor,
            prompt,
            sequence_name,
            meta,
            state: ConversationState::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn add_message(&mut self, speaker: Speaker, text: &str) -> bool {
        let added = self.state.add_message(speaker, text);
        if !added {
            debug!("ignoring empty message");
        }
        added
    }

    /// Submit the whole transcript. The reply is appended as an agent turn.
    /// Returns `None` without calling the sequence when the transcript is empty.
    pub fn submit(&mut self) -> Result<Option<String>> {
        if self.state.is_empty() {
            return Ok(None);
        }

        let reply = get_agent_response(
            self.executor.as_ref(),
            &self.sequence_name,
            self.state.turns(),
            &self.meta,
        )?;
        self.state.add_message(Speaker::Agent, &reply);
        Ok(Some(reply))
    }

    pub fn reset(&mut self) {
        self.state.clear();
        self.id = create_object_id("session");
        info!(session = %self.id, "session reset");
    }

    pub fn start(&mut self) -> Result<()> {
        self.prompt.intro();
        self.prompt.render_transcript(self.state.turns());

        loop {
            let span = info_span!("session", id = %self.id);
            let _guard = span.enter();

            // Esc and Ctrl-C come back as an interrupted read.
            let input = match self.prompt.get_input() {
                Ok(input) => input,
                Err(e) if is_interrupted(&e) => Input::command(InputType::Exit),
                Err(e) => {
                    self.prompt.close();
                    return Err(e);
                }
            };
            match input.input_type {
                InputType::Message => {
                    if let (Some(speaker), Some(content)) = (input.speaker, &input.content) {
                        self.add_message(speaker, content);
                    }
                }
                InputType::Submit => self.process_submit(),
                InputType::Reset => self.reset(),
                InputType::AskAgain => continue,
                InputType::Exit => break,
            }

            self.prompt.render_transcript(self.state.turns());
        }

        self.prompt.close();
        Ok(())
    }

    /// Submit a prepared transcript once and render the reply.
    pub fn headless_start(&mut self, turns: Vec<ConversationTurn>) -> Result<()> {
        let span = info_span!("session", id = %self.id);
        let _guard = span.enter();

        for turn in turns {
            self.add_message(turn.speaker, &turn.text);
        }

        match self.submit()? {
            Some(reply) => self.prompt.render_reply(&reply),
            None => self.prompt.render_notice("Transcript is empty, nothing to submit."),
        }
        Ok(())
    }

    fn process_submit(&mut self) {
        if self.state.is_empty() {
            self.prompt
                .render_notice("Add at least one message before submitting.");
            return;
        }

        self.prompt.show_busy();
        let result = self.submit();
        self.prompt.hide_busy();

        match result {
            Ok(Some(reply)) => self.prompt.render_reply(&reply),
            Ok(None) => {}
            Err(e) => self.prompt.render_error(&e),
        }
    }
}

fn is_interrupted(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::Interrupted)
}
