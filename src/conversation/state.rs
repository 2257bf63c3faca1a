use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use super::message::{Message, Sender};
use super::scenario::{find_scenario, RoleplayScenario};
use crate::turn::{RoleplayContext, TurnResult};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("unknown roleplay scenario: {0}")]
    UnknownScenario(String),
}

/// Chat log plus roleplay mode for one learner session
///
/// The log is append-only between mode changes and cleared wholesale when
/// roleplay is entered, exited, or a scenario is chosen.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    roleplay_enabled: bool,
    active_scenario: Option<&'static RoleplayScenario>,
    catalog_visible: bool,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_roleplay_enabled(&self) -> bool {
        self.roleplay_enabled
    }

    pub fn active_scenario(&self) -> Option<&'static RoleplayScenario> {
        self.active_scenario
    }

    /// Whether the scenario picker should be shown
    pub fn catalog_visible(&self) -> bool {
        self.catalog_visible
    }

    /// Persona for the next turn; `None` means the generic tutor
    pub fn roleplay_context(&self) -> Option<RoleplayContext> {
        if !self.roleplay_enabled {
            return None;
        }
        self.active_scenario.map(RoleplayScenario::roleplay_context)
    }

    /// Switch to roleplay: clear the log and show the catalog
    pub fn enter_roleplay(&mut self) {
        info!("Entering roleplay mode");
        self.messages.clear();
        self.roleplay_enabled = true;
        self.active_scenario = None;
        self.catalog_visible = true;
    }

    /// Start a scenario: the log restarts with the scenario's opening line
    pub fn select_scenario(&mut self, id: &str) -> Result<&Message, ConversationError> {
        let scenario =
            find_scenario(id).ok_or_else(|| ConversationError::UnknownScenario(id.to_string()))?;

        info!("Starting roleplay scenario: {}", scenario.id);

        self.messages.clear();
        self.roleplay_enabled = true;
        self.active_scenario = Some(scenario);
        self.catalog_visible = false;

        Ok(self.push(scenario.initial_message.to_string(), Sender::Ai, true))
    }

    /// Back to generic tutoring with an empty log
    pub fn exit_roleplay(&mut self) {
        info!("Exiting roleplay mode");
        self.messages.clear();
        self.roleplay_enabled = false;
        self.active_scenario = None;
        self.catalog_visible = false;
    }

    /// Enter roleplay when off, exit when on
    pub fn toggle_roleplay(&mut self) {
        if self.roleplay_enabled {
            self.exit_roleplay();
        } else {
            self.enter_roleplay();
        }
    }

    /// Append the learner's line and the tutor's reply, in that order
    pub fn record_turn(&mut self, turn: &TurnResult) -> (&Message, &Message) {
        self.record_exchange(&turn.transcript, &turn.reply_text)
    }

    pub fn record_exchange(&mut self, transcript: &str, reply: &str) -> (&Message, &Message) {
        self.push(transcript.to_string(), Sender::User, false);
        self.push(reply.to_string(), Sender::Ai, false);

        debug!("Conversation now has {} messages", self.messages.len());

        let len = self.messages.len();
        (&self.messages[len - 2], &self.messages[len - 1])
    }

    fn push(&mut self, text: String, sender: Sender, is_roleplay_prompt: bool) -> &Message {
        self.next_id += 1;
        self.messages.push(Message {
            id: self.next_id,
            text,
            sender,
            is_roleplay_prompt,
            created_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }
}
