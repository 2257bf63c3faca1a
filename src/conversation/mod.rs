//! Conversation and roleplay state
//!
//! Owns the ordered chat log and the active roleplay scenario, and supplies
//! the roleplay context attached to each turn.

mod message;
mod scenario;
mod state;

pub use message::{Message, Sender};
pub use scenario::{catalog, find_scenario, RoleplayScenario};
pub use state::{Conversation, ConversationError};
