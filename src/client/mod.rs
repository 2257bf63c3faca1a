//! Learner-side voice session
//!
//! Couples the recorder with the conversation log and delivers each
//! finished utterance to a turn transport, either the HTTP API
//! (`HttpTurnClient`) or an in-process `TurnOrchestrator`.

mod session;
mod transport;

pub use session::TutorSession;
pub use transport::{ClientError, HttpTurnClient, TurnTransport};
