//! Client-side recording session
//!
//! `RecordingController` drives `Idle -> Recording -> Finalizing -> Idle`:
//! - `start` acquires the capture device and begins per-frame energy sampling
//! - silence lasting `silence_duration` (or an explicit `stop`) ends recording
//! - the buffered chunks become one `Utterance`, unless nothing was captured
//! - `finish_turn` returns to `Idle` once the utterance's turn has resolved

mod controller;
mod silence;

pub use controller::{
    RecordingConfig, RecordingController, RecordingError, RecordingState, StopReason,
};
pub use silence::{SilenceAction, SilencePolicy, SILENCE_DURATION, SILENCE_THRESHOLD};
