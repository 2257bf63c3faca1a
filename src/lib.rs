pub mod audio;
pub mod client;
pub mod config;
pub mod conversation;
pub mod engines;
pub mod http;
pub mod recording;
pub mod turn;

pub use audio::{
    rms_energy, AnalysisNode, AudioBackend, AudioBackendConfig, AudioChunk, AudioFile,
    CaptureStream, EnergyMonitor, FileBackend, SharedAnalyser,
};
pub use client::{ClientError, HttpTurnClient, TurnTransport, TutorSession};
pub use config::Config;
pub use conversation::{catalog, find_scenario, Conversation, Message, RoleplayScenario, Sender};
pub use http::{create_router, AppState, UploadFormat};
pub use recording::{RecordingConfig, RecordingController, RecordingError, RecordingState};
pub use turn::{
    LanguageCode, RoleplayContext, TurnConfig, TurnError, TurnOrchestrator, TurnRequest,
    TurnResult, Utterance,
};
