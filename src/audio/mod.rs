pub mod backend;
pub mod energy;
pub mod file;

pub use backend::{
    AnalysisNode, AudioBackend, AudioBackendConfig, AudioChunk, CaptureStream, SharedAnalyser,
};
pub use energy::{rms_energy, EnergyMonitor};
pub use file::{AudioFile, FileBackend};
