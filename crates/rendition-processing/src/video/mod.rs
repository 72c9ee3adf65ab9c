//! Video processing module

pub mod command;
pub mod orchestration;
pub mod transcoder;

pub use command::FfmpegCommand;
pub use orchestration::{OrchestratorConfig, PipelineOrchestrator};
pub use transcoder::{
    DiagnosticSink, FfmpegTranscoder, TracingDiagnostics, TranscodeError, TranscodeOptions,
    Transcoder,
};
