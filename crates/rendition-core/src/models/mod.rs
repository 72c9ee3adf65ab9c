//! Domain models

pub mod job;

pub use job::{
    derive_id, InvalidSourceId, Job, JobId, JobOutcome, JobState, SourceId, Stage,
    StateTransitionError,
};
