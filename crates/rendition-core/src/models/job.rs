use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use uuid::Uuid;

/// Identifier of a raw object in the remote raw namespace.
///
/// Always non-empty. Ids are also used as local file name components, so path
/// separators, `..` and control characters are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSourceId {
    #[error("source id must not be empty")]
    Empty,
    #[error("source id contains a path separator or '..': {0}")]
    PathLike(String),
    #[error("source id contains control characters")]
    ControlCharacters,
}

impl SourceId {
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidSourceId> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(InvalidSourceId::Empty);
        }
        if value.contains('/') || value.contains('\\') || value.contains("..") {
            return Err(InvalidSourceId::PathLike(value));
        }
        if value.chars().any(char::is_control) {
            return Err(InvalidSourceId::ControlCharacters);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SourceId {
    type Error = InvalidSourceId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SourceId::parse(value)
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Name under which the rendition of `source_id` is published.
///
/// Pure: the same source id always yields the same derived id, regardless of
/// which job computes it.
pub fn derive_id(prefix: &str, source_id: &SourceId) -> String {
    format!("{}{}", prefix, source_id.as_str())
}

/// Per-job token used to keep local staging paths of concurrent jobs apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Received,
    Downloading,
    Transforming,
    Publishing,
    CleaningUp,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether `next` is a legal successor. States only move forward; `Failed`
    /// is reachable from any state that precedes cleanup.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Received, Downloading)
                | (Downloading, Transforming)
                | (Transforming, Publishing)
                | (Publishing, CleaningUp)
                | (CleaningUp, Completed)
                | (Received | Downloading | Transforming | Publishing, Failed)
        )
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobState::Received => write!(f, "received"),
            JobState::Downloading => write!(f, "downloading"),
            JobState::Transforming => write!(f, "transforming"),
            JobState::Publishing => write!(f, "publishing"),
            JobState::CleaningUp => write!(f, "cleaning_up"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal job state transition: {from} -> {to}")]
pub struct StateTransitionError {
    pub from: JobState,
    pub to: JobState,
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Download,
    Convert,
    Upload,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Stage::Download => write!(f, "download"),
            Stage::Convert => write!(f, "convert"),
            Stage::Upload => write!(f, "upload"),
        }
    }
}

/// Terminal result of one pipeline run, reported once per job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    Success {
        derived_id: String,
        public_url: String,
    },
    Failure {
        stage: Stage,
        cause: String,
    },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success { .. })
    }
}

/// One end-to-end execution of the pipeline for a single source object.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub source_id: SourceId,
    pub derived_id: String,
    pub local_raw_path: PathBuf,
    pub local_processed_path: PathBuf,
    state: JobState,
    history: Vec<(JobState, DateTime<Utc>)>,
}

impl Job {
    pub fn new(
        id: JobId,
        source_id: SourceId,
        derived_id: String,
        local_raw_path: PathBuf,
        local_processed_path: PathBuf,
    ) -> Self {
        Self {
            id,
            source_id,
            derived_id,
            local_raw_path,
            local_processed_path,
            state: JobState::Received,
            history: vec![(JobState::Received, Utc::now())],
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// States entered so far, oldest first.
    pub fn history(&self) -> &[(JobState, DateTime<Utc>)] {
        &self.history
    }

    pub fn advance(&mut self, next: JobState) -> Result<(), StateTransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(StateTransitionError {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!(
            job_id = %self.id,
            source_id = %self.source_id,
            from = %self.state,
            to = %next,
            "Job state transition"
        );

        self.state = next;
        self.history.push((next, Utc::now()));
        Ok(())
    }
}
