//! Media transform step.
//!
//! The orchestrator depends only on the [`Transcoder`] trait. [`FfmpegTranscoder`] is the
//! production implementation: it runs one FFmpeg child per call, forwards every stderr
//! line to a [`DiagnosticSink`] while the child runs, and kills the child if the call is
//! dropped or the configured timeout elapses.

use crate::video::command::FfmpegCommand;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Number of stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOptions {
    pub target_height_px: u32,
}

impl TranscodeOptions {
    pub fn new(target_height_px: u32) -> Self {
        Self { target_height_px }
    }
}

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Input file does not exist: {0}")]
    MissingInput(PathBuf),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("FFmpeg exited with {status}: {stderr_tail}")]
    Failed {
        status: String,
        stderr_tail: String,
    },

    #[error("FFmpeg timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives encoder diagnostic lines as they are produced.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Forwards diagnostics to tracing under the `rendition::ffmpeg` target.
#[derive(Debug, Clone, Default)]
pub struct TracingDiagnostics {
    job_id: Option<String>,
}

impl TracingDiagnostics {
    pub fn for_job(job_id: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
        }
    }
}

impl DiagnosticSink for TracingDiagnostics {
    fn emit(&self, line: &str) {
        match &self.job_id {
            Some(job_id) => tracing::debug!(target: "rendition::ffmpeg", job_id = %job_id, "{}", line),
            None => tracing::debug!(target: "rendition::ffmpeg", "{}", line),
        }
    }
}

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Produce a rendition of `input` at `output`.
    ///
    /// On error `output` may exist and hold partial data; the caller owns its removal.
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        options: &TranscodeOptions,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<(), TranscodeError>;
}

/// Runs the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    timeout: Option<Duration>,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn wait(
        &self,
        child: &mut tokio::process::Child,
    ) -> Result<ExitStatus, TranscodeError> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait().await?);
        };

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "FFmpeg timed out, killing process"
                );
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill FFmpeg process");
                }
                Err(TranscodeError::Timeout(timeout))
            }
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        options: &TranscodeOptions,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<(), TranscodeError> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(TranscodeError::MissingInput(input.to_path_buf()));
        }

        let args = FfmpegCommand::new(input, output)
            .scale_to_height(options.target_height_px)
            .build_args();
        tracing::debug!("Running FFmpeg: {} {}", self.ffmpeg_path, args.join(" "));

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranscodeError::Spawn {
                program: self.ffmpeg_path.clone(),
                source,
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("FFmpeg stderr was not captured"))?;

        // The pipe is read to EOF whatever it carries; closing it early would kill the
        // child with SIGPIPE on its next write.
        let reader = tokio::spawn(async move {
            let mut stderr = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            loop {
                buf.clear();
                match stderr.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        let line = line.trim_end_matches(['\n', '\r']);
                        diagnostics.emit(line);
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line.to_string());
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read FFmpeg stderr, discarding the rest");
                        if let Err(e) = tokio::io::copy(&mut stderr, &mut tokio::io::sink()).await {
                            tracing::warn!(error = %e, "Failed to drain FFmpeg stderr");
                        }
                        break;
                    }
                }
            }
            tail
        });

        let status = match self.wait(&mut child).await {
            Ok(status) => status,
            Err(e) => {
                reader.abort();
                return Err(e);
            }
        };

        let tail = reader.await.unwrap_or_default();

        if status.success() {
            tracing::info!(
                input = %input.display(),
                output = %output.display(),
                target_height_px = options.target_height_px,
                "FFmpeg transform finished"
            );
            Ok(())
        } else {
            Err(TranscodeError::Failed {
                status: status.to_string(),
                stderr_tail: tail.into_iter().collect::<Vec<_>>().join("\n"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct CollectingSink {
        lines: Mutex<Vec<String>>,
    }

    impl DiagnosticSink for CollectingSink {
        fn emit(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    #[tokio::test]
    async fn test_missing_input_is_rejected_before_spawn() {
        let dir = tempdir().unwrap();
        let transcoder = FfmpegTranscoder::new("ffmpeg-binary-that-does-not-exist");

        let result = transcoder
            .transcode(
                &dir.path().join("missing.mp4"),
                &dir.path().join("out.mp4"),
                &TranscodeOptions::new(360),
                Arc::new(CollectingSink::default()),
            )
            .await;

        assert!(matches!(result, Err(TranscodeError::MissingInput(_))));
    }

    #[tokio::test]
    async fn test_unknown_binary_is_spawn_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"not really a video").unwrap();

        let transcoder = FfmpegTranscoder::new("ffmpeg-binary-that-does-not-exist");
        let result = transcoder
            .transcode(
                &input,
                &dir.path().join("out.mp4"),
                &TranscodeOptions::new(360),
                Arc::new(CollectingSink::default()),
            )
            .await;

        match result {
            Err(TranscodeError::Spawn { program, .. }) => {
                assert_eq!(program, "ffmpeg-binary-that-does-not-exist")
            }
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-ffmpeg.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_diagnostics_do_not_fail_transform() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"raw").unwrap();
        let ffmpeg = fake_ffmpeg(
            dir.path(),
            r#"printf 'title=\377\376\n' >&2
i=0
while [ $i -lt 5000 ]; do
  echo "frame=$i" >&2
  i=$((i + 1))
done
exit 0"#,
        );

        let sink = Arc::new(CollectingSink::default());
        let result = FfmpegTranscoder::new(ffmpeg.to_string_lossy())
            .transcode(
                &input,
                &dir.path().join("out.mp4"),
                &TranscodeOptions::new(360),
                sink.clone(),
            )
            .await;

        assert!(result.is_ok(), "transform failed: {:?}", result);
        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 5001);
        assert!(lines[0].starts_with("title="));
        assert!(lines[0].contains('\u{FFFD}'));
        assert_eq!(lines[5000], "frame=4999");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_keeps_stderr_tail() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"raw").unwrap();
        let ffmpeg = fake_ffmpeg(
            dir.path(),
            "echo 'in.mp4: Invalid data found when processing input' >&2\nexit 1",
        );

        let result = FfmpegTranscoder::new(ffmpeg.to_string_lossy())
            .transcode(
                &input,
                &dir.path().join("out.mp4"),
                &TranscodeOptions::new(360),
                Arc::new(CollectingSink::default()),
            )
            .await;

        match result {
            Err(TranscodeError::Failed { stderr_tail, .. }) => {
                assert!(stderr_tail.contains("Invalid data found"))
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_tracing_sink_accepts_lines() {
        let sink = TracingDiagnostics::for_job("job-1");
        sink.emit("frame=    1 fps=0.0 q=0.0 size=       0kB");
        TracingDiagnostics::default().emit("no job context");
    }
}
