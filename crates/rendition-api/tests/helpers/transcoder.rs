use async_trait::async_trait;
use rendition_processing::{DiagnosticSink, TranscodeError, TranscodeOptions, Transcoder};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Stands in for FFmpeg. Inputs whose bytes start with `corrupt` fail after writing
/// a partial output file.
#[derive(Default)]
pub struct FakeTranscoder {
    calls: AtomicUsize,
}

impl FakeTranscoder {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        options: &TranscodeOptions,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<(), TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = tokio::fs::read(input).await?;
        diagnostics.emit("frame=1");

        if bytes.starts_with(b"corrupt") {
            tokio::fs::write(output, b"partial").await?;
            return Err(TranscodeError::Failed {
                status: "exit status: 1".to_string(),
                stderr_tail: "Invalid data found when processing input".to_string(),
            });
        }

        let mut rendition = format!("{}p:", options.target_height_px).into_bytes();
        rendition.extend(bytes);
        tokio::fs::write(output, rendition).await?;
        Ok(())
    }
}
