//! FFmpeg argument builder.

use std::path::{Path, PathBuf};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    /// Arguments placed after `-i <input>`
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "info".to_string(),
        }
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Scale to a fixed height. Width follows the source aspect ratio, rounded to
    /// an even number so common encoders accept it.
    pub fn scale_to_height(self, height_px: u32) -> Self {
        self.video_filter(format!("scale=-2:{}", height_px))
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("raw/clip1.mp4", "processed/processed-clip1.mp4")
            .scale_to_height(360);

        let args = cmd.build_args();
        assert_eq!(
            args,
            vec![
                "-y",
                "-hide_banner",
                "-v",
                "info",
                "-i",
                "raw/clip1.mp4",
                "-vf",
                "scale=-2:360",
                "processed/processed-clip1.mp4",
            ]
        );
    }

    #[test]
    fn test_output_path_is_last() {
        let args = FfmpegCommand::new("in.mov", "out.mov")
            .overwrite(false)
            .log_level("error")
            .build_args();

        assert!(!args.contains(&"-y".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out.mov"));
        let v = args.iter().position(|a| a == "-v").unwrap();
        assert_eq!(args[v + 1], "error");
    }
}
