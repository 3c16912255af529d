use crate::error::{IngestError, Result};
use crate::tools::spawn_error;
use log::debug;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Margin for the two-stage seek: a fast input seek to `t - margin`, then an
/// accurate decode of the remaining `margin`.
const SEEK_MARGIN: f64 = 2.0;

/// An ffmpeg/ffprobe invocation working on one source file.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    program: PathBuf,
    source: PathBuf,
    args: Vec<OsString>,
}

impl FfmpegCommand {
    /// An ffmpeg command with the quiet, non-interactive prelude.
    #[must_use]
    pub fn ffmpeg(program: &Path, source: &Path) -> Self {
        Self::bare(program, source).args(["-hide_banner", "-nostdin", "-loglevel", "error"])
    }

    /// A command with no prelude, e.g. for ffprobe.
    #[must_use]
    pub fn bare(program: &Path, source: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            source: source.to_path_buf(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Adds `-i <source>`.
    #[must_use]
    pub fn input(self) -> Self {
        let source = self.source.clone();
        self.arg("-i").arg(source)
    }

    /// Adds the input with a two-stage seek to `timestamp`.
    #[must_use]
    pub fn input_at(self, timestamp: f64) -> Self {
        let timestamp = timestamp.max(0.0);
        let coarse = (timestamp - SEEK_MARGIN).max(0.0);
        let fine = timestamp - coarse;

        let mut command = self;
        if coarse > 0.0 {
            command = command.arg("-ss").arg(format!("{coarse:.3}"));
        }
        command = command.input();
        if fine > 0.0 {
            command = command.arg("-ss").arg(format!("{fine:.3}"));
        }
        command
    }

    #[must_use]
    pub fn arg_list(&self) -> &[OsString] {
        &self.args
    }

    /// Runs to completion and returns the captured output. A non-zero exit is
    /// a media error for the source file.
    pub fn output(&self) -> Result<Output> {
        let tool = self
            .program
            .file_name()
            .map_or_else(|| "tool".into(), |n| n.to_string_lossy());
        debug!("{tool} {:?}", self.arg_list());

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| spawn_error(&self.program, &self.source, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::media(
                &self.source,
                format!("{tool} exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(output)
    }

    /// Runs, then checks that `expected` was produced.
    pub fn run_producing(&self, expected: &Path) -> Result<()> {
        self.output()?;
        if !expected.is_file() {
            return Err(IngestError::media(
                &self.source,
                format!("no output written to {}", expected.display()),
            ));
        }
        Ok(())
    }
}
