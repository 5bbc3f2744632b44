use super::{Error, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Turns a received pack into loose objects under `<git_dir>/objects`.
pub trait Unpack {
    fn unpack(&self, pack: &[u8], git_dir: &Path) -> Result<()>;
}

/// Delegates to `git unpack-objects`, feeding the pack on stdin.
#[derive(Debug, Clone)]
pub struct UnpackObjects {
    program: String,
}

impl Default for UnpackObjects {
    fn default() -> Self {
        Self::new("git")
    }
}

impl UnpackObjects {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Unpack for UnpackObjects {
    fn unpack(&self, pack: &[u8], git_dir: &Path) -> Result<()> {
        debug!(
            program = %self.program,
            git_dir = %git_dir.display(),
            bytes = pack.len(),
            "unpacking"
        );

        let mut child = Command::new(&self.program)
            .args(["unpack-objects", "-q"])
            .env("GIT_DIR", git_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| Error::UnpackFailed(format!("cannot run {}. {err}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::UnpackFailed("child stdin unavailable".into()))?;

        // stderr is drained by wait_with_output while stdin is still being fed
        let output = thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(pack));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            output.map(|output| (output, written))
        });
        let (output, written) = output?;

        if !output.status.success() {
            return Err(Error::UnpackFailed(format!(
                "{} ({})",
                String::from_utf8_lossy(&output.stderr).trim_end(),
                output.status
            )));
        }
        written.map_err(|err| Error::UnpackFailed(format!("writing pack to stdin. {err}")))
    }
}
