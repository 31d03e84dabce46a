use crate::error::SummarizeError;
use crate::settings::SummarizerSettings;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Turns a prompt into summary text.
pub trait Summarizer {
    fn summarize(&self, prompt: &str, timeout: Duration) -> Result<String, SummarizeError>;
}

/// Runs an external command with the prompt on stdin and takes its stdout
/// as the summary.
#[derive(Debug, Clone)]
pub struct CommandSummarizer {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
    strip_env: Vec<String>,
}

impl CommandSummarizer {
    pub fn new(settings: &SummarizerSettings, cwd: impl Into<PathBuf>) -> Result<Self, SummarizeError> {
        let (program, args) = settings
            .command
            .split_first()
            .ok_or(SummarizeError::NoCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: cwd.into(),
            strip_env: settings.strip_env.clone(),
        })
    }

    fn spawn(&self) -> Result<Child, SummarizeError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for key in &self.strip_env {
            cmd.env_remove(key);
        }
        cmd.spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                SummarizeError::NotFound(self.program.clone())
            } else {
                SummarizeError::Spawn(e)
            }
        })
    }
}

/// Drain a pipe on a helper thread so the child never blocks on a full buffer.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

impl Summarizer for CommandSummarizer {
    fn summarize(&self, prompt: &str, timeout: Duration) -> Result<String, SummarizeError> {
        let mut child = self.spawn()?;
        debug!(program = %self.program, pid = child.id(), "summarizer started");

        let stdin = child.stdin.take();
        let input = prompt.to_owned();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // The child may exit without reading its input.
                if let Err(e) = stdin.write_all(input.as_bytes()) {
                    debug!(error = %e, "summarizer stdin closed early");
                }
            }
        });
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // The deadline covers the pipes too: a background process left behind
        // by the summarizer can hold them open after the child itself exits.
        let deadline = Instant::now() + timeout;
        let mut exited = None;
        let status = loop {
            if exited.is_none() {
                exited = child.try_wait().map_err(SummarizeError::Wait)?;
            }
            let drained = writer.is_finished() && stdout.is_finished() && stderr.is_finished();
            match exited {
                Some(status) if drained => break status,
                _ if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    debug!(exited = exited.is_some(), "summarizer timed out");
                    // Helper threads still blocked on a pipe are abandoned.
                    return Err(SummarizeError::Timeout(timeout));
                }
                _ => thread::sleep(POLL_INTERVAL),
            }
        };

        let _ = writer.join();
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(SummarizeError::Failed {
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
