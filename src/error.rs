use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarizer command is empty")]
    NoCommand,

    #[error("summarizer `{0}` not found")]
    NotFound(String),

    #[error("failed to run summarizer: {0}")]
    Spawn(io::Error),

    #[error("failed to wait for summarizer: {0}")]
    Wait(io::Error),

    #[error("summarizer timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("summarizer exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

/// Fatal outcomes of a generator run. Each leaves no handover behind.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("transcript {} is empty", .0.display())]
    EmptyTranscript(PathBuf),

    #[error("rendering prompt template: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error("summarizer returned no text")]
    EmptySummary,

    #[error("writing {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}
