use crate::context;
use crate::error::GenerateError;
use crate::fs::FileSystem;
use crate::settings::Settings;
use crate::store::HandoverStore;
use crate::summarizer::Summarizer;
use crate::types::{GenerateMode, HookInput, session_prefix};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Session id used when the payload doesn't carry one.
const UNKNOWN_SESSION: &str = "unknown";

/// A validated generator invocation: the working directory and transcript
/// both exist.
#[derive(Debug, Clone)]
pub struct Job {
    pub cwd: PathBuf,
    pub transcript: PathBuf,
    pub session_id: String,
}

impl Job {
    /// `None` when the cwd or transcript is missing; the hook then exits
    /// quietly without touching anything.
    pub fn from_input<F: FileSystem>(fs: &F, input: &HookInput) -> Option<Self> {
        let transcript = PathBuf::from(input.transcript_path()?);
        if !fs.is_file(&transcript) {
            debug!(path = %transcript.display(), "transcript missing");
            return None;
        }
        let cwd = PathBuf::from(input.cwd()?);
        if !fs.is_dir(&cwd) {
            debug!(path = %cwd.display(), "cwd missing");
            return None;
        }
        Some(Self {
            cwd,
            transcript,
            session_id: input.session_id().unwrap_or(UNKNOWN_SESSION).to_string(),
        })
    }
}

/// A handover written by a successful run.
#[derive(Debug, Clone)]
pub struct Generated {
    pub path: PathBuf,
    pub mode: GenerateMode,
    pub past_count: usize,
}

impl Generated {
    pub fn file_name(&self) -> String {
        file_name(&self.path)
    }

    /// Confirmation line for stdout.
    pub fn summary_line(&self) -> String {
        format!(
            "[{}] {} generated (transcript + {} {})",
            self.mode.label(),
            self.file_name(),
            self.past_count,
            self.mode.past_label()
        )
    }

    /// Status line for stderr.
    pub fn status_line(&self) -> String {
        format!("[{}] {} generated", self.mode.label(), self.file_name())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct Generator<'a, F: FileSystem, S: Summarizer> {
    pub fs: &'a F,
    pub summarizer: &'a S,
    pub settings: &'a Settings,
    /// Prompt template override; `None` uses the built-in prompt.
    pub template: Option<&'a str>,
}

impl<F: FileSystem, S: Summarizer> Generator<'_, F, S> {
    /// Gather context, summarize it and write the result as a new handover.
    ///
    /// Any error leaves the directory as it was: the handover is only
    /// written once the summarizer has returned non-blank text.
    pub fn run(
        &self,
        job: &Job,
        mode: GenerateMode,
        now: DateTime<Local>,
    ) -> Result<Generated, GenerateError> {
        let store = HandoverStore::new(self.fs, &job.cwd);
        let ctx = context::gather(
            self.fs,
            &store,
            &job.transcript,
            &job.session_id,
            mode,
            &self.settings.context,
        )?;
        debug!(
            transcript_bytes = ctx.current_transcript.len(),
            past = ctx.past.len(),
            ?mode,
            "context gathered"
        );

        let prompt = ctx.render(self.template, &self.settings.language, now.date_naive())?;
        let summary = self
            .summarizer
            .summarize(&prompt, self.settings.summarizer.timeout())?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(GenerateError::EmptySummary);
        }

        let session = session_prefix(&job.session_id);
        let path = store
            .write_new(session, now, &format!("{summary}\n"))
            .map_err(|source| GenerateError::Write {
                path: store.archived_path(session, now),
                source,
            })?;
        info!(path = %path.display(), "handover written");

        Ok(Generated {
            path,
            mode,
            past_count: ctx.past.len(),
        })
    }
}
