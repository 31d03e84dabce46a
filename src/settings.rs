use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

pub const FILENAME: &str = ".handover.toml";

const DEFAULT_COMMAND: &[&str] = &["claude", "-p", "--model", "sonnet"];

/// Summarization prompt template: either an inline Jinja2 string or a path
/// to a template file (relative to the working directory).
///
/// ```toml
/// [prompt_template]
/// inline = "Summarize:\n{{ current_transcript }}"
///
/// # or
///
/// [prompt_template]
/// file = "handover.j2"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    Inline(String),
    File(String),
}

/// External summarizer process.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummarizerSettings {
    /// Program followed by its arguments. The prompt goes to its stdin.
    pub command: Vec<String>,
    pub timeout_secs: u64,
    /// Variables removed from the child's environment. `CLAUDECODE` makes a
    /// nested `claude` refuse to start.
    pub strip_env: Vec<String>,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 300,
            strip_env: vec!["CLAUDECODE".into()],
        }
    }
}

impl SummarizerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Byte budgets and counts for context gathering.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextSettings {
    pub transcript_bytes: u64,
    /// Current-transcript budget in refresh mode.
    pub refresh_transcript_bytes: u64,
    pub past_handovers: usize,
    pub past_transcripts: usize,
    pub past_transcript_bytes: u64,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            transcript_bytes: 60_000,
            refresh_transcript_bytes: 100_000,
            past_handovers: 1,
            past_transcripts: 2,
            past_transcript_bytes: 20_000,
        }
    }
}

/// Per-project settings stored in `.handover.toml` in the working directory.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub summarizer: SummarizerSettings,

    #[serde(default)]
    pub context: ContextSettings,

    /// Language the handover document is written in.
    #[serde(default = "default_language")]
    pub language: String,

    /// Overrides the built-in prompt.
    #[serde(default)]
    pub prompt_template: Option<PromptTemplate>,
}

fn default_language() -> String {
    "English".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            summarizer: SummarizerSettings::default(),
            context: ContextSettings::default(),
            language: default_language(),
            prompt_template: None,
        }
    }
}

impl Settings {
    /// Load settings from `.handover.toml` in `dir`.
    ///
    /// A missing file means defaults; missing keys in an existing file are
    /// filled in via serde. The file is never created.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(FILENAME);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// The prompt template source, if the built-in one is overridden.
    pub fn load_template(&self, dir: &Path) -> Result<Option<String>> {
        match &self.prompt_template {
            None => Ok(None),
            Some(PromptTemplate::Inline(s)) => Ok(Some(s.clone())),
            Some(PromptTemplate::File(name)) => {
                let path = dir.join(name);
                fs::read_to_string(&path)
                    .map(Some)
                    .with_context(|| format!("reading template {}", path.display()))
            }
        }
    }
}
