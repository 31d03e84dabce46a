use crate::error::GenerateError;
use crate::fs::FileSystem;
use crate::settings::ContextSettings;
use crate::store::HandoverStore;
use crate::transcript;
use crate::types::{GenerateMode, session_prefix};
use chrono::NaiveDate;
use minijinja::{Environment, context};
use std::path::Path;

/// Built-in summarization prompt.
pub const DEFAULT_TEMPLATE: &str = r#"Analyze the following coding-assistant session transcript (JSONL) together with {{ past_count }} {{ past_label }} and produce a handover document for the next session.
Work cumulatively: carry context forward across sessions and call out patterns that keep recurring.

## Output format (emit exactly this structure)

# HANDOVER: {{ today }}
Session: {{ session }}
Directory: {{ cwd }}

## Accomplished
(Bullet points. Name the concrete files and what changed in them.)

## Unfinished work
(Tasks in progress and errors still occurring. Include file paths and line numbers.)

## Instructions for the next session
1. The first command to run or thing to check
2. Remaining tasks, in priority order
3. Files or features that must not be touched

## Caveats & pitfalls
(Traps discovered during the session and approaches that failed.)

## Cumulative context
- Recurring problems:
- Decisions accumulated across sessions:
- Top 3 tasks to prioritize next:

---
Rules:
- Write prescriptively: "Run X", not "X was checked".
- Include concrete paths, commands and identifiers.
- No preamble. Output the Markdown immediately.
- Write in {{ language }}.
- The first four sections cover the current session.
- "Cumulative context" carries over what the earlier material established and merges in this session's results.

## Current session transcript
{{ current_transcript }}

## Past {{ past_label }}
{{ past_context }}"#;

/// One earlier handover or transcript tail fed to the summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastSection {
    pub name: String,
    pub content: String,
}

/// Everything the summarizer sees for one generator run.
#[derive(Debug, Clone)]
pub struct Context {
    pub mode: GenerateMode,
    pub session_id: String,
    pub cwd: String,
    pub current_transcript: String,
    pub past: Vec<PastSection>,
}

/// Read the current transcript tail and the past context for `mode`.
///
/// Fails with [`GenerateError::EmptyTranscript`] when the tail is blank,
/// before anything else is read.
pub fn gather<F: FileSystem>(
    fs: &F,
    store: &HandoverStore<'_, F>,
    transcript_path: &Path,
    session_id: &str,
    mode: GenerateMode,
    budgets: &ContextSettings,
) -> Result<Context, GenerateError> {
    let budget = match mode {
        GenerateMode::Update => budgets.transcript_bytes,
        GenerateMode::Refresh => budgets.refresh_transcript_bytes,
    };
    let current_transcript = transcript::read_tail(fs, transcript_path, budget);
    if current_transcript.trim().is_empty() {
        return Err(GenerateError::EmptyTranscript(transcript_path.to_path_buf()));
    }

    let past = match mode {
        GenerateMode::Update => store
            .recent(budgets.past_handovers)
            .into_iter()
            .filter_map(|path| {
                let content = store.read_content(&path)?;
                let name = path.file_name()?.to_string_lossy().into_owned();
                Some(PastSection { name, content })
            })
            .collect(),
        GenerateMode::Refresh => transcript::past_transcripts(
            fs,
            transcript_path,
            budgets.past_transcripts,
            budgets.past_transcript_bytes,
        )
        .into_iter()
        .map(|t| PastSection {
            name: t.name,
            content: t.content,
        })
        .collect(),
    };

    Ok(Context {
        mode,
        session_id: session_id.to_string(),
        cwd: store.dir().display().to_string(),
        current_transcript,
        past,
    })
}

impl Context {
    /// Past sections under `### Past handover: NAME` headings, or a
    /// placeholder when there are none.
    pub fn past_context(&self) -> String {
        let kind = match self.mode {
            GenerateMode::Update => "handover",
            GenerateMode::Refresh => "transcript",
        };
        if self.past.is_empty() {
            return format!("(no past {kind}s)");
        }
        self.past
            .iter()
            .map(|s| format!("### Past {kind}: {}\n{}", s.name, s.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render the prompt from `template`, or the built-in one.
    pub fn render(
        &self,
        template: Option<&str>,
        language: &str,
        today: NaiveDate,
    ) -> Result<String, minijinja::Error> {
        let env = Environment::new();
        let tmpl = env.template_from_str(template.unwrap_or(DEFAULT_TEMPLATE))?;
        tmpl.render(context! {
            today => today.format("%Y-%m-%d").to_string(),
            session => session_prefix(&self.session_id),
            cwd => self.cwd,
            language,
            past_count => self.past.len(),
            past_label => self.mode.past_label(),
            current_transcript => self.current_transcript,
            past_context => self.past_context(),
        })
    }
}
