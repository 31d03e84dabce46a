use serde::Deserialize;

/// Number of leading session-id characters used in handover filenames.
pub const SESSION_PREFIX_LEN: usize = 8;

// ===================================================================
// Hook input (received via stdin, snake_case JSON)
// ===================================================================

/// The subset of the hook payload both hooks care about.
///
/// Every field is optional: the loader treats a malformed payload as an
/// empty object, and both hooks decide for themselves which missing fields
/// turn into a silent no-op.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
}

impl HookInput {
    /// Parse a payload, failing on malformed JSON.
    pub fn parse(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    /// Parse a payload, falling back to an empty object on malformed JSON.
    pub fn parse_lenient(input: &str) -> Self {
        Self::parse(input).unwrap_or_default()
    }

    /// Session id, treating an empty string the same as an absent one.
    ///
    /// Ids that could not form part of a single file name (path separators,
    /// NUL) are also treated as absent.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .filter(|s| !s.is_empty() && !s.contains(['/', '\\', '\0']))
    }

    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref().filter(|s| !s.is_empty())
    }

    pub fn transcript_path(&self) -> Option<&str> {
        self.transcript_path.as_deref().filter(|s| !s.is_empty())
    }
}

/// First `SESSION_PREFIX_LEN` characters of a session id.
///
/// Counts characters rather than bytes so a multi-byte id never splits a
/// code point.
pub fn session_prefix(session_id: &str) -> &str {
    match session_id.char_indices().nth(SESSION_PREFIX_LEN) {
        Some((idx, _)) => &session_id[..idx],
        None => session_id,
    }
}

// ===================================================================
// Modes
// ===================================================================

/// How the loader was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Hook fired after compaction: current session only, live files rotated.
    Auto,
    /// Explicit `--load`: newest handover of any session in the directory.
    Manual,
}

impl LoadMode {
    pub fn label(self) -> &'static str {
        match self {
            LoadMode::Auto => "auto",
            LoadMode::Manual => "handover_read",
        }
    }
}

/// Which context-gathering strategy the generator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateMode {
    /// Current transcript plus the most recent handover documents.
    Update,
    /// Current transcript plus tails of other sessions' transcripts.
    Refresh,
}

impl GenerateMode {
    pub fn label(self) -> &'static str {
        match self {
            GenerateMode::Update => "handover_update",
            GenerateMode::Refresh => "handover_refresh",
        }
    }

    /// Plural noun describing the past context this mode gathers.
    pub fn past_label(self) -> &'static str {
        match self {
            GenerateMode::Update => "past handovers",
            GenerateMode::Refresh => "past transcripts",
        }
    }
}
