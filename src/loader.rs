use crate::fs::FileSystem;
use crate::naming::HandoverName;
use crate::store::HandoverStore;
use crate::types::{HookInput, LoadMode, session_prefix};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A handover found and read by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub path: PathBuf,
    pub content: String,
    /// Where a live file was rotated to after reading, if it was.
    pub archived: Option<PathBuf>,
}

impl Loaded {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Find and read the handover to inject.
///
/// Automatic mode only looks at the current session and rotates a live
/// file once it has been read. Manual mode takes the newest handover of any
/// session and never renames anything. Every miss is `None`.
pub fn load<F: FileSystem>(fs: &F, input: &HookInput, mode: LoadMode) -> Option<Loaded> {
    let cwd = Path::new(input.cwd()?);
    if !fs.is_dir(cwd) {
        debug!(path = %cwd.display(), "cwd missing");
        return None;
    }
    let store = HandoverStore::new(fs, cwd);

    let path = match mode {
        LoadMode::Auto => store.latest(Some(session_prefix(input.session_id()?)))?,
        LoadMode::Manual => store.latest(None)?,
    };
    let content = store.read_content(&path)?;

    let is_live = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(HandoverName::parse)
        .is_some_and(|n| n.is_live());
    let archived = if mode == LoadMode::Auto && is_live {
        store.archive(&path)
    } else {
        None
    };

    Some(Loaded {
        path,
        content,
        archived,
    })
}

/// Write the handover body to `out` and a status line to `status`.
pub fn emit(
    loaded: &Loaded,
    mode: LoadMode,
    out: &mut impl Write,
    status: &mut impl Write,
) -> io::Result<()> {
    let line = format!("[{}] {} loaded", mode.label(), loaded.file_name());
    if mode == LoadMode::Manual {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{}", loaded.content)?;
    out.flush()?;
    writeln!(status, "{line}")
}
