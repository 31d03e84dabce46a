use crate::fs::FileSystem;
use std::io;
use std::path::Path;
use tracing::debug;

/// A tail of another session's transcript, gathered in refresh mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastTranscript {
    pub name: String,
    pub content: String,
}

/// Read at most `max_bytes` from the end of a transcript.
///
/// When the file is larger than the budget, the partial line at the start
/// of the window is dropped so the result always begins on a line boundary.
/// Invalid UTF-8 is replaced rather than rejected. Unreadable files yield
/// an empty string.
pub fn read_tail<F: FileSystem>(fs: &F, path: &Path, max_bytes: u64) -> String {
    match try_read_tail(fs, path, max_bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot read transcript");
            String::new()
        }
    }
}

fn try_read_tail<F: FileSystem>(fs: &F, path: &Path, max_bytes: u64) -> io::Result<String> {
    let size = fs.len(path)?;
    if size <= max_bytes {
        let bytes = fs.read_from(path, 0)?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }
    // Start one byte early: if that byte is a newline the window already
    // begins on a line boundary and nothing but it is skipped.
    let start = size - max_bytes;
    let bytes = fs.read_from(path, start - 1)?;
    let body = match bytes.iter().position(|&b| b == b'\n') {
        Some(i) => &bytes[i + 1..],
        None => &[][..],
    };
    Ok(String::from_utf8_lossy(body).into_owned())
}

/// Tails of the `count` most recently modified `.jsonl` transcripts that
/// sit next to `current`, excluding `current` itself. Blank tails are dropped.
pub fn past_transcripts<F: FileSystem>(
    fs: &F,
    current: &Path,
    count: usize,
    max_bytes: u64,
) -> Vec<PastTranscript> {
    let Some(dir) = current.parent() else {
        return Vec::new();
    };
    let paths = match fs.list(dir) {
        Ok(paths) => paths,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot list transcript directory");
            return Vec::new();
        }
    };
    let current_name = current.file_name();

    let mut candidates: Vec<_> = paths
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "jsonl"))
        .filter(|p| p.file_name() != current_name)
        .filter_map(|p| fs.modified(&p).ok().map(|m| (m, p)))
        .collect();
    candidates.sort_by(|a, b| b.cmp(a));

    candidates
        .into_iter()
        .take(count)
        .filter_map(|(_, path)| {
            let content = read_tail(fs, &path, max_bytes);
            if content.trim().is_empty() {
                return None;
            }
            let name = path.file_name()?.to_string_lossy().into_owned();
            Some(PastTranscript { name, content })
        })
        .collect()
}
