use chrono::{DateTime, Local, NaiveDateTime};

const PREFIX: &str = "HANDOVER-";
const SUFFIX: &str = ".md";

/// Unscoped filename from before handovers were tied to a session.
pub const LEGACY_NAME: &str = "HANDOVER.md";

/// `chrono` format of the capture timestamp embedded in archived names.
pub const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const STAMP_LEN: usize = "YYYYMMDD-HHMMSS".len();

/// A filename recognised as a handover document.
///
/// ```text
/// HANDOVER-abcd1234-20240101-120000.md   Archived
/// HANDOVER-abcd1234.md                   Live
/// HANDOVER.md                            Legacy
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoverName {
    Archived { session: String, stamp: NaiveDateTime },
    Live { session: String },
    Legacy,
}

impl HandoverName {
    pub fn parse(file_name: &str) -> Option<Self> {
        if file_name == LEGACY_NAME {
            return Some(HandoverName::Legacy);
        }
        let body = file_name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        if body.is_empty() {
            return None;
        }
        if let Some((session, stamp)) = split_stamp(body) {
            return Some(HandoverName::Archived {
                session: session.to_string(),
                stamp,
            });
        }
        Some(HandoverName::Live {
            session: body.to_string(),
        })
    }

    pub fn archived(session: &str, at: DateTime<Local>) -> Self {
        HandoverName::Archived {
            session: session.to_string(),
            stamp: at.naive_local(),
        }
    }

    pub fn live(session: &str) -> Self {
        HandoverName::Live {
            session: session.to_string(),
        }
    }

    pub fn session(&self) -> Option<&str> {
        match self {
            HandoverName::Archived { session, .. } | HandoverName::Live { session } => {
                Some(session)
            }
            HandoverName::Legacy => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, HandoverName::Live { .. })
    }

    pub fn file_name(&self) -> String {
        match self {
            HandoverName::Archived { session, stamp } => {
                format!("{PREFIX}{session}-{}{SUFFIX}", stamp.format(STAMP_FORMAT))
            }
            HandoverName::Live { session } => format!("{PREFIX}{session}{SUFFIX}"),
            HandoverName::Legacy => LEGACY_NAME.to_string(),
        }
    }
}

/// Split `session-YYYYMMDD-HHMMSS` into its parts, if the tail is a valid stamp.
fn split_stamp(body: &str) -> Option<(&str, NaiveDateTime)> {
    if body.len() <= STAMP_LEN + 1 || !body.is_char_boundary(body.len() - STAMP_LEN) {
        return None;
    }
    let (head, stamp) = body.split_at(body.len() - STAMP_LEN);
    let session = head.strip_suffix('-')?;
    if session.is_empty() {
        return None;
    }
    let stamp = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    Some((session, stamp))
}

/// Local time for a filesystem timestamp, used when archiving a live file
/// under the moment it was last written.
pub fn local_time(time: std::time::SystemTime) -> DateTime<Local> {
    DateTime::<chrono::Utc>::from(time).with_timezone(&Local)
}
