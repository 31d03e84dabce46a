use super::*;
use crate::fs::MemFs;
use chrono::TimeZone;
use std::time::Duration;

const DIR: &str = "/proj";

fn p(name: &str) -> PathBuf {
    Path::new(DIR).join(name)
}

fn archived_name_at(session: &str, secs: u64) -> String {
    let time = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
    HandoverName::archived(session, naming::local_time(time)).file_name()
}

fn empty_dir() -> MemFs {
    let fs = MemFs::new();
    fs.add_dir(DIR);
    fs
}

// ===================================================================
// Selection
// ===================================================================

#[test]
fn latest_picks_greatest_mtime() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-abcd1234-20240103-000000.md"), "c", 100);
    fs.add(p("HANDOVER-abcd1234-20240101-000000.md"), "a", 300);
    fs.add(p("HANDOVER-abcd1234-20240102-000000.md"), "b", 200);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(
        store.latest(Some("abcd1234")),
        Some(p("HANDOVER-abcd1234-20240101-000000.md")),
        "mtime decides, not the stamp in the name"
    );
}

#[test]
fn latest_scoped_to_session() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-abcd1234-20240101-120000.md"), "mine", 100);
    fs.add(p("HANDOVER-ffff0000-20240102-120000.md"), "theirs", 200);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(
        store.latest(Some("abcd1234")),
        Some(p("HANDOVER-abcd1234-20240101-120000.md"))
    );
    assert_eq!(
        store.latest(None),
        Some(p("HANDOVER-ffff0000-20240102-120000.md"))
    );
}

#[test]
fn latest_considers_live_and_archived_together() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-abcd1234-20240101-120000.md"), "old", 100);
    fs.add(p("HANDOVER-abcd1234.md"), "live", 200);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.latest(Some("abcd1234")), Some(p("HANDOVER-abcd1234.md")));
}

#[test]
fn latest_falls_back_to_legacy() {
    let fs = empty_dir();
    fs.add(p("HANDOVER.md"), "legacy", 100);
    fs.add(p("HANDOVER-ffff0000-20240102-120000.md"), "other", 200);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.latest(Some("abcd1234")), Some(p("HANDOVER.md")));
}

#[test]
fn legacy_never_beats_a_session_match() {
    let fs = empty_dir();
    fs.add(p("HANDOVER.md"), "legacy", 900);
    fs.add(p("HANDOVER-abcd1234-20240101-120000.md"), "mine", 100);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(
        store.latest(Some("abcd1234")),
        Some(p("HANDOVER-abcd1234-20240101-120000.md"))
    );
}

#[test]
fn latest_none_for_empty_dir() {
    let fs = empty_dir();
    fs.add(p("README.md"), "not a handover", 100);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.latest(Some("abcd1234")), None);
    assert_eq!(store.latest(None), None);
}

#[test]
fn latest_none_for_missing_dir() {
    let fs = MemFs::new();
    let store = HandoverStore::new(&fs, "/does/not/exist");
    assert_eq!(store.latest(None), None);
    assert!(store.recent(3).is_empty());
}

#[test]
fn mtime_ties_resolve_deterministically() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-abcd1234-20240101-120000.md"), "a", 100);
    fs.add(p("HANDOVER-abcd1234-20240102-120000.md"), "b", 100);
    let store = HandoverStore::new(&fs, DIR);
    let first = store.latest(Some("abcd1234"));
    for _ in 0..5 {
        assert_eq!(store.latest(Some("abcd1234")), first);
    }
    assert_eq!(first, Some(p("HANDOVER-abcd1234-20240102-120000.md")));
}

#[test]
fn recent_spans_sessions_newest_first() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-aaaa0000-20240101-000000.md"), "1", 100);
    fs.add(p("HANDOVER-bbbb0000-20240101-000000.md"), "2", 300);
    fs.add(p("HANDOVER-cccc0000-20240101-000000.md"), "3", 200);
    fs.add(p("HANDOVER.md"), "legacy", 999);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(
        store.recent(2),
        vec![
            p("HANDOVER-bbbb0000-20240101-000000.md"),
            p("HANDOVER-cccc0000-20240101-000000.md"),
        ]
    );
    assert_eq!(store.recent(0), Vec::<PathBuf>::new());
}

// ===================================================================
// Content
// ===================================================================

#[test]
fn read_content_returns_text() {
    let fs = empty_dir();
    fs.add(p("HANDOVER.md"), "# notes\n", 1);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.read_content(&p("HANDOVER.md")).as_deref(), Some("# notes\n"));
}

#[test]
fn read_content_blank_is_none() {
    let fs = empty_dir();
    fs.add(p("HANDOVER.md"), "  \n\t\n", 1);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.read_content(&p("HANDOVER.md")), None);
}

#[test]
fn read_content_invalid_utf8_is_none() {
    let fs = empty_dir();
    fs.add(p("HANDOVER.md"), [0xffu8, 0xfe, 0x00], 1);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.read_content(&p("HANDOVER.md")), None);
}

#[test]
fn read_content_missing_is_none() {
    let fs = empty_dir();
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.read_content(&p("HANDOVER-gone.md")), None);
}

// ===================================================================
// Rotation
// ===================================================================

#[test]
fn archive_renames_live_to_stamped() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-abcd1234.md"), "live body", 1_700_000_000);
    let store = HandoverStore::new(&fs, DIR);

    let archived = store.archive(&p("HANDOVER-abcd1234.md")).unwrap();
    assert_eq!(archived, p(&archived_name_at("abcd1234", 1_700_000_000)));
    assert!(!fs.exists(p("HANDOVER-abcd1234.md")));
    assert_eq!(fs.contents(&archived).as_deref(), Some("live body"));

    // Selection now finds the archived copy.
    assert_eq!(store.latest(Some("abcd1234")), Some(archived));
}

#[test]
fn archive_ignores_already_archived() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-abcd1234-20240101-120000.md"), "x", 1);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.archive(&p("HANDOVER-abcd1234-20240101-120000.md")), None);
    assert!(fs.exists(p("HANDOVER-abcd1234-20240101-120000.md")));
}

#[test]
fn archive_ignores_legacy() {
    let fs = empty_dir();
    fs.add(p("HANDOVER.md"), "x", 1);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.archive(&p("HANDOVER.md")), None);
    assert!(fs.exists(p("HANDOVER.md")));
}

#[test]
fn archive_does_not_clobber_existing_target() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-abcd1234.md"), "live", 1_700_000_000);
    fs.add(p(&archived_name_at("abcd1234", 1_700_000_000)), "already", 5);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.archive(&p("HANDOVER-abcd1234.md")), None);
    assert_eq!(fs.contents(p("HANDOVER-abcd1234.md")).as_deref(), Some("live"));
    assert_eq!(
        fs.contents(p(&archived_name_at("abcd1234", 1_700_000_000))).as_deref(),
        Some("already")
    );
}

#[test]
fn archive_swallows_rename_failure() {
    let fs = MemFs::with_failing_renames();
    fs.add_dir(DIR);
    fs.add(p("HANDOVER-abcd1234.md"), "live", 1_700_000_000);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.archive(&p("HANDOVER-abcd1234.md")), None);
    assert!(fs.exists(p("HANDOVER-abcd1234.md")));
}

#[test]
fn rotate_live_without_live_file_is_noop() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-abcd1234-20240101-120000.md"), "x", 1);
    let store = HandoverStore::new(&fs, DIR);
    assert_eq!(store.rotate_live("abcd1234"), None);
    assert_eq!(fs.names(DIR), vec!["HANDOVER-abcd1234-20240101-120000.md"]);
}

// ===================================================================
// Writing
// ===================================================================

#[test]
fn write_new_uses_stamped_name_and_rotates_live() {
    let fs = empty_dir();
    fs.add(p("HANDOVER-abcd1234.md"), "previous", 1_600_000_000);
    let store = HandoverStore::new(&fs, DIR);
    let now = Local.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();

    let written = store.write_new("abcd1234", now, "summary\n").unwrap();
    assert_eq!(written, p("HANDOVER-abcd1234-20240304-050607.md"));
    assert_eq!(fs.contents(&written).as_deref(), Some("summary\n"));
    assert!(!fs.exists(p("HANDOVER-abcd1234.md")));
    assert!(fs.exists(p(&archived_name_at("abcd1234", 1_600_000_000))));

    // The freshly written file is the newest for the session.
    assert_eq!(store.latest(Some("abcd1234")), Some(written));
}

#[test]
fn write_new_failure_leaves_directory_untouched() {
    let fs = MemFs::with_failing_writes();
    fs.add_dir(DIR);
    fs.add(p("HANDOVER-abcd1234-20240101-120000.md"), "older", 100);
    fs.add(p("HANDOVER-abcd1234.md"), "live", 200);
    let store = HandoverStore::new(&fs, DIR);
    let now = Local.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();

    let err = store.write_new("abcd1234", now, "summary\n").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::StorageFull);
    assert_eq!(
        fs.names(DIR),
        vec!["HANDOVER-abcd1234-20240101-120000.md", "HANDOVER-abcd1234.md"]
    );
    assert_eq!(store.latest(Some("abcd1234")), Some(p("HANDOVER-abcd1234.md")));
}
