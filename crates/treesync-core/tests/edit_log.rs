use pretty_assertions::assert_eq;
use treesync_core::{EditLog, RangeSet, SyncError, TextPoint};

#[test]
fn test_apply_edit_rejects_out_of_bounds_and_keeps_content() {
    let mut log = EditLog::new("{}");
    log.take_pending();

    let err = log.apply_edit(1..5, "x").unwrap_err();
    assert_eq!(
        err,
        SyncError::OutOfBounds {
            start: 1,
            end: 5,
            len: 2
        }
    );
    let (start, end) = (2, 1);
    assert!(log.apply_edit(start..end, "x").is_err());

    assert_eq!(log.text(), "{}");
    assert_eq!(log.version(), 0);
    assert!(!log.has_pending());
}

#[test]
fn test_reported_change_reads_inserted_text_from_new_content() {
    let mut log = EditLog::new("{}");

    // Host reports: replaced 1..1 in the old content, length grew by 5.
    let edit = log
        .apply_reported_change(1..1, 5, "{\"a\":1}")
        .expect("valid change");
    assert_eq!(edit.inserted_text.as_deref(), Some("\"a\":1"));
    assert_eq!(edit.new_end, 6);
    assert_eq!(edit.new_end_point, TextPoint::new(0, 6));
    assert_eq!(log.text(), "{\"a\":1}");
    assert_eq!(log.version(), 1);
}

#[test]
fn test_reported_change_with_mismatched_length_is_rejected() {
    let mut log = EditLog::new("abc");
    let err = log.apply_reported_change(0..1, 2, "xyzbc!").unwrap_err();
    assert!(matches!(err, SyncError::OutOfBounds { .. }));
    assert_eq!(log.text(), "abc");
}

#[test]
fn test_reported_change_must_agree_outside_the_replaced_range() {
    let mut log = EditLog::new("abc");
    log.take_pending();

    // Right length, but "bc" after the replaced byte became "ZZ".
    let err = log.apply_reported_change(0..1, 0, "xZZ").unwrap_err();
    assert!(matches!(err, SyncError::OutOfBounds { .. }));
    // Prefix before the replaced range disagrees.
    assert!(log.apply_reported_change(2..3, 0, "Zbx").is_err());
    assert_eq!(log.text(), "abc");
    assert_eq!(log.version(), 0);
    assert!(!log.has_pending());

    log.apply_reported_change(0..1, 0, "xbc").unwrap();
    assert_eq!(log.text(), "xbc");
}

#[test]
fn test_reported_deletion() {
    let mut log = EditLog::new("{\"a\":1}");
    let edit = log.apply_reported_change(1..6, -5, "{}").unwrap();
    assert_eq!(edit.old_range(), 1..6);
    assert_eq!(edit.inserted_range(), 1..1);
    assert_eq!(edit.delta(), -5);
    assert_eq!(log.text(), "{}");
}

#[test]
fn test_replace_content_is_one_full_edit() {
    let mut log = EditLog::new("line one\nline two\n");
    log.take_pending();

    let edit = log.replace_content("[]").unwrap();
    assert_eq!(edit.old_range(), 0..18);
    assert_eq!(edit.old_end_point, TextPoint::new(2, 0));

    let snap = log.take_pending().unwrap();
    assert_eq!(snap.version, 1);
    assert_eq!(snap.edits, vec![edit]);
    assert_eq!(snap.content.to_string(), "[]");
}

#[test]
fn test_noop_edit_bumps_version() {
    let mut log = EditLog::new("{}");
    log.take_pending();
    let edit = log.apply_edit(1..1, "").unwrap();
    assert!(edit.is_noop());
    assert_eq!(log.version(), 1);
    assert!(log.has_pending());
}

#[test]
fn test_history_carries_old_ranges_forward() {
    let mut log = EditLog::new("[1, 2, 3]");
    log.set_keep_history(true);

    log.apply_edit(1..1, "\"").unwrap();
    log.apply_edit(0..0, "      ").unwrap();
    assert_eq!(log.edits_since(2), Some(&[][..]));
    assert!(log.edits_since(3).is_none());

    let mut ranges = RangeSet::single(4..8);
    ranges.shift_for_edits(log.edits_since(1).unwrap());
    assert_eq!(ranges.as_slice(), &[11..15]);
    assert_eq!(&log.text()[11..15], "2, 3");

    log.forget_history(1);
    assert!(log.edits_since(0).is_none());
    assert_eq!(log.edits_since(1).map(<[_]>::len), Some(1));

    log.set_keep_history(false);
    assert!(log.edits_since(1).is_none());
    assert_eq!(log.edits_since(2).map(<[_]>::len), Some(0));
}

#[test]
fn test_history_is_off_by_default() {
    let mut log = EditLog::new("{}");
    log.apply_edit(1..1, "1").unwrap();
    assert!(log.edits_since(0).is_none());
    assert_eq!(log.edits_since(1), Some(&[][..]));
}
