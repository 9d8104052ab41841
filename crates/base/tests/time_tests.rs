use base::{DateTime, Epoch, format_timestamp};

#[test]
fn test_datetime_formats_epoch() {
    let dt = DateTime::from_unix_millis(0);
    assert_eq!(dt.to_iso(), "1970-01-01T00:00:00.000Z");
    assert_eq!(dt.to_compact(), "19700101_000000");
    assert_eq!(dt.to_date(), "1970-01-01");
}

#[test]
fn test_datetime_keeps_millis_and_time_of_day() {
    // 2024-12-31T23:59:58.250Z
    let ms = 20088u64 * 86_400_000 + 86_398_000 + 250;
    let dt = DateTime::from_unix_millis(ms);
    assert_eq!(dt.to_iso(), "2024-12-31T23:59:58.250Z");
    assert_eq!(dt.to_compact(), "20241231_235958");
}

#[test]
fn test_format_timestamp_structure() {
    let ts = format_timestamp();
    assert_eq!(ts.len(), 19);
    assert_eq!(&ts[4..5], "-");
    assert_eq!(&ts[10..11], "T");
    assert_eq!(&ts[16..17], ":");
}

#[test]
fn test_epoch_advance_invalidates_previous() {
    let epoch = Epoch::new();
    let captured = epoch.current();
    assert!(epoch.is_current(captured));

    let shared = epoch.clone();
    let next = shared.advance();
    assert_eq!(next, captured + 1);
    assert!(!epoch.is_current(captured));
    assert!(epoch.is_current(next));
}
