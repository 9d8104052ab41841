use base::{FileLogger, StdoutLogger, init_file_logger, init_stdout_logger};
use log::Log;
use std::fs;

fn record_args<'a>(args: std::fmt::Arguments<'a>, level: log::Level) -> log::Record<'a> {
    log::RecordBuilder::new()
        .level(level)
        .target("test")
        .file(Some("session.rs"))
        .line(Some(100))
        .args(args)
        .build()
}

#[test]
fn test_stdout_logger_logs_without_panicking() {
    let logger = StdoutLogger;
    let metadata = log::MetadataBuilder::new()
        .level(log::Level::Info)
        .target("test")
        .build();
    assert!(logger.enabled(&metadata));

    logger.log(&record_args(format_args!("hello"), log::Level::Info));
    logger.flush();
}

#[test]
fn test_file_logger_writes_formatted_line() {
    let test_dir =
        std::env::temp_dir().join(format!("liveness-log-test-{}-write", std::process::id()));
    let _ = fs::remove_dir_all(&test_dir);

    let logger = FileLogger::new(&test_dir).expect("Failed to create FileLogger");
    logger.log(&record_args(
        format_args!("session abc entered ANALYZING"),
        log::Level::Warn,
    ));
    logger.flush();

    let entries: Vec<_> = fs::read_dir(&test_dir)
        .expect("Failed to read test directory")
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(entries.len(), 1);

    let content = fs::read_to_string(entries[0].path()).unwrap();
    assert!(content.contains("[WARN]"));
    assert!(content.contains("thread:"));
    assert!(content.contains("session.rs:100"));
    assert!(content.contains("session abc entered ANALYZING"));
    assert!(content.ends_with('\n'));

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn test_init_stdout_logger_installs_global_logger() {
    init_stdout_logger();
    assert!(log::logger().enabled(
        &log::MetadataBuilder::new()
            .level(log::Level::Info)
            .target("test")
            .build()
    ));
    log::info!("global logger works");
}

#[test]
fn test_init_file_logger_invalid_dir_returns_error() {
    assert!(init_file_logger("/proc/nonexistent/path").is_err());
}
