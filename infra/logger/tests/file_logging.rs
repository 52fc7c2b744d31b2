use lovebird_logger::{ConsoleFormat, LevelFilter, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_file_logging_writes_structured_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("lovebird-file-logging")
        .console_format(ConsoleFormat::Json)
        .level(LevelFilter::INFO)
        .path(&log_dir)
        .json()
        .init()?;

    assert!(logger.guard().is_some(), "file output should hold a writer guard");
    tracing::info!(client = "abc", "callback handled");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let line = contents.lines().find(|line| line.contains("callback handled")).expect("logged line");
    assert!(line.starts_with('{'), "expected a JSON line, got {line}");
    assert!(line.contains("\"client\":\"abc\""), "{line}");

    Ok(())
}
