//! Tests for the CLI commands.

use super::formats::cmd_formats;
use super::read::cmd_read;
use super::resolve_config;
use super::write::{cmd_write, parse_data};
use crate::cli::{Cli, ReadArgs, WriteArgs};
use atomicio::config::Config;
use atomicio::error::AtomicIoError;
use atomicio::exit_codes;
use atomicio::locks::TimeoutPolicy;
use clap::Parser;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn read_output(file: &Path, as_bytes: bool) -> Result<Vec<u8>, AtomicIoError> {
    let args = ReadArgs {
        file: file.to_path_buf(),
        as_bytes,
    };
    let mut out: Vec<u8> = Vec::new();
    cmd_read(&Config::default(), &args, &mut out)?;
    Ok(out)
}

fn write_args(file: &Path, data: &str, as_bytes: bool) -> WriteArgs {
    WriteArgs {
        file: file.to_path_buf(),
        data: data.to_string(),
        as_bytes,
    }
}

// ============================================================================
// read
// ============================================================================

#[test]
fn test_read_missing_file_is_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = read_output(&temp_dir.path().join("absent.json"), false).unwrap_err();

    assert!(matches!(err, AtomicIoError::Usage(_)));
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert!(err.to_string().contains("file not found"));
}

#[test]
fn test_read_structured_prints_pretty_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "name: demo\ncount: 2\n").unwrap();

    let out = String::from_utf8(read_output(&path, false).unwrap()).unwrap();
    let expected = serde_json::to_string_pretty(&json!({"name": "demo", "count": 2})).unwrap();
    assert_eq!(out, format!("{}\n", expected));
}

#[test]
fn test_read_text_prints_verbatim() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("notes.txt");
    fs::write(&path, "hello world").unwrap();

    let out = String::from_utf8(read_output(&path, false).unwrap()).unwrap();
    assert_eq!(out, "hello world\n");
}

#[test]
fn test_read_as_bytes_copies_raw_content() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("blob.bin");
    fs::write(&path, [0u8, 159, 146, 150]).unwrap();

    assert_eq!(read_output(&path, true).unwrap(), vec![0u8, 159, 146, 150]);
}

#[test]
fn test_read_corrupt_file_is_operation_failure() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, "{oops").unwrap();

    let err = read_output(&path, false).unwrap_err();
    assert!(matches!(err, AtomicIoError::Read { .. }));
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILURE);
}

// ============================================================================
// write
// ============================================================================

#[test]
fn test_write_parses_json_data() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    cmd_write(&Config::default(), &write_args(&path, r#"{"foo": 1}"#, false)).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, json!({"foo": 1}));
}

#[test]
fn test_write_falls_back_to_string() {
    assert_eq!(parse_data("not json"), json!("not json"));
    assert_eq!(parse_data("42"), json!(42));
    assert_eq!(parse_data("[1, 2]"), json!([1, 2]));

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("note.txt");
    cmd_write(&Config::default(), &write_args(&path, "plain words", false)).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "plain words");
}

#[test]
fn test_write_as_bytes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("raw.json");

    cmd_write(&Config::default(), &write_args(&path, "{not encoded}", true)).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "{not encoded}");
}

#[test]
fn test_write_missing_directory_is_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing").join("config.json");

    let err = cmd_write(&Config::default(), &write_args(&path, "{}", false)).unwrap_err();
    assert!(matches!(err, AtomicIoError::Usage(_)));
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert!(!path.parent().unwrap().exists());
}

#[test]
fn test_write_unsupported_extension_is_operation_failure() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.csv");

    let err = cmd_write(&Config::default(), &write_args(&path, "[1]", false)).unwrap_err();
    assert!(matches!(err, AtomicIoError::Write { .. }));
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILURE);
}

// ============================================================================
// formats and configuration
// ============================================================================

#[test]
fn test_formats_lists_extensions() {
    let mut out: Vec<u8> = Vec::new();
    cmd_formats(&mut out).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Supported formats: .json, .toml, .txt, .yaml, .yml\n"
    );
}

#[test]
fn test_timeout_flag_overrides_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("atomicio.yaml");
    fs::write(&config_path, "timeout: true\nrelease_retries: 5\n").unwrap();

    let cli = Cli::try_parse_from([
        "atomicio",
        "--config",
        config_path.to_str().unwrap(),
        "--timeout",
        "0.5",
        "formats",
    ])
    .unwrap();

    let config = resolve_config(&cli).unwrap();
    assert_eq!(
        config.timeout,
        TimeoutPolicy::Explicit(Duration::from_millis(500))
    );
    assert_eq!(config.release_retries, 5);
}

#[test]
fn test_invalid_config_file_is_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("atomicio.yaml");
    fs::write(&config_path, "release_retries: 0\n").unwrap();

    let cli = Cli::try_parse_from([
        "atomicio",
        "--config",
        config_path.to_str().unwrap(),
        "formats",
    ])
    .unwrap();

    let err = resolve_config(&cli).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}
