//! Integration tests for CLI argument handling
//!
//! Runs the built binary and checks argument validation and the
//! operations that do not need a reachable server.

use std::net::TcpListener;
use std::process::Command;

use tempfile::TempDir;

const ENV_VARS: [&str; 7] = [
    "FLAGCACHE_SERVER",
    "FLAGCACHE_API_KEY",
    "FLAGCACHE_ENVIRONMENT",
    "FLAGCACHE_CACHE",
    "FLAGCACHE_CACHE_FILE",
    "FLAGCACHE_CACHE_TTL",
    "FLAGCACHE_TIMEOUT",
];

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_flagcache"));
    for var in ENV_VARS {
        command.env_remove(var);
    }
    command
        .args(args)
        .output()
        .expect("Failed to execute flagcache")
}

fn with_connection(server: &str, extra: &[&str]) -> Vec<String> {
    let mut args = vec![
        "--server".to_string(),
        server.to_string(),
        "--api-key".to_string(),
        "secret".to_string(),
        "--environment".to_string(),
        "prod".to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("flagcache"), "Help should mention flagcache");
    assert!(stdout.contains("--cache"), "Help should mention --cache flag");
}

#[test]
fn test_missing_server_is_rejected() {
    let output = run_cli(&["--api-key", "secret", "--environment", "prod", "info"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--server"), "Should name the missing argument: {}", stderr);
}

#[test]
fn test_cache_file_without_cache_prints_error_and_exits() {
    let args = with_connection("http://127.0.0.1:1", &["--cache-file", "/tmp/x.json", "info"]);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run_cli(&args);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--cache-file requires --cache"), "stderr: {}", stderr);
}

#[test]
fn test_info_without_cache_needs_no_server() {
    let args = with_connection("http://127.0.0.1:1/", &["info"]);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run_cli(&args);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("http://127.0.0.1:1"));
    assert!(stdout.contains("disabled"));
}

#[test]
fn test_info_with_cache_reports_unwritten_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let cache_file = temp_dir.path().join("flags.json");
    let cache_file = cache_file.to_string_lossy().into_owned();
    let args = with_connection(
        "http://127.0.0.1:1",
        &["--cache", "--cache-file", &cache_file, "info"],
    );
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run_cli(&args);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&cache_file));
    assert!(stdout.contains("never"));
}

#[test]
fn test_unreachable_server_reports_network_error() {
    let server = closed_port_url();
    let args = with_connection(&server, &["--timeout", "2", "get", "flagA"]);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run_cli(&args);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Network error"), "stderr: {}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use flagcache::cli::{Cli, Command};

    #[test]
    fn test_environment_short_flag() {
        let cli = Cli::parse_from([
            "flagcache",
            "--server",
            "http://localhost:8080",
            "--api-key",
            "k",
            "-e",
            "staging",
            "enabled",
            "flagA",
        ]);
        assert_eq!(cli.environment, "staging");
        assert_eq!(
            cli.command,
            Command::Enabled {
                name: "flagA".to_string()
            }
        );
    }
}
