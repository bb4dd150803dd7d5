//! CLI integration tests for nibble-cdf
//!
//! Tests the binary as a user would interact with it.

use assert_cmd::Command;
use predicates::prelude::*;

fn nibble_cdf() -> Command {
    Command::cargo_bin("nibble-cdf").unwrap()
}

// ============================================================================
// Basic Commands
// ============================================================================

#[test]
fn test_help() {
    nibble_cdf()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("nibble-packed CDFs"))
        .stdout(predicate::str::contains("bench"));
}

#[test]
fn test_version() {
    nibble_cdf()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nibble-cdf"));
}

#[test]
fn test_config_prints_sections() {
    nibble_cdf()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[benchmark]"))
        .stdout(predicate::str::contains("batch_len = 64"))
        .stdout(predicate::str::contains("[vector]"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validate() {
    nibble_cdf()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("7 cases agree"));
}

#[test]
fn test_validate_all_backends() {
    nibble_cdf()
        .args(["validate", "--all-backends"])
        .assert()
        .success()
        .stdout(predicate::str::contains("classifiers"));
}

#[test]
fn test_validate_narrow() {
    nibble_cdf()
        .args(["validate", "--width", "narrow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("narrow"));
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_classify_exact_match() {
    nibble_cdf()
        .args(["classify", "4", "0x76543210"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0x76543210: 5"))
        .stdout(predicate::str::contains("scalar"))
        .stdout(predicate::str::contains("portable"));
}

#[test]
fn test_classify_several_words() {
    nibble_cdf()
        .args(["classify", "4", "33333210", "0xfea76510"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0x33333210: 9"))
        .stdout(predicate::str::contains("0xfea76510: 3"));
}

#[test]
fn test_classify_zero_sample() {
    nibble_cdf()
        .args(["classify", "0", "0x55443322"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0x55443322: 0"));
}

#[test]
fn test_classify_bad_hex_fails() {
    nibble_cdf()
        .args(["classify", "4", "0xZZ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0xZZ"));
}

#[test]
fn test_classify_sample_out_of_range_fails() {
    nibble_cdf()
        .args(["classify", "16", "0x76543210"])
        .assert()
        .failure();
}

#[test]
fn test_classify_requires_cdf() {
    nibble_cdf().args(["classify", "4"]).assert().failure();
}

// ============================================================================
// Benchmark
// ============================================================================

#[test]
fn test_bench_reports_winner() {
    nibble_cdf()
        .args([
            "bench",
            "--iterations",
            "10",
            "--batch-len",
            "16",
            "--seed",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("scalar unbatched"))
        .stdout(predicate::str::contains("vectorized batched"))
        .stdout(predicate::str::contains("best is"));
}

#[test]
fn test_bench_narrow_width() {
    nibble_cdf()
        .args(["bench", "--iterations", "5", "--width", "narrow", "--seed", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("narrow"));
}

#[test]
fn test_bench_rejects_bad_batch_len() {
    nibble_cdf()
        .args(["bench", "--iterations", "5", "--batch-len", "12"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch_len"));
}

#[test]
fn test_missing_explicit_config_fails() {
    nibble_cdf()
        .args(["--config", "/nonexistent/nibble-cdf.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nibble-cdf.toml"));
}

#[test]
fn test_explicit_config_overrides_defaults() {
    let dir = std::env::temp_dir().join(format!("nibble-cdf-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("override.toml");
    std::fs::write(&path, "[benchmark]\niterations = 7\n\n[vector]\nwidth = \"narrow\"\n").unwrap();

    nibble_cdf()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("iterations = 7"))
        .stdout(predicate::str::contains("width = \"narrow\""));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_default_run_validates_then_benchmarks() {
    let dir = std::env::temp_dir().join(format!("nibble-cdf-default-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("quick.toml");
    std::fs::write(&path, "[benchmark]\niterations = 4\nseed = 3\n").unwrap();

    nibble_cdf()
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("best is"));

    std::fs::remove_dir_all(&dir).unwrap();
}
