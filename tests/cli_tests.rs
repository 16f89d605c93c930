use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn report_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ledger-report"));
    // Keep the developer's environment and .env files out of the way
    cmd.current_dir(dir.path())
        .env_remove("PG_HOST")
        .env_remove("PG_PORT")
        .env_remove("PG_DB")
        .env_remove("PG_USER")
        .env_remove("PG_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Points the store at a local port nothing listens on.
fn unreachable_store(cmd: &mut Command) -> &mut Command {
    cmd.env("PG_HOST", "127.0.0.1")
        .env("PG_PORT", "1")
        .env("PG_PASSWORD", "not-used")
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sales ledger search"));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ledger-report"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");

    report_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized ledger-report config"));

    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("output").is_dir());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");

    report_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    report_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_search_without_secret_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");

    report_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "search", "Widget A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("PG_PASSWORD"));
}

#[test]
fn test_check_without_secret_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");

    report_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PG_PASSWORD"));
}

#[test]
fn test_invalid_port_override() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");

    report_cmd(&temp_dir)
        .env("PG_PORT", "abc")
        .env("PG_PASSWORD", "x")
        .args(["-C", config_path.to_str().unwrap(), "search", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value 'abc' for PG_PORT"));
}

#[test]
fn test_years_out_of_range() {
    let temp_dir = TempDir::new().unwrap();

    report_cmd(&temp_dir)
        .args(["search", "x", "--years", "0"])
        .assert()
        .failure();

    report_cmd(&temp_dir)
        .args(["export", "x", "--years", "16"])
        .assert()
        .failure();
}

#[test]
fn test_export_rejects_unknown_column() {
    let temp_dir = TempDir::new().unwrap();

    report_cmd(&temp_dir)
        .args(["export", "x", "--columns", "date,price"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown column 'price'"))
        .stderr(predicate::str::contains("unit-price"));
}

#[test]
fn test_unreachable_store_shows_no_results() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");

    unreachable_store(&mut report_cmd(&temp_dir))
        .args(["-C", config_path.to_str().unwrap(), "search", "Widget A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No se encontraron resultados"))
        .stderr(predicate::str::contains("report fetch failed"));
}

#[test]
fn test_check_reports_unreachable_store() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");

    unreachable_store(&mut report_cmd(&temp_dir))
        .args(["-C", config_path.to_str().unwrap(), "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ledger store"));
}

#[test]
fn test_export_writes_workbook_even_without_results() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");
    let output = temp_dir.path().join("out").join("report.xlsx");

    unreachable_store(&mut report_cmd(&temp_dir))
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "export",
            "Widget A",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 0 row(s)"))
        .stdout(predicate::str::contains("S/ 0.00"))
        .stdout(predicate::str::contains("spreadsheetml.sheet"));

    let bytes = fs::read(&output).unwrap();
    // xlsx documents are zip archives
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_export_default_file_name() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");

    report_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    unreachable_store(&mut report_cmd(&temp_dir))
        .args(["-C", config_path.to_str().unwrap(), "export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("expera_report_"));

    let exported: Vec<_> = fs::read_dir(config_path.join("output"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(exported.len(), 1);
    assert!(exported[0].starts_with("expera_report_"));
    assert!(exported[0].ends_with(".xlsx"));
}

#[test]
fn test_search_export_skips_empty_results() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");

    report_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    unreachable_store(&mut report_cmd(&temp_dir))
        .args(["-C", config_path.to_str().unwrap(), "search", "Widget A", "--export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No se encontraron resultados"))
        .stdout(predicate::str::contains("Exported").not());

    let exported = fs::read_dir(config_path.join("output")).unwrap().count();
    assert_eq!(exported, 0);
}

#[test]
fn test_malformed_env_file_is_reported_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("report-config");
    fs::write(temp_dir.path().join(".env"), "PG_HOST='unterminated\n").unwrap();

    report_cmd(&temp_dir)
        .args(["-C", config_path.to_str().unwrap(), "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ignoring unreadable .env file"))
        .stderr(predicate::str::contains("PG_PASSWORD"));
}
