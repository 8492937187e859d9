use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A command with its config directory pointed at an empty temp dir.
fn expense(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("expense").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path());
    cmd
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_export_writes_one_artifact_per_document() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    expense(&home)
        .arg("export")
        .arg(fixture("two_documents.json"))
        .args(["--poll-interval-ms", "0", "-f", "json,csv"])
        .arg("-o")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-42_1.json"))
        .stdout(predicate::str::contains("Exported 2 documents"));

    let first = read_json(&out.path().join("INV-42_1.json"));
    assert_eq!(first["index"], 1);
    assert_eq!(first["invoiceId"], "INV-42");
    assert_eq!(first["date"], "01/03/2024");
    assert_eq!(first["total"], "$1,250.00");
    assert_eq!(
        first["tables"][0]["header"],
        serde_json::json!(["Description", "Qty"])
    );
    assert_eq!(
        first["tables"][0]["rows"],
        serde_json::json!([["Consulting", "10"], ["Travel", "1"]])
    );
    assert!(first.get("document").is_none());

    // No invoice id: the artifact is named by index alone
    let second = read_json(&out.path().join("2.json"));
    assert_eq!(second["invoiceId"], "");
    assert_eq!(second["date"], "15/04/2024");
    assert_eq!(second["tables"], serde_json::json!([]));

    let csv = fs::read_to_string(out.path().join("INV-42_1.csv")).unwrap();
    assert_eq!(
        csv,
        "INVOICE,DATE,TOTAL\nINV-42,01/03/2024,\"$1,250.00\"\nTable 1\nDescription,Qty\nConsulting,10\nTravel,1\n"
    );
    assert!(out.path().join("2.csv").exists());
    assert!(!out.path().join("INV-42_1.xlsx").exists());
}

#[test]
fn test_export_xlsx_and_summary() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    expense(&home)
        .arg("export")
        .arg(fixture("two_documents.json"))
        .args(["--poll-interval-ms", "0", "-f", "xlsx", "--summary"])
        .arg("-o")
        .arg(out.path())
        .assert()
        .success();

    assert!(out.path().join("INV-42_1.xlsx").exists());
    assert!(out.path().join("2.xlsx").exists());

    let summary = fs::read_to_string(out.path().join("summary.csv")).unwrap();
    assert_eq!(
        summary,
        "index,name,invoice_id,date,total,tables,rows\n\
         1,INV-42_1,INV-42,01/03/2024,\"$1,250.00\",1,2\n\
         2,2,,15/04/2024,,0,0\n"
    );
}

#[test]
fn test_export_raw_document() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    expense(&home)
        .arg("export")
        .arg(fixture("two_documents.json"))
        .args(["--poll-interval-ms", "0", "-f", "json", "--raw"])
        .arg("-o")
        .arg(out.path())
        .assert()
        .success();

    let first = read_json(&out.path().join("INV-42_1.json"));
    assert_eq!(first["document"]["ExpenseIndex"], 1);
    assert_eq!(
        first["document"]["SummaryFields"][1]["ValueDetection"]["Text"],
        "INV-42"
    );
}

#[test]
fn test_failed_job_reports_status_message() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    expense(&home)
        .arg("export")
        .arg(fixture("failed_job.json"))
        .args(["--poll-interval-ms", "0"])
        .arg("-o")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("quota exceeded"));

    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_stalled_job_times_out() {
    let home = TempDir::new().unwrap();

    expense(&home)
        .arg("fields")
        .arg(fixture("stalled_job.json"))
        .args(["--poll-interval-ms", "50", "--max-wait-secs", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not finish within"));
}

#[test]
fn test_missing_input() {
    let home = TempDir::new().unwrap();

    expense(&home)
        .args(["fields", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_fields_text_output() {
    let home = TempDir::new().unwrap();

    expense(&home)
        .arg("fields")
        .arg(fixture("two_documents.json"))
        .args(["--poll-interval-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Document 1 (INV-42_1)"))
        .stdout(predicate::str::contains("  INVOICE: INV-42"))
        .stdout(predicate::str::contains("  Table 1: 2 columns x 2 rows"))
        .stdout(predicate::str::contains("Document 2 (2)"))
        .stdout(predicate::str::contains("  DATE:    15/04/2024"));
}

#[test]
fn test_fields_inline_skips_polling() {
    let home = TempDir::new().unwrap();

    expense(&home)
        .arg("fields")
        .arg(fixture("two_documents.json"))
        .arg("--inline")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"invoiceId\": \"INV-42\""));
}

#[test]
fn test_label_fallback_from_config_file() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("custom.json");
    fs::write(
        &config_path,
        r#"{ "fields": { "date_label": "Issued On" } }"#,
    )
    .unwrap();

    // With the date label changed, the second document has no date left
    let output = expense(&home)
        .arg("--config")
        .arg(&config_path)
        .arg("fields")
        .arg(fixture("two_documents.json"))
        .args(["--poll-interval-ms", "0", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["date"], "01/03/2024");
    assert_eq!(records[1]["date"], "");
}

#[test]
fn test_config_init_get_set() {
    let home = TempDir::new().unwrap();

    expense(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));

    expense(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    expense(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    expense(&home)
        .args(["config", "set", "analysis.poll_interval_ms", "250"])
        .assert()
        .success();

    expense(&home)
        .args(["config", "get", "analysis.poll_interval_ms"])
        .assert()
        .success()
        .stdout("250\n");

    expense(&home)
        .args(["config", "set", "analysis.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_config_subcommand_honors_config_flag() {
    let home = TempDir::new().unwrap();
    let custom = home.path().join("custom.json");

    expense(&home)
        .arg("--config")
        .arg(&custom)
        .args(["config", "init"])
        .assert()
        .success();

    expense(&home)
        .arg("--config")
        .arg(&custom)
        .args(["config", "set", "fields.total_label", "Balance Due"])
        .assert()
        .success();

    let saved = read_json(&custom);
    assert_eq!(saved["fields"]["total_label"], "Balance Due");

    expense(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}
