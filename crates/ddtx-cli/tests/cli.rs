//! End-to-end tests for the ddtx binary.

use assert_cmd::Command;
use predicates::prelude::*;

const DELIVERY_NOTE: &str = "\
4681 21/05/25 1 5712
DONAC S.R.L.
Luogo di consegna
VIA BERTOLE', 13/15  VIA MEANA, SNC
12042 BRA CN 10088 VOLPIANO TO
P.IVA 00622580041
Codice Descrizione UM Quantità Prezzo Importo IVA
060111 GRISSINI STIRATI 250 G PZ 120 1,9000 228,00 10
TOTALE DOCUMENTO 250,80
";

fn write_sample(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("DDV_4681_21-05-25.txt");
    std::fs::write(&path, DELIVERY_NOTE).unwrap();
    path
}

#[test]
fn process_emits_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(&dir);

    Command::cargo_bin("ddtx")
        .unwrap()
        .args(["process", "--reference-date", "2025-06-15"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"document_number\": \"4681\""))
        .stdout(predicate::str::contains("\"delivery_note\""))
        .stdout(predicate::str::contains("VIA MEANA, SNC"));
}

#[test]
fn process_text_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(&dir);

    Command::cargo_bin("ddtx")
        .unwrap()
        .args(["process", "--format", "text", "--reference-date", "2025-06-15"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("DONAC S.R.L."))
        .stdout(predicate::str::contains("Total:    250,80"));
}

#[test]
fn process_missing_file_fails() {
    Command::cargo_bin("ddtx")
        .unwrap()
        .args(["process", "no-such-file.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(&dir);
    let out = dir.path().join("out");

    let pattern = dir.path().join("*.txt");
    Command::cargo_bin("ddtx")
        .unwrap()
        .args(["batch", "--summary", "--reference-date", "2025-06-15"])
        .arg(pattern.to_str().unwrap())
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("DDV_4681_21-05-25.json").exists());
    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.contains("4681"));
}
