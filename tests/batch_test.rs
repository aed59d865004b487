use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

mod common;

#[test]
fn test_large_batch_settles_every_transaction() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    let instructions = dir.path().join("payments.csv");
    common::generate_snapshot(&snapshot, 500).expect("Failed to generate snapshot");
    common::generate_instructions(&instructions, 500).expect("Failed to generate CSV");

    let output = Command::new(cargo_bin!("calibill"))
        .arg(&snapshot)
        .arg(&instructions)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Binary failed to process batch");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut reader = csv::Reader::from_reader(stdout.as_bytes());
    let mut rows = 0;
    for result in reader.records() {
        let record = result.unwrap();
        assert_eq!(&record[5], "0", "{} left a balance", &record[0]);
        assert_eq!(&record[6], "paid");
        rows += 1;
    }
    assert_eq!(rows, 500);
}
