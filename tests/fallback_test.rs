use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn inputs() -> (NamedTempFile, NamedTempFile) {
    let mut records = NamedTempFile::new().unwrap();
    write!(
        records,
        r#"[{{"referenceNumber": "CAL-1", "clientName": "Acme", "amount": 100}}]"#
    )
    .unwrap();

    let mut instructions = NamedTempFile::new().unwrap();
    writeln!(instructions, "reference,discount,value,amount").unwrap();
    writeln!(instructions, "CAL-1,N/A,,100").unwrap();

    (records, instructions)
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let (records, instructions) = inputs();

    let mut cmd = Command::new(cargo_bin!("calibill"));
    cmd.arg(records.path())
        .arg(instructions.path())
        .arg("--db-path")
        .arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory ledger."))
        .stdout(predicate::str::contains("CAL-1,Acme,100,100,0,0,paid"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let (records, instructions) = inputs();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("calibill"));
    cmd.arg(records.path())
        .arg(instructions.path())
        .arg("--db-path")
        .arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());
}
