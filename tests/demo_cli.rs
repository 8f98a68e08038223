//! Runs the demo binary end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn demo() -> Command {
    let mut cmd = Command::cargo_bin("didwallet-demo").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_demo_on_disk() {
    let temp = tempdir().unwrap();

    demo()
        .arg("--storage-root")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("----- Start personA / personB demo -----"))
        .stdout(predicate::str::contains(
            "decrypted:  \"personA -> personB\" (sender verified)",
        ))
        .stdout(predicate::str::contains(
            "decrypted:  \"personB -> personA\" (sender verified)",
        ))
        .stdout(predicate::str::contains("17 steps: 17 succeeded, 0 failed"));

    // Teardown removed both wallets
    assert!(!temp.path().join("wallet").join("personAWallet").exists());
    assert!(!temp.path().join("wallet").join("personBWallet").exists());
}

#[test]
fn test_demo_in_memory() {
    let temp = tempdir().unwrap();

    demo()
        .args(["--in-memory", "--thread-pool-size", "4", "--storage-root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("crypto_thread_pool_size=4"))
        .stdout(predicate::str::contains("[fail]").not());

    assert!(!temp.path().join("wallet").exists());
}

#[test]
fn test_keep_wallets_then_rerun() {
    let temp = tempdir().unwrap();

    demo()
        .arg("--keep-wallets")
        .arg("--storage-root")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("keeping wallets"));
    assert!(temp
        .path()
        .join("wallet")
        .join("personAWallet")
        .join("wallet.redb")
        .exists());

    // The second run tolerates the existing wallets and cleans up
    demo()
        .arg("--storage-root")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[warn] personA create-wallet"))
        .stdout(predicate::str::contains("(already-exists)"));
    assert!(!temp.path().join("wallet").join("personAWallet").exists());
}

#[test]
fn test_jsonl_log_dir() {
    let temp = tempdir().unwrap();
    let logs = temp.path().join("logs");

    demo()
        .args(["--in-memory", "--storage-root"])
        .arg(temp.path())
        .arg("--log-dir")
        .arg(&logs)
        .arg("-v")
        .assert()
        .success();

    let entries = didwallet_core::logging::read_all_entries(&logs).unwrap();
    assert!(entries.iter().any(|e| e.msg == "Opened wallet"));
    assert!(entries.iter().any(|e| e.msg == "Scenario finished"));
}

#[test]
fn test_rejects_zero_pool_size() {
    let temp = tempdir().unwrap();

    demo()
        .args(["--thread-pool-size", "0", "--storage-root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("crypto_thread_pool_size must be at least 1"));
}
