use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("boxoffice"));
    cmd.arg("tests/fixtures/test.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("booking,show,user,seats,transaction"))
        // alice booked 1;2, bob booked 5;6
        .stdout(predicate::str::contains("s1,alice,1;2,pi_"))
        .stdout(predicate::str::contains("s1,bob,5;6,pi_"));

    Ok(())
}

#[test]
fn test_cli_user_filter() {
    let script = common::script_file(&[
        "show,,s1,,,10,120.0",
        "reserve,r1,s1,alice,1;2,,",
        "reserve,r2,s1,bob,5,,",
        "pay,r1,,,,,",
        "pay,r2,,,,,",
        "reconcile,r1,,,,,",
        "reconcile,r2,,,,,",
    ]);

    let mut cmd = Command::new(cargo_bin!("boxoffice"));
    cmd.arg(script.path()).arg("--user").arg("bob");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("s1,bob,5,pi_"))
        .stdout(predicate::str::contains("alice").not());
}

#[test]
fn test_cli_unpaid_session_produces_no_booking() {
    let script = common::script_file(&[
        "show,,s1,,,10,120.0",
        "reserve,r1,s1,alice,1;2,,",
        "reconcile,r1,,,,,",
    ]);

    let mut cmd = Command::new(cargo_bin!("boxoffice"));
    cmd.arg(script.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("payment not completed"))
        .stdout(predicate::str::contains("alice").not());
}

#[test]
fn test_cli_failed_session_produces_no_booking() {
    let script = common::script_file(&[
        "show,,s1,,,10,120.0",
        "reserve,r1,s1,alice,1;2,,",
        "fail,r1,,,,,",
        "reconcile,r1,,,,,",
    ]);

    let mut cmd = Command::new(cargo_bin!("boxoffice"));
    cmd.arg(script.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("payment not completed"))
        .stdout(predicate::str::contains("alice").not());
}
