mod common;

use assert_cmd::Command;
use common::write_pdf;
use predicates::prelude::*;

#[test]
fn search_reports_matches_with_rects() {
    let pdf = write_pdf(
        "search-basic",
        "BT /F1 12 Tf 72 720 Td (Hello world) Tj ET",
    );
    Command::cargo_bin("textpage")
        .unwrap()
        .args(["search", pdf.to_str().unwrap(), "lo wor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("page 1:"))
        .stdout(predicate::str::contains("1 match(es)"));
}

#[test]
fn search_no_match_reports_zero() {
    let pdf = write_pdf("search-none", "BT /F1 12 Tf 72 720 Td (Hello) Tj ET");
    Command::cargo_bin("textpage")
        .unwrap()
        .args(["search", pdf.to_str().unwrap(), "absent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 match(es)"));
}

#[test]
fn search_case_insensitive_by_default() {
    let pdf = write_pdf("search-case", "BT /F1 12 Tf 72 720 Td (Hello) Tj ET");
    Command::cargo_bin("textpage")
        .unwrap()
        .args(["search", pdf.to_str().unwrap(), "HELLO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 match(es)"));
    Command::cargo_bin("textpage")
        .unwrap()
        .args(["search", pdf.to_str().unwrap(), "HELLO", "--case-sensitive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 match(es)"));
}
