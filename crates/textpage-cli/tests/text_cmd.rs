mod common;

use assert_cmd::Command;
use common::write_pdf;
use predicates::prelude::*;

#[test]
fn text_dumps_reading_order() {
    let pdf = write_pdf(
        "text-basic",
        "BT /F1 12 Tf 72 720 Td 14 TL (Hello world) Tj T* (second line) Tj ET",
    );
    Command::cargo_bin("textpage")
        .unwrap()
        .args(["text", pdf.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello world"))
        .stdout(predicate::str::contains("second line"));
}

#[test]
fn text_missing_file_fails() {
    Command::cargo_bin("textpage")
        .unwrap()
        .args(["text", "/no/such/file.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn text_rejects_bad_page_range() {
    let pdf = write_pdf("text-range", "BT /F1 12 Tf 72 720 Td (x) Tj ET");
    Command::cargo_bin("textpage")
        .unwrap()
        .args(["text", pdf.to_str().unwrap(), "--pages", "abc"])
        .assert()
        .failure();
}
