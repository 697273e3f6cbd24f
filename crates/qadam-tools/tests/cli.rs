//! Bout-en-bout : qadam-compile puis qadam-decompile sur des fichiers réels.

use std::fs;
use std::process::Command;

use pretty_assertions::assert_eq;

const SOURCE: &str = "\
; démo
SECTION 0
[01 02 03 04 05] \"Dobrý den!\"
SECTION 1
[FF]
";

#[test]
fn compile_then_decompile() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("TEXTS.txt");
    fs::write(&src, SOURCE).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_qadam-compile"))
        .arg(&src)
        .arg("--verify")
        .status()
        .unwrap();
    assert!(status.success());

    let fil = tmp.path().join("TEXTS.fil");
    let bytes = fs::read(&fil).unwrap();
    assert_eq!(bytes[0], 2);
    assert_eq!(&bytes[10..15], &[1, 2, 3, 4, 5]);

    let out = Command::new(env!("CARGO_BIN_EXE_qadam-decompile"))
        .arg(&fil)
        .args(["--verify", "--color", "never"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "SECTION 0\n[01 02 03 04 05] \"Dobrý den!\"\nSECTION 1\n[FF]\n\n"
    );
}

#[test]
fn json_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("A.txt");
    fs::write(&src, SOURCE).unwrap();
    let fil = tmp.path().join("A.FIL");

    let status = Command::new(env!("CARGO_BIN_EXE_qadam-compile")).arg(&src).arg("-o").arg(&fil).status().unwrap();
    assert!(status.success());

    let out = Command::new(env!("CARGO_BIN_EXE_qadam-decompile")).arg(&fil).arg("--json").output().unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["directory_size"], 10);
    assert_eq!(json["sections"].as_array().unwrap().len(), 2);
    assert_eq!(json["sections"][1]["len"], 1);
}

#[test]
fn errors_exit_non_zero_and_write_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("BAD.txt");
    fs::write(&src, "SECTION 0\nSECTION 2\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_qadam-compile")).arg(&src).output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("line 2"));
    assert!(!tmp.path().join("BAD.fil").exists());

    let bad = tmp.path().join("BAD.FIL");
    fs::write(&bad, [1, 7, 0, 0, 9, 0, 0]).unwrap();
    let listing = tmp.path().join("BAD.lst");
    let out = Command::new(env!("CARGO_BIN_EXE_qadam-decompile")).arg(&bad).arg("--emit").arg(&listing).output().unwrap();
    assert!(!out.status.success());
    assert!(!listing.exists());
}

#[test]
fn failed_verify_leaves_no_listing() {
    let tmp = tempfile::tempdir().unwrap();
    // aucune section : le listing ne se recompile pas
    let fil = tmp.path().join("EMPTY.FIL");
    fs::write(&fil, [0, 6, 0, 0, 1, 2]).unwrap();
    let listing = tmp.path().join("EMPTY.txt");

    let out = Command::new(env!("CARGO_BIN_EXE_qadam-decompile"))
        .arg(&fil)
        .arg("--verify")
        .arg("--emit")
        .arg(&listing)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("EMPTY.FIL"));
    assert!(!listing.exists());

    let status = Command::new(env!("CARGO_BIN_EXE_qadam-decompile")).arg(&fil).arg("--emit").arg(&listing).status().unwrap();
    assert!(status.success());
    assert_eq!(fs::read_to_string(&listing).unwrap(), "[01 02]\n\n");
}
