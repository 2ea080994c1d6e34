use std::fs;
use std::path::Path;

use qrbench::{canonicalize_or_current, infer_run_name, sha256_file};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_resolves_existing_relative_path() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let nested = canonicalize_or_current("nested").expect("canonicalize nested");
    let missing = canonicalize_or_current("not-yet").expect("join missing");
    let dot = canonicalize_or_current(".").expect("dot").canonicalize().expect("canon");

    std::env::set_current_dir(original).expect("restore cwd");

    assert_eq!(nested, subdir.canonicalize().expect("canonicalize subdir"));
    assert!(missing.ends_with("not-yet"));
    assert!(missing.is_absolute());
    assert_eq!(dot, tmp.path().canonicalize().expect("canon tmp"));
}

#[test]
fn infer_run_name_uses_file_stem() {
    assert_eq!(infer_run_name(Path::new("outputs/gemma-3-27b.jsonl")), "gemma-3-27b");
    assert_eq!(infer_run_name(Path::new("/tmp/samples.json")), "samples");
}

#[test]
fn infer_run_name_falls_back_when_missing() {
    assert_eq!(infer_run_name(Path::new("/")), "unnamed-run");
}

#[test]
fn sha256_file_hashes_contents() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("abc.txt");
    fs::write(&path, "abc").expect("write");
    assert_eq!(
        sha256_file(&path).expect("hash"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn sha256_file_errors_on_missing_file() {
    let tmp = tempdir().expect("tempdir");
    let err = sha256_file(&tmp.path().join("missing")).unwrap_err();
    assert!(err.to_string().contains("Failed to open file for hashing"));
}
