use crate::sources::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

/// Fresh scratch directory per test
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "reflang-sources-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_directory_expands_to_sorted_sources() {
    let dir = scratch_dir("expand");
    fs::write(dir.join("b.ref"), "x := 1;").unwrap();
    fs::write(dir.join("a.ref"), "y := 2;").unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();
    fs::create_dir_all(dir.join("nested.ref")).unwrap();

    let expanded = expand_paths(&[dir.clone()]).unwrap();
    assert_eq!(expanded, vec![dir.join("a.ref"), dir.join("b.ref")]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_files_keep_argument_order() {
    let dir = scratch_dir("order");
    fs::write(dir.join("z.ref"), "").unwrap();
    fs::write(dir.join("m.ref"), "").unwrap();

    let paths = vec![dir.join("z.ref"), PathBuf::from("-"), dir.join("m.ref")];
    assert_eq!(expand_paths(&paths).unwrap(), paths);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_rejects_missing_and_foreign_files() {
    let dir = scratch_dir("reject");
    fs::write(dir.join("main.rs"), "").unwrap();

    let missing = expand_paths(&[dir.join("absent.ref")]).unwrap_err();
    assert!(missing.to_string().contains("File not found"));

    let foreign = expand_paths(&[dir.join("main.rs")]).unwrap_err();
    assert!(foreign.to_string().contains("Expected .ref file"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_load_reads_file_contents() {
    let dir = scratch_dir("load");
    let path = dir.join("prog.ref");
    fs::write(&path, "x: int = 1;").unwrap();

    let unit = load(&path).unwrap();
    assert_eq!(unit.source, "x: int = 1;");
    assert_eq!(unit.path.as_deref(), Some(path.as_path()));
    assert_eq!(unit.stem(), "prog");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_output_path() {
    let unit = SourceUnit {
        path: Some(PathBuf::from("src/demo/fib.ref")),
        name: "src/demo/fib.ref".to_string(),
        source: String::new(),
    };
    assert_eq!(unit.output_path(None), PathBuf::from("src/demo/fib.wasm"));
    assert_eq!(
        unit.output_path(Some(Path::new("build"))),
        PathBuf::from("build/fib.wasm")
    );

    let stdin = SourceUnit {
        path: None,
        name: "<stdin>".to_string(),
        source: String::new(),
    };
    assert_eq!(stdin.output_path(None), PathBuf::from("stdin.wasm"));
}
