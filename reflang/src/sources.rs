// Source unit discovery and loading
// Every file is its own compilation unit; directories expand to their
// `.ref` files in name order.

use miette::{IntoDiagnostic, Result};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub const SOURCE_EXTENSION: &str = "ref";

/// Path argument meaning "read standard input"
pub const STDIN_PATH: &str = "-";

/// One loaded compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// `None` when read from stdin
    pub path: Option<PathBuf>,
    pub name: String,
    pub source: String,
}

impl SourceUnit {
    pub fn from_stdin() -> Result<Self> {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source).into_diagnostic()?;
        Ok(Self {
            path: None,
            name: "<stdin>".to_string(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).into_diagnostic()?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            name: path.display().to_string(),
            source,
        })
    }

    /// File name without extension; used for the output file and module name
    pub fn stem(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stdin".to_string())
    }

    /// Where the compiled module goes: `<dir>/<stem>.wasm`, defaulting to
    /// the source's own directory
    pub fn output_path(&self, output_dir: Option<&Path>) -> PathBuf {
        let file_name = format!("{}.wasm", self.stem());
        match (output_dir, self.path.as_deref().and_then(Path::parent)) {
            (Some(dir), _) => dir.join(file_name),
            (None, Some(parent)) => parent.join(file_name),
            (None, None) => PathBuf::from(file_name),
        }
    }
}

pub fn is_stdin(path: &Path) -> bool {
    path.to_str() == Some(STDIN_PATH)
}

/// Expand directory arguments into their source files.
///
/// Plain files are kept in argument order and must carry the `.ref`
/// extension; `-` passes through untouched.
pub fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut expanded = Vec::new();

    for path in paths {
        if is_stdin(path) {
            expanded.push(path.clone());
        } else if path.is_dir() {
            let mut files = Vec::new();
            for entry in fs::read_dir(path).into_diagnostic()? {
                let entry_path = entry.into_diagnostic()?.path();
                if entry_path.is_file() && has_source_extension(&entry_path) {
                    files.push(entry_path);
                }
            }
            files.sort();
            log::debug!("{} source file(s) in {}", files.len(), path.display());
            expanded.extend(files);
        } else if !path.exists() {
            return Err(miette::miette!("File not found: {}", path.display()));
        } else if !has_source_extension(path) {
            return Err(miette::miette!(
                "Expected .{} file, got: {}",
                SOURCE_EXTENSION,
                path.display()
            ));
        } else {
            expanded.push(path.clone());
        }
    }

    Ok(expanded)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(SOURCE_EXTENSION)
}

pub fn load(path: &Path) -> Result<SourceUnit> {
    if is_stdin(path) {
        SourceUnit::from_stdin()
    } else {
        SourceUnit::from_file(path)
    }
}
