//! Input file discovery

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CliError, Result};

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ext.eq_ignore_ascii_case("yaml")
                || ext.eq_ignore_ascii_case("yml")
                || ext.eq_ignore_ascii_case("json")
        })
}

pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Expand the positional arguments into the list of manifest files:
/// directories are walked recursively, non-manifest files inside them are
/// skipped with a note, explicitly named files are always taken.
pub fn find_files(args: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for arg in args {
        let metadata = std::fs::metadata(arg)
            .map_err(|e| CliError::argument(format!("{}: {e}", arg.display())))?;

        if !metadata.is_dir() {
            files.push(arg.clone());
            continue;
        }

        for entry in WalkDir::new(arg).sort_by_file_name() {
            let entry =
                entry.map_err(|e| CliError::argument(format!("{}: {e}", arg.display())))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if is_manifest(entry.path()) {
                files.push(entry.path().to_path_buf());
            } else {
                eprintln!("skipping {} since it is not json or yaml", entry.path().display());
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_files_walks_directories() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("a.yaml"), "").unwrap();
        std::fs::write(tmp.path().join("nested/b.json"), "").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "").unwrap();

        let files = find_files(&[tmp.path().to_path_buf()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(files.len(), 2);
        assert!(names.contains(&"a.yaml".to_string()));
        assert!(names.contains(&"b.json".to_string()));
    }

    #[test]
    fn test_explicit_files_taken_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("manifest.yaml");
        std::fs::write(&path, "").unwrap();

        let files = find_files(&[path.clone()]).unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn test_missing_path_is_argument_error() {
        let err = find_files(&[PathBuf::from("/does/not/exist.yaml")]).unwrap_err();
        assert!(matches!(err, CliError::Argument { .. }));
    }

    #[test]
    fn test_is_yaml() {
        assert!(is_yaml(Path::new("x.yaml")));
        assert!(is_yaml(Path::new("x.YML")));
        assert!(!is_yaml(Path::new("x.json")));
    }
}
