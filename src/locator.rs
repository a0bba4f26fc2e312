use crate::errors::PipelineError;
use glob::{MatchOptions, Pattern};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Lists the regular files in `dir` whose names match `pattern` (e.g. `E*.csv`).
///
/// Subdirectories are not searched. An unreadable or missing directory, a bad
/// pattern, or an entry that fails during enumeration aborts the listing.
pub fn locate_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let metadata = fs::metadata(dir).map_err(|e| PipelineError::Directory {
        path: dir.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Err(PipelineError::Directory {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }
    // Surface permission problems here rather than as an empty match list.
    fs::read_dir(dir).map_err(|e| PipelineError::Directory {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let full_pattern = format!(
        "{}/{}",
        Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let entries = glob::glob_with(&full_pattern, options).map_err(|e| PipelineError::Pattern {
        pattern: pattern.to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::Directory {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        if path.is_file() {
            files.push(path);
        } else {
            debug!("Skipping non-file match {}", path.display());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_matches_pattern_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["E20210201.csv", "E20210202.csv", "D20210201.csv", "E20210203.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("E-archive.csv")).unwrap();

        let files = locate_files(dir.path(), "E*.csv").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["E20210201.csv", "E20210202.csv"]);

        assert_eq!(locate_files(dir.path(), "*.csv").unwrap().len(), 3);
    }

    #[test]
    fn test_wildcard_matches_dot_prefixed_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [".E20210201.csv", "E20210201.csv"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let files = locate_files(dir.path(), "*.csv").unwrap();
        assert_eq!(
            files,
            vec![dir.path().join(".E20210201.csv"), dir.path().join("E20210201.csv")]
        );
        assert_eq!(locate_files(dir.path(), "E*.csv").unwrap().len(), 1);
    }

    #[test]
    fn test_directory_with_glob_characters_is_literal() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("export [2021]");
        fs::create_dir(&dir).unwrap();
        File::create(dir.join("E1.csv")).unwrap();
        assert_eq!(locate_files(&dir, "E*.csv").unwrap(), vec![dir.join("E1.csv")]);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");
        assert!(matches!(
            locate_files(&missing, "E*.csv"),
            Err(PipelineError::Directory { .. })
        ));
    }

    #[test]
    fn test_file_instead_of_directory_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("E1.csv");
        File::create(&file).unwrap();
        assert!(matches!(
            locate_files(&file, "E*.csv"),
            Err(PipelineError::Directory { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            locate_files(root.path(), "E[*.csv"),
            Err(PipelineError::Pattern { .. })
        ));
    }
}
