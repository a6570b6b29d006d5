//! File enumeration for upload.
//!
//! Walks the upload root (top-level only, or recursively) and produces the
//! list of regular files handed to the orchestrator.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::UploadError;

/// Lists the files under `root_path` for upload.
///
/// Symlinks to files are followed; symlinked directories are not descended
/// into. Paths are returned sorted, along with their total size in bytes.
pub fn scan_files_for_upload(
    root_path: &Path,
    recursive: bool,
) -> Result<(Vec<PathBuf>, u64), UploadError> {
    if !std::fs::metadata(root_path)?.is_dir() {
        return Err(UploadError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a directory", root_path.display()),
        )));
    }

    let mut files = Vec::new();
    let mut total_size: u64 = 0;

    walk_dir(root_path, recursive, &mut files, &mut total_size)?;
    files.sort();

    debug!(root = %root_path.display(), files = files.len(), total_size, "scan complete");
    Ok((files, total_size))
}

fn walk_dir(
    current: &Path,
    recursive: bool,
    files: &mut Vec<PathBuf>,
    total_size: &mut u64,
) -> Result<(), UploadError> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let is_link = entry.file_type()?.is_symlink();

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            // Dangling symlink.
            Err(_) if is_link => continue,
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            if recursive && !is_link {
                walk_dir(&path, recursive, files, total_size)?;
            }
        } else if metadata.is_file() {
            *total_size += metadata.len();
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::write(root.join("report.pdf"), b"PDF_CONTENT").unwrap();
        fs::write(root.join("readme.txt"), b"READ").unwrap();

        fs::create_dir_all(root.join("photos").join("2024")).unwrap();
        fs::write(root.join("photos").join("index.json"), b"{}").unwrap();
        fs::write(
            root.join("photos").join("2024").join("beach.jpg"),
            b"JPEG_DATA_HERE",
        )
        .unwrap();

        dir
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn recursive_scan_finds_all_files() {
        let dir = create_test_tree();
        let (files, total_size) = scan_files_for_upload(dir.path(), true).unwrap();

        assert_eq!(
            relative(dir.path(), &files),
            vec![
                "photos/2024/beach.jpg",
                "photos/index.json",
                "readme.txt",
                "report.pdf",
            ]
        );

        let expected_size =
            b"PDF_CONTENT".len() + b"READ".len() + b"{}".len() + b"JPEG_DATA_HERE".len();
        assert_eq!(total_size, expected_size as u64);
    }

    #[test]
    fn top_level_scan_skips_subdirectories() {
        let dir = create_test_tree();
        let (files, total_size) = scan_files_for_upload(dir.path(), false).unwrap();

        assert_eq!(relative(dir.path(), &files), vec!["readme.txt", "report.pdf"]);
        assert_eq!(total_size, (b"PDF_CONTENT".len() + b"READ".len()) as u64);
    }

    #[test]
    fn scan_empty_dir() {
        let dir = TempDir::new().unwrap();
        let (files, total_size) = scan_files_for_upload(dir.path(), true).unwrap();
        assert!(files.is_empty());
        assert_eq!(total_size, 0);
    }

    #[test]
    fn scan_nonexistent_dir() {
        let result = scan_files_for_upload(Path::new("/nonexistent/path/that/does/not/exist"), true);
        assert!(result.is_err());
    }

    #[test]
    fn scan_rejects_a_file_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("single.bin");
        fs::write(&file, b"x").unwrap();
        assert!(scan_files_for_upload(&file, false).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let dir = create_test_tree();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("elsewhere.txt"), b"E").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("readme.txt"),
            dir.path().join("readme-link.txt"),
        )
        .unwrap();

        let (files, _) = scan_files_for_upload(dir.path(), true).unwrap();
        let names = relative(dir.path(), &files);
        assert!(names.contains(&"readme-link.txt".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("linked")));
    }
}
