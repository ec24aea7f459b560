use std::fs;
use std::path::{Path, PathBuf};

use crate::gallery::domain::reference_entry::ReferenceEntry;
use crate::shared::constants::IMAGE_EXTENSIONS;

/// Collects reference entries from a directory laid out as
/// `<dir>/<person name>/<image files>`.
///
/// People are ordered by directory name and images by file name, so the
/// resulting gallery is stable across runs. Loose files at the top level and
/// non-image files are ignored.
pub fn load_reference_dir(dir: &Path) -> Result<Vec<ReferenceEntry>, std::io::Error> {
    let mut people: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            log::warn!("Skipping non-UTF-8 directory {}", entry.path().display());
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        people.push((name, entry.path()));
    }
    people.sort();

    let mut entries = Vec::new();
    for (name, person_dir) in people {
        let images = image_files(&person_dir)?;
        if images.is_empty() {
            log::warn!("No reference images for '{name}' in {}", person_dir.display());
        }
        entries.extend(
            images
                .into_iter()
                .map(|path| ReferenceEntry::from_image(name.clone(), path)),
        );
    }
    Ok(entries)
}

fn image_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    files.sort();
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_subdirectories_become_identities() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("bob/2.png"));
        touch(&root.join("bob/1.JPG"));
        touch(&root.join("bob/notes.txt"));
        touch(&root.join("ada/front.jpeg"));
        touch(&root.join("stray.jpg"));

        let entries = load_reference_dir(root).unwrap();
        let pairs: Vec<(&str, PathBuf)> = entries
            .iter()
            .map(|e| (e.name.as_str(), e.image_path.clone().unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("ada", root.join("ada/front.jpeg")),
                ("bob", root.join("bob/1.JPG")),
                ("bob", root.join("bob/2.png")),
            ]
        );
        assert!(entries.iter().all(|e| e.embedding.is_none()));
    }

    #[test]
    fn test_hidden_and_empty_directories_yield_nothing() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join(".cache/a.jpg"));
        fs::create_dir_all(tmp.path().join("empty")).unwrap();
        assert!(load_reference_dir(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_error() {
        assert!(load_reference_dir(Path::new("/nonexistent/refs")).is_err());
    }
}
