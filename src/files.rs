//! Image discovery and backups for batch tools.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::format::ImageKind;

/// Expand files and directories into the list of images to process.
///
/// Directories are walked recursively, following symlinks, in file-name
/// order; hidden entries below them are skipped. Files named explicitly are
/// kept when their extension maps to an [`ImageKind`]. A path reached twice
/// is listed once.
///
/// ```rust,no_run
/// use image_meta::files::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[PathBuf::from("photo.jpg"), PathBuf::from("./photos/")]);
/// println!("{} image(s)", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();
    let mut keep = |p: PathBuf| {
        if seen.insert(p.clone()) {
            images.push(p);
        }
    };

    for path in paths {
        if path.is_dir() {
            walk_dir(path).for_each(&mut keep);
        } else if !path.exists() {
            log::warn!("No such file or directory: {}", path.display());
        } else if ImageKind::from_path(path).is_some() {
            keep(path.clone());
        } else {
            log::warn!("Not a supported image, skipped: {}", path.display());
        }
    }

    images
}

fn walk_dir(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("Cannot read directory entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && ImageKind::from_path(e.path()).is_some())
        .map(DirEntry::into_path)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Copy `path` to `<name>.<ext>.bak` next to it. An existing backup is left
/// alone so it always holds the first original.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let mut name = path
        .file_name()
        .with_context(|| format!("Not a file path: {}", path.display()))?
        .to_os_string();
    name.push(".bak");
    let backup = path.with_file_name(name);

    if backup.exists() {
        log::debug!("Backup already present: {}", backup.display());
    } else {
        std::fs::copy(path, &backup)
            .with_context(|| format!("Failed to back up {}", path.display()))?;
        log::debug!("Backup created: {}", backup.display());
    }
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(images: &[PathBuf]) -> Vec<String> {
        images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn explicit_files_are_filtered_by_extension() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("shot.JPG");
        let pdf = dir.path().join("scan.pdf");
        fs::write(&jpg, b"x").unwrap();
        fs::write(&pdf, b"x").unwrap();

        assert_eq!(collect_images(&[jpg.clone(), pdf]), vec![jpg]);
    }

    #[test]
    fn directories_are_walked_in_name_order() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("2024");
        fs::create_dir(&nested).unwrap();
        for name in ["b.webp", "a.jpeg", "notes.md"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::write(nested.join("c.tiff"), b"x").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]);
        assert_eq!(names(&images), ["c.tiff", "a.jpeg", "b.webp"]);
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join(".thumbs");
        fs::create_dir(&cache).unwrap();
        fs::write(cache.join("t.jpg"), b"x").unwrap();
        fs::write(dir.path().join(".hidden.png"), b"x").unwrap();
        fs::write(dir.path().join("visible.png"), b"x").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]);
        assert_eq!(names(&images), ["visible.png"]);
    }

    #[test]
    fn overlapping_inputs_are_listed_once() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("a.jpg");
        fs::write(&jpg, b"x").unwrap();

        let images = collect_images(&[dir.path().to_path_buf(), jpg.clone(), jpg]);
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn missing_paths_yield_nothing() {
        assert!(collect_images(&[PathBuf::from("/definitely/not/here")]).is_empty());
    }

    #[test]
    fn backup_holds_the_first_original() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("photo.jpg");
        fs::write(&jpg, b"v1").unwrap();

        let backup = backup_file(&jpg).unwrap();
        assert_eq!(backup, dir.path().join("photo.jpg.bak"));

        fs::write(&jpg, b"v2").unwrap();
        assert_eq!(backup_file(&jpg).unwrap(), backup);
        assert_eq!(fs::read(&backup).unwrap(), b"v1");
    }

    #[test]
    fn backup_of_extensionless_file() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("IMG_0001");
        fs::write(&raw, b"x").unwrap();
        assert_eq!(backup_file(&raw).unwrap(), dir.path().join("IMG_0001.bak"));
    }
}
