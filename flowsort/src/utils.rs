//! # Utility module

use crate::frame::is_image_file;
use crate::prelude::v1::*;
use log::*;
use std::fs::ReadDir;
use std::path::{Path, PathBuf};

/// List top-level folders of the input directory, sorted by name.
///
/// Folders not selected by the configuration, and output folders (ending with the configured
/// suffix) are skipped.
pub fn top_level_folders(config: &Config) -> Result<Vec<PathBuf>> {
    let mut folders = vec![];

    for entry in std::fs::read_dir(&config.input_path)? {
        let path = entry?.path();

        if !path.is_dir() {
            continue;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };

        if name.ends_with(&config.output_suffix) || !config.includes_folder(name) {
            continue;
        }

        folders.push(path);
    }

    folders.sort();

    Ok(folders)
}

/// Find every directory under `root` (inclusive) that directly contains image files.
///
/// The result is sorted. Symbolic links to directories are not followed. Only failing to list
/// `root` itself is an error. Unreadable subdirectories and entries are logged and skipped.
pub fn frame_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = vec![];
    let mut to_visit = vec![];

    visit(root, std::fs::read_dir(root)?, &mut to_visit, &mut found);

    while let Some(dir) = to_visit.pop() {
        match std::fs::read_dir(&dir) {
            Ok(entries) => visit(&dir, entries, &mut to_visit, &mut found),
            Err(e) => warn!("Skipping directory {}: {}", dir.display(), e),
        }
    }

    found.sort();

    Ok(found)
}

/// Queue subdirectories of `dir`, and record `dir` if it directly contains image files.
fn visit(dir: &Path, entries: ReadDir, to_visit: &mut Vec<PathBuf>, found: &mut Vec<PathBuf>) {
    let mut has_frames = false;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping entry of {}: {}", dir.display(), e);
                continue;
            }
        };

        let path = entry.path();

        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => to_visit.push(path),
            Ok(file_type) if file_type.is_file() && is_image_file(&path) => has_frames = true,
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    if has_frames {
        found.push(dir.to_path_buf());
    }
}
