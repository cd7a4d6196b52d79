//! Thin adapter over the filesystem primitives the walker consumes.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::error::WalkError;

/// A filesystem entity yielded by listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    /// A symbolic link that was not followed (or could not be).
    Link,
}

/// Joins a directory and a child name without introducing a leading `./`.
pub(crate) fn join_dir(dir: &Path, name: &str) -> PathBuf {
    if dir == Path::new(".") {
        PathBuf::from(name)
    } else {
        dir.join(name)
    }
}

fn strip_dot(path: &Path) -> PathBuf {
    path.strip_prefix(".")
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn kind_of(file_type: fs::FileType) -> EntryKind {
    if file_type.is_symlink() {
        EntryKind::Link
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

/// Lists the direct children of `dir`.
pub(crate) fn list_dir_sync(dir: &Path, follow_links: bool) -> Result<Vec<Entry>, WalkError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let mut file_type = entry.file_type()?;
        if follow_links && file_type.is_symlink() {
            // resolve the target; a dangling link stays a link
            if let Ok(meta) = fs::metadata(entry.path()) {
                file_type = meta.file_type();
            }
        }
        entries.push(Entry {
            path: join_dir(dir, &entry.file_name().to_string_lossy()),
            kind: kind_of(file_type),
        });
    }
    Ok(entries)
}

/// Lists everything beneath `dir`, at any depth. `dir` itself is not yielded.
pub(crate) fn list_dir_recursive_sync(
    dir: &Path,
    follow_links: bool,
) -> Result<Vec<Entry>, WalkError> {
    let mut entries = Vec::new();
    for result in WalkDir::new(dir).min_depth(1).follow_links(follow_links) {
        match result {
            Ok(entry) => {
                let kind = if entry.path_is_symlink() && !follow_links {
                    EntryKind::Link
                } else if entry.file_type().is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                entries.push(Entry {
                    path: strip_dot(entry.path()),
                    kind,
                });
            }
            Err(err) => {
                // a broken link is still an entry, not a walk failure
                if let (Some(io_err), Some(path)) = (err.io_error(), err.path()) {
                    if io_err.kind() == io::ErrorKind::NotFound && path.is_symlink() {
                        entries.push(Entry {
                            path: strip_dot(path),
                            kind: EntryKind::Link,
                        });
                        continue;
                    }
                }
                return Err(err.into());
            }
        }
    }
    Ok(entries)
}

/// Async variant of [`list_dir_sync`].
pub(crate) async fn list_dir_async(
    dir: &Path,
    follow_links: bool,
) -> Result<Vec<Entry>, WalkError> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let mut file_type = entry.file_type().await?;
        if follow_links && file_type.is_symlink() {
            if let Ok(meta) = tokio::fs::metadata(entry.path()).await {
                file_type = meta.file_type();
            }
        }
        entries.push(Entry {
            path: join_dir(dir, &entry.file_name().to_string_lossy()),
            kind: kind_of(file_type),
        });
    }
    Ok(entries)
}
