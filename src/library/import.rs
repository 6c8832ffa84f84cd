use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};

use crate::db::LibraryStore;
use crate::models::{Book, NewBook, UNKNOWN_AUTHOR};

use super::BookFormat;

/// Copy `source` into `books_dir` and register it in the store. The title is
/// the file stem and the author starts as [`UNKNOWN_AUTHOR`]. When the insert
/// fails the copied file is removed again so storage and store agree.
pub fn import_book(
    store: &LibraryStore,
    books_dir: &Path,
    source: &Path,
    category: Option<String>,
) -> Result<Book> {
    let format = BookFormat::from_path(source).ok_or_else(|| {
        anyhow!("Unsupported format. Please use EPUB or PDF files.")
    })?;
    if !source.is_file() {
        bail!("File not found: {}", source.display());
    }

    let title = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| anyhow!("Cannot derive a title from {}", source.display()))?
        .to_string();

    fs::create_dir_all(books_dir).context("failed to create books directory")?;
    let target = unique_target(books_dir, source)?;
    fs::copy(source, &target)
        .with_context(|| format!("failed to copy {} into the library", source.display()))?;
    let stored = fs::canonicalize(&target).unwrap_or_else(|_| target.clone());

    let new_book = NewBook::new(
        title,
        UNKNOWN_AUTHOR,
        stored.to_string_lossy(),
        category,
    );
    match store.add_book(&new_book) {
        Ok(book) => {
            info!("imported {format} {} as book {}", source.display(), book.id);
            Ok(book)
        }
        Err(err) => {
            if let Err(cleanup) = fs::remove_file(&target) {
                warn!("could not remove {} after failed import: {cleanup}", target.display());
            }
            Err(err).context("Book not added")
        }
    }
}

/// Pick a file name inside `dir` that does not collide with an existing copy,
/// appending ` (2)`, ` (3)`, ... before the extension.
fn unique_target(dir: &Path, source: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| anyhow!("{} has no file name", source.display()))?;
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return Ok(candidate);
    }

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    (2..)
        .map(|n| dir.join(format!("{stem} ({n}).{ext}")))
        .find(|path| !path.exists())
        .ok_or_else(|| anyhow!("no free file name for {}", source.display()))
}
