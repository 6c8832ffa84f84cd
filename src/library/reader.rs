use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::info;

use crate::models::Book;

use super::BookFormat;

/// Check that a stored book can be shown, returning its format.
pub fn check_readable(book: &Book) -> Result<BookFormat> {
    if book.file_path.trim().is_empty() {
        bail!("Invalid book file or path.");
    }
    let path = Path::new(&book.file_path);
    let format = BookFormat::from_path(path)
        .ok_or_else(|| anyhow!("Unsupported format. Please use EPUB or PDF files."))?;
    if !path.is_file() {
        bail!("File not found at stored location. Please re-import the book.");
    }
    Ok(format)
}

/// Hand a stored book to the system's default viewer.
pub fn open_book(book: &Book) -> Result<BookFormat> {
    let format = check_readable(book)?;
    open::that(&book.file_path)
        .with_context(|| format!("failed to open {}", book.display_title()))?;
    info!("opened book {} ({format}, {})", book.id, format.mime_type());
    Ok(format)
}
