//! File-side collaborators of the store: importing documents into permanent
//! storage and handing stored documents to the system viewer.

use std::fmt;
use std::path::Path;

mod import;
mod reader;

pub use import::import_book;
pub use reader::{check_readable, open_book};

/// Document formats the library accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    Pdf,
    Epub,
}

impl BookFormat {
    /// Detect the format from the file extension, ignoring case.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(BookFormat::Pdf),
            "epub" => Some(BookFormat::Epub),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            BookFormat::Pdf => "application/pdf",
            BookFormat::Epub => "application/epub+zip",
        }
    }
}

impl fmt::Display for BookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookFormat::Pdf => write!(f, "PDF"),
            BookFormat::Epub => write!(f, "EPUB"),
        }
    }
}
