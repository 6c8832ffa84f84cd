//! Domain models that mirror the SQLite schema and get passed between the
//! store, the import/reader helpers, and the TUI. They stay plain data holders
//! so persistence and presentation logic live elsewhere.

use std::fmt;

/// Label shown wherever a book carries no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Author recorded for freshly imported files until the user edits it.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single imported e-book. `category` stores the category *name* rather than
/// its id, so category renames have to rewrite it on every matching row.
pub struct Book {
    /// Primary key assigned by SQLite.
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Location of the permanently stored copy. Written once on import.
    pub file_path: String,
    /// `None` means the book is uncategorized.
    pub category: Option<String>,
    pub favorite: bool,
}

impl Book {
    /// Category name for display, falling back to [`UNCATEGORIZED`].
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }

    /// Compose a `Title - Author` string that omits the hyphen when the author
    /// is blank.
    pub fn display_title(&self) -> String {
        if self.author.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.author)
        }
    }
}

/// Input for [`crate::db::add_book`]. Kept separate from [`Book`] because the
/// id and favorite flag are owned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub file_path: String,
    pub category: Option<String>,
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        file_path: impl Into<String>,
        category: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            file_path: file_path.into(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A user-defined category label. Names are unique across the store.
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A user-defined folder. Books join folders through membership rows keyed by
/// id, so renaming a folder never touches the books.
pub struct Folder {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One link row between a folder and a book.
pub struct FolderMembership {
    pub id: i64,
    pub folder_id: i64,
    pub book_id: i64,
}
