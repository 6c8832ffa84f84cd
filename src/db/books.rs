use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::StoreResult;
use crate::models::{Book, NewBook, UNCATEGORIZED};

/// Column list shared by every book query. Legacy stores allowed NULL text
/// columns, so they are coalesced to empty strings on the way out.
pub(crate) const BOOK_COLUMNS: &str = "b.id, COALESCE(b.title, ''), COALESCE(b.author, ''),
     COALESCE(b.file_path, ''), b.category, COALESCE(b.favorite, 0)";

/// Hydrate a [`Book`] from a row selected with [`BOOK_COLUMNS`].
pub(crate) fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        file_path: row.get(3)?,
        category: row.get(4)?,
        favorite: row.get::<_, i64>(5)? != 0,
    })
}

/// Category value as written to the store. Blank input and the uncategorized
/// label both mean "no category".
fn stored_category(category: Option<&str>) -> Option<&str> {
    category
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(UNCATEGORIZED))
}

/// Insert a newly imported book. Favorites always start unset; the hydrated
/// struct comes back so callers can show it without re-querying.
pub fn add_book(conn: &Connection, book: &NewBook) -> StoreResult<Book> {
    let category = stored_category(book.category.as_deref());
    conn.execute(
        "INSERT INTO books (title, author, file_path, category, favorite)
         VALUES (?1, ?2, ?3, ?4, 0)",
        params![book.title, book.author, book.file_path, category],
    )?;

    let id = conn.last_insert_rowid();
    info!("added book {id} \"{}\"", book.title);
    Ok(Book {
        id,
        title: book.title.clone(),
        author: book.author.clone(),
        file_path: book.file_path.clone(),
        category: category.map(str::to_string),
        favorite: false,
    })
}

/// Every book in insertion order. All screen-level filtering starts from this
/// list.
pub fn fetch_books(conn: &Connection) -> StoreResult<Vec<Book>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books b ORDER BY b.id");
    let mut stmt = conn.prepare(&sql)?;
    let books = stmt
        .query_map([], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    debug!("loaded {} books", books.len());
    Ok(books)
}

pub fn fetch_book(conn: &Connection, id: i64) -> StoreResult<Option<Book>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = ?1");
    let book = conn.query_row(&sql, [id], book_from_row).optional()?;
    Ok(book)
}

/// Overwrite the editable fields of a book. `file_path` is deliberately not
/// part of the statement. Returns `false` when no book has this id.
pub fn update_book(
    conn: &Connection,
    id: i64,
    title: &str,
    author: &str,
    category: Option<&str>,
) -> StoreResult<bool> {
    let updated = conn.execute(
        "UPDATE books SET title = ?1, author = ?2, category = ?3 WHERE id = ?4",
        params![title, author, stored_category(category), id],
    )?;

    if updated == 0 {
        warn!("update skipped: book {id} does not exist");
        Ok(false)
    } else {
        info!("updated book {id}");
        Ok(true)
    }
}

/// Remove a book together with its folder memberships. Both deletes share one
/// transaction so no membership can outlive its book. Returns `false` when no
/// book has this id.
pub fn delete_book(conn: &mut Connection, id: i64) -> StoreResult<bool> {
    let tx = conn.transaction()?;
    let unlinked = tx.execute("DELETE FROM folder_books WHERE book_id = ?1", [id])?;
    let deleted = tx.execute("DELETE FROM books WHERE id = ?1", [id])?;
    tx.commit()?;

    if deleted == 0 {
        warn!("delete skipped: book {id} does not exist");
        Ok(false)
    } else {
        info!("deleted book {id} and {unlinked} folder memberships");
        Ok(true)
    }
}

/// Set the favorite flag. Writing the current value again leaves the row as it
/// was. Returns `false` when no book has this id.
pub fn set_favorite(conn: &Connection, id: i64, is_favorite: bool) -> StoreResult<bool> {
    let updated = conn.execute(
        "UPDATE books SET favorite = ?1 WHERE id = ?2",
        params![i64::from(is_favorite), id],
    )?;

    if updated == 0 {
        warn!("favorite update skipped: book {id} does not exist");
        Ok(false)
    } else {
        info!("book {id} favorite = {is_favorite}");
        Ok(true)
    }
}
