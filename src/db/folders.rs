use log::{debug, info};
use rusqlite::{params, Connection};

use crate::db::books::{book_from_row, BOOK_COLUMNS};
use crate::error::{map_unique_constraint, normalize_name, StoreError, StoreResult};
use crate::models::{Book, Folder, FolderMembership};

const ENTITY: &str = "Folder";

/// All folders in creation order.
pub fn fetch_folders(conn: &Connection) -> StoreResult<Vec<Folder>> {
    let mut stmt = conn.prepare("SELECT id, name FROM folders ORDER BY id")?;

    let folders = stmt
        .query_map([], |row| {
            Ok(Folder {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(folders)
}

pub fn add_folder(conn: &Connection, name: &str) -> StoreResult<Folder> {
    let name = normalize_name(name, ENTITY)?;
    conn.execute("INSERT INTO folders (name) VALUES (?1)", params![name])
        .map_err(|err| map_unique_constraint(err, ENTITY, &name))?;

    let id = conn.last_insert_rowid();
    info!("added folder {id} \"{name}\"");
    Ok(Folder { id, name })
}

/// Rename a folder. Memberships reference the id, so nothing else changes.
pub fn update_folder(conn: &Connection, id: i64, new_name: &str) -> StoreResult<()> {
    let new_name = normalize_name(new_name, ENTITY)?;
    let updated = conn
        .execute(
            "UPDATE folders SET name = ?1 WHERE id = ?2",
            params![new_name, id],
        )
        .map_err(|err| map_unique_constraint(err, ENTITY, &new_name))?;

    if updated == 0 {
        Err(StoreError::NotFound { entity: ENTITY, id })
    } else {
        info!("renamed folder {id} to \"{new_name}\"");
        Ok(())
    }
}

/// Delete a folder's memberships and then the folder itself, in one
/// transaction. The books stay in the library.
pub fn delete_folder(conn: &mut Connection, id: i64) -> StoreResult<()> {
    let tx = conn.transaction()?;
    let unlinked = tx.execute("DELETE FROM folder_books WHERE folder_id = ?1", [id])?;
    let deleted = tx.execute("DELETE FROM folders WHERE id = ?1", [id])?;

    if deleted == 0 {
        // Dropping the transaction rolls back the membership delete.
        return Err(StoreError::NotFound { entity: ENTITY, id });
    }

    tx.commit()?;
    info!("deleted folder {id} and {unlinked} memberships");
    Ok(())
}

fn exists(conn: &Connection, table: &str, id: i64) -> StoreResult<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)");
    Ok(conn.query_row(&sql, [id], |row| row.get(0))?)
}

/// Link a book to a folder. `INSERT OR IGNORE` against the unique
/// (folder_id, book_id) index makes repeated adds harmless; the return value
/// says whether a new link was created.
pub fn add_book_to_folder(conn: &Connection, folder_id: i64, book_id: i64) -> StoreResult<bool> {
    if !exists(conn, "folders", folder_id)? {
        return Err(StoreError::NotFound {
            entity: ENTITY,
            id: folder_id,
        });
    }
    if !exists(conn, "books", book_id)? {
        return Err(StoreError::NotFound {
            entity: "Book",
            id: book_id,
        });
    }

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO folder_books (folder_id, book_id) VALUES (?1, ?2)",
        params![folder_id, book_id],
    )?;

    if inserted > 0 {
        info!("linked book {book_id} to folder {folder_id}");
    } else {
        debug!("book {book_id} already in folder {folder_id}");
    }
    Ok(inserted > 0)
}

/// Remove one membership. Returns `false` when the link did not exist.
pub fn remove_book_from_folder(
    conn: &Connection,
    folder_id: i64,
    book_id: i64,
) -> StoreResult<bool> {
    let deleted = conn.execute(
        "DELETE FROM folder_books WHERE folder_id = ?1 AND book_id = ?2",
        params![folder_id, book_id],
    )?;
    if deleted > 0 {
        info!("unlinked book {book_id} from folder {folder_id}");
    }
    Ok(deleted > 0)
}

/// Books in a folder, in the order they were added. An unknown folder simply
/// has no books.
pub fn fetch_books_for_folder(conn: &Connection, folder_id: i64) -> StoreResult<Vec<Book>> {
    let sql = format!(
        "SELECT {BOOK_COLUMNS}
         FROM books b
         INNER JOIN folder_books fb ON fb.book_id = b.id
         WHERE fb.folder_id = ?1
         ORDER BY fb.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let books = stmt
        .query_map([folder_id], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(books)
}

/// Books not yet linked to `folder_id`, so the picker only offers eligible
/// entries.
pub fn fetch_books_outside_folder(conn: &Connection, folder_id: i64) -> StoreResult<Vec<Book>> {
    let sql = format!(
        "SELECT {BOOK_COLUMNS}
         FROM books b
         WHERE NOT EXISTS (
             SELECT 1 FROM folder_books fb WHERE fb.book_id = b.id AND fb.folder_id = ?1
         )
         ORDER BY b.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let books = stmt
        .query_map([folder_id], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(books)
}

pub fn fetch_memberships(conn: &Connection, folder_id: i64) -> StoreResult<Vec<FolderMembership>> {
    let mut stmt = conn.prepare(
        "SELECT id, folder_id, book_id FROM folder_books WHERE folder_id = ?1 ORDER BY id",
    )?;
    let memberships = stmt
        .query_map([folder_id], |row| {
            Ok(FolderMembership {
                id: row.get(0)?,
                folder_id: row.get(1)?,
                book_id: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(memberships)
}
