use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

use crate::error::StoreResult;
use crate::models::UNCATEGORIZED;

/// Open (or create) the SQLite file at `path`, creating parent directories as
/// needed, and bring its schema up to date.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))?;
    ensure_schema(&conn).context("failed to prepare library schema")?;
    info!("opened library store at {}", path.display());
    Ok(conn)
}

/// In-memory store with the full schema, used by tests and throwaway sessions.
pub fn open_in_memory() -> StoreResult<Connection> {
    let conn = Connection::open_in_memory()?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create every table that is missing and apply the additive upgrades older
/// stores need. Safe to run on every start: existing rows are never dropped.
/// Also toggles `PRAGMA foreign_keys = ON` so the membership cascades declared
/// below fire the same way in tests and in production.
pub fn ensure_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL DEFAULT '',
            author TEXT NOT NULL DEFAULT '',
            file_path TEXT NOT NULL,
            category TEXT,
            favorite INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS folders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS folder_books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            folder_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            FOREIGN KEY(folder_id) REFERENCES folders(id) ON DELETE CASCADE,
            FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE
        )",
        [],
    )?;

    add_favorite_column(conn)?;
    ensure_unique_memberships(conn)?;
    clear_uncategorized_tags(conn)?;

    debug!("library schema verified");
    Ok(())
}

/// Stores created before favorites existed lack the column. A "duplicate
/// column name" failure means it is already there and is the one error this
/// module deliberately ignores.
fn add_favorite_column(conn: &Connection) -> StoreResult<()> {
    match conn.execute(
        "ALTER TABLE books ADD COLUMN favorite INTEGER NOT NULL DEFAULT 0",
        [],
    ) {
        Ok(_) => {
            info!("added favorite column to books table");
            Ok(())
        }
        Err(err) if is_duplicate_column(&err) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn is_duplicate_column(err: &rusqlite::Error) -> bool {
    err.to_string().contains("duplicate column name")
}

/// Collapse repeated (folder, book) links left by older stores, then enforce
/// uniqueness with an index so repeated adds become no-ops.
fn ensure_unique_memberships(conn: &Connection) -> StoreResult<()> {
    let removed = conn.execute(
        "DELETE FROM folder_books
         WHERE id NOT IN (
             SELECT MIN(id) FROM folder_books GROUP BY folder_id, book_id
         )",
        [],
    )?;
    if removed > 0 {
        info!("collapsed {removed} duplicate folder memberships");
    }

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS folder_books_folder_book
         ON folder_books (folder_id, book_id)",
        [],
    )?;
    Ok(())
}

/// Older stores tagged imports with the literal uncategorized label (and
/// sometimes an empty string) instead of NULL. Both become NULL so filters and
/// counts treat them like every other uncategorized book.
fn clear_uncategorized_tags(conn: &Connection) -> StoreResult<()> {
    let cleared = conn.execute(
        "UPDATE books SET category = NULL
         WHERE TRIM(category) = '' OR LOWER(TRIM(category)) = LOWER(?1)",
        [UNCATEGORIZED],
    )?;
    if cleared > 0 {
        info!("cleared the uncategorized label from {cleared} books");
    }
    Ok(())
}

/// Delete memberships whose folder or book row is gone. Older stores deleted
/// books without touching `folder_books`, so those links can linger.
pub fn prune_dangling_memberships(conn: &Connection) -> StoreResult<usize> {
    let removed = conn.execute(
        "DELETE FROM folder_books
         WHERE folder_id NOT IN (SELECT id FROM folders)
            OR book_id NOT IN (SELECT id FROM books)",
        [],
    )?;
    if removed > 0 {
        info!("pruned {removed} dangling folder memberships");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn ensure_schema_creates_all_tables() {
        let conn = open_in_memory().unwrap();
        assert_eq!(
            table_names(&conn),
            vec!["books", "categories", "folder_books", "folders"]
        );
    }

    #[test]
    fn ensure_schema_is_idempotent_and_keeps_rows() {
        let conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO books (title, author, file_path) VALUES ('Dune', 'Herbert', '/d.epub')",
            [],
        )
        .unwrap();

        for _ in 0..3 {
            ensure_schema(&conn).unwrap();
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(table_names(&conn).len(), 4);
    }

    #[test]
    fn legacy_books_table_gains_favorite_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT,
                author TEXT,
                file_path TEXT,
                category TEXT
            )",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO books (title, author, file_path, category)
             VALUES ('Old', 'Someone', '/old.pdf', 'Fiction')",
            [],
        )
        .unwrap();

        ensure_schema(&conn).unwrap();

        let favorite: i64 = conn
            .query_row("SELECT favorite FROM books WHERE title = 'Old'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(favorite, 0);
    }

    #[test]
    fn legacy_uncategorized_labels_become_null() {
        let conn = open_in_memory().unwrap();
        for (title, category) in [
            ("a", "Uncategorized"),
            ("b", ""),
            ("c", "Uncategorized Poems"),
            ("d", "Fiction"),
        ] {
            conn.execute(
                "INSERT INTO books (title, author, file_path, category) VALUES (?1, '', '/x.pdf', ?2)",
                [title, category],
            )
            .unwrap();
        }

        ensure_schema(&conn).unwrap();

        let mut stmt = conn
            .prepare("SELECT category FROM books ORDER BY id")
            .unwrap();
        let categories = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            categories,
            vec![
                None,
                None,
                Some("Uncategorized Poems".to_string()),
                Some("Fiction".to_string()),
            ]
        );
    }

    #[test]
    fn legacy_duplicate_memberships_are_collapsed() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE folder_books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                folder_id INTEGER,
                book_id INTEGER
            )",
            [],
        )
        .unwrap();
        for _ in 0..3 {
            conn.execute(
                "INSERT INTO folder_books (folder_id, book_id) VALUES (1, 7)",
                [],
            )
            .unwrap();
        }

        ensure_schema(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM folder_books", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        let err = conn
            .execute(
                "INSERT INTO folder_books (folder_id, book_id) VALUES (1, 7)",
                [],
            )
            .unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[test]
    fn prune_removes_links_to_missing_rows() {
        let conn = open_in_memory().unwrap();
        conn.execute("PRAGMA foreign_keys = OFF", []).unwrap();
        conn.execute("INSERT INTO folders (name) VALUES ('Shelf')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO folder_books (folder_id, book_id) VALUES (1, 42)",
            [],
        )
        .unwrap();

        assert_eq!(prune_dangling_memberships(&conn).unwrap(), 1);
        assert_eq!(prune_dangling_memberships(&conn).unwrap(), 0);
    }
}
