use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use log::info;
use rusqlite::Connection;

use crate::error::{StoreError, StoreResult};
use crate::models::{Book, Category, Folder, NewBook};

use super::{books, categories, connection, folders};

/// Process-wide handle to the library database. One connection sits behind a
/// mutex so statements from any thread run one at a time. The handle is
/// passed explicitly to whoever needs it and closed on shutdown.
pub struct LibraryStore {
    conn: Mutex<Connection>,
}

impl LibraryStore {
    /// Open the store at `path`, apply schema upgrades, and drop memberships
    /// orphaned by older versions.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = connection::open_database(path)?;
        connection::prune_dangling_memberships(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Close the underlying connection, reporting any error SQLite raises
    /// while flushing.
    pub fn close(self) -> StoreResult<()> {
        let conn = self.conn.into_inner().map_err(|_| StoreError::Poisoned)?;
        conn.close().map_err(|(_, err)| StoreError::from(err))?;
        info!("library store closed");
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn ensure_schema(&self) -> StoreResult<()> {
        connection::ensure_schema(&*self.lock()?)
    }

    pub fn add_book(&self, book: &NewBook) -> StoreResult<Book> {
        books::add_book(&*self.lock()?, book)
    }

    pub fn books(&self) -> StoreResult<Vec<Book>> {
        books::fetch_books(&*self.lock()?)
    }

    pub fn book(&self, id: i64) -> StoreResult<Option<Book>> {
        books::fetch_book(&*self.lock()?, id)
    }

    pub fn update_book(
        &self,
        id: i64,
        title: &str,
        author: &str,
        category: Option<&str>,
    ) -> StoreResult<bool> {
        books::update_book(&*self.lock()?, id, title, author, category)
    }

    pub fn delete_book(&self, id: i64) -> StoreResult<bool> {
        books::delete_book(&mut *self.lock()?, id)
    }

    pub fn set_favorite(&self, id: i64, is_favorite: bool) -> StoreResult<bool> {
        books::set_favorite(&*self.lock()?, id, is_favorite)
    }

    pub fn add_category(&self, name: &str) -> StoreResult<Category> {
        categories::add_category(&*self.lock()?, name)
    }

    pub fn categories(&self) -> StoreResult<Vec<Category>> {
        categories::fetch_categories(&*self.lock()?)
    }

    pub fn edit_category(&self, id: i64, new_name: &str) -> StoreResult<()> {
        categories::edit_category(&mut *self.lock()?, id, new_name)
    }

    pub fn delete_category(&self, id: i64) -> StoreResult<()> {
        categories::delete_category(&mut *self.lock()?, id)
    }

    pub fn add_folder(&self, name: &str) -> StoreResult<Folder> {
        folders::add_folder(&*self.lock()?, name)
    }

    pub fn folders(&self) -> StoreResult<Vec<Folder>> {
        folders::fetch_folders(&*self.lock()?)
    }

    pub fn update_folder(&self, id: i64, new_name: &str) -> StoreResult<()> {
        folders::update_folder(&*self.lock()?, id, new_name)
    }

    pub fn delete_folder(&self, id: i64) -> StoreResult<()> {
        folders::delete_folder(&mut *self.lock()?, id)
    }

    pub fn add_book_to_folder(&self, folder_id: i64, book_id: i64) -> StoreResult<bool> {
        folders::add_book_to_folder(&*self.lock()?, folder_id, book_id)
    }

    pub fn remove_book_from_folder(&self, folder_id: i64, book_id: i64) -> StoreResult<bool> {
        folders::remove_book_from_folder(&*self.lock()?, folder_id, book_id)
    }

    pub fn books_in_folder(&self, folder_id: i64) -> StoreResult<Vec<Book>> {
        folders::fetch_books_for_folder(&*self.lock()?, folder_id)
    }

    pub fn books_outside_folder(&self, folder_id: i64) -> StoreResult<Vec<Book>> {
        folders::fetch_books_outside_folder(&*self.lock()?, folder_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn store_is_shareable_across_threads() {
        let store = Arc::new(LibraryStore::open_in_memory().unwrap());

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for n in 0..5 {
                        let title = format!("w{worker}-{n}");
                        store
                            .add_book(&NewBook::new(title, "", "/x.pdf", None))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.books().unwrap().len(), 20);
    }

    #[test]
    fn transactional_operations_run_through_the_handle() {
        let store = LibraryStore::open_in_memory().unwrap();
        let fiction = store.add_category("Fiction").unwrap();
        let book = store
            .add_book(&NewBook::new("Emma", "Austen", "/emma.pdf", Some("Fiction".to_string())))
            .unwrap();
        let folder = store.add_folder("Shelf").unwrap();
        assert!(store.add_book_to_folder(folder.id, book.id).unwrap());

        store.edit_category(fiction.id, "Novels").unwrap();
        assert_eq!(store.book(book.id).unwrap().unwrap().category.as_deref(), Some("Novels"));
        store.delete_category(fiction.id).unwrap();
        assert_eq!(store.book(book.id).unwrap().unwrap().category, None);

        assert!(store.delete_book(book.id).unwrap());
        assert!(store.books_in_folder(folder.id).unwrap().is_empty());
        store.delete_folder(folder.id).unwrap();
        assert!(store.folders().unwrap().is_empty());
    }

    #[test]
    fn close_releases_connection() {
        let store = LibraryStore::open_in_memory().unwrap();
        store.add_category("Fiction").unwrap();
        store.close().unwrap();
    }
}
