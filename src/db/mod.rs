//! Persistence module split across logical submodules.

mod books;
mod categories;
mod connection;
mod folders;
mod store;
pub mod views;

pub use books::{add_book, delete_book, fetch_book, fetch_books, set_favorite, update_book};
pub use categories::{add_category, delete_category, edit_category, fetch_categories};
pub use connection::{ensure_schema, open_database, open_in_memory, prune_dangling_memberships};
pub use folders::{
    add_book_to_folder, add_folder, delete_folder, fetch_books_for_folder,
    fetch_books_outside_folder, fetch_folders, fetch_memberships, remove_book_from_folder,
    update_folder,
};
pub use store::LibraryStore;
