//! Core library surface for the Bookshelf Manager TUI application.
//!
//! The store and its repositories live in `db`; `library` handles the files
//! themselves; `ui` is the terminal front-end that drives both.
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod logging;
pub mod models;
pub mod ui;

/// The store handle most callers need.
pub use db::LibraryStore;

pub use error::{StoreError, StoreResult};

pub use models::{Book, Category, Folder, FolderMembership, NewBook};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
