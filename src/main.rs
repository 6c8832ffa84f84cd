//! Binary entry point: resolve the data directory, start logging, open the
//! store, and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use bookshelf_manager::config::{self, AppPaths};
use bookshelf_manager::{logging, run_app, App, LibraryStore};
use log::info;

fn main() -> anyhow::Result<()> {
    let paths = AppPaths::resolve()?;
    paths.ensure_dirs()?;
    logging::init(&paths.log_path, config::log_level())?;
    info!("starting with data directory {}", paths.data_dir.display());

    let store = LibraryStore::open(&paths.db_path)?;
    let mut app = App::new(store, paths.books_dir.clone())?;
    let result = run_app(&mut app);

    app.into_store()
        .close()
        .context("failed to close the library database")?;
    info!("shut down cleanly");
    result
}
