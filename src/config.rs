use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use log::LevelFilter;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".bookshelf-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
/// Sub-directory holding the permanent copies of imported books.
const BOOKS_DIR_NAME: &str = "books";
const LOG_FILE_NAME: &str = "bookshelf.log";

/// Overrides the data directory when set.
pub const HOME_ENV: &str = "BOOKSHELF_HOME";
/// Log level name (`error`, `warn`, `info`, `debug`, `trace`, `off`).
pub const LOG_ENV: &str = "BOOKSHELF_LOG";

/// Every on-disk location the application touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub books_dir: PathBuf,
    pub log_path: PathBuf,
}

impl AppPaths {
    /// Resolve paths from `BOOKSHELF_HOME`, falling back to a dot-directory in
    /// the user's home.
    pub fn resolve() -> Result<Self> {
        match env::var_os(HOME_ENV) {
            Some(root) if !root.is_empty() => Ok(Self::from_root(root)),
            _ => {
                let base_dirs =
                    BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
                Ok(Self::from_root(base_dirs.home_dir().join(DATA_DIR_NAME)))
            }
        }
    }

    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let data_dir = root.as_ref().to_path_buf();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            books_dir: data_dir.join(BOOKS_DIR_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            data_dir,
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).context("failed to create data directory")?;
        fs::create_dir_all(&self.books_dir).context("failed to create books directory")?;
        Ok(())
    }
}

/// Log level from `BOOKSHELF_LOG`, defaulting to `info` when unset or invalid.
pub fn log_level() -> LevelFilter {
    env::var(LOG_ENV)
        .ok()
        .and_then(|raw| parse_level(&raw))
        .unwrap_or(LevelFilter::Info)
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    raw.trim().parse().ok()
}
