//! Ratatui front-end for the library. The store does the bookkeeping; this
//! layer only tracks which screen and popup are showing.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
