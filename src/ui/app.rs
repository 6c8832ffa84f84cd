use std::mem;
use std::path::{Path, PathBuf};

use anyhow::{Error, Result};
use crossterm::event::KeyCode;
use log::error;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::db::views::{distinct_authors, favorites, BookFilter, CategoryFilter};
use crate::db::LibraryStore;
use crate::library::{import_book, open_book};
use crate::models::{Book, Category};

use super::forms::{
    BookField, BookForm, ConfirmDelete, ImportField, ImportForm, NameForm, NameTarget,
};
use super::helpers::{centered_rect, surface_error};
use super::screens::{
    AddBooksState, BookListScreen, CategoriesScreen, FolderDetailScreen, FoldersScreen,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const HEADER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE: isize = 5;

/// Top-level tabs, reachable with the number keys.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tab {
    Library,
    Favorites,
    Categories,
    Folders,
}

const TABS: [Tab; 4] = [Tab::Library, Tab::Favorites, Tab::Categories, Tab::Folders];

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::Library => "1 Library",
            Tab::Favorites => "2 Favorites",
            Tab::Categories => "3 Categories",
            Tab::Folders => "4 Folders",
        }
    }
}

/// High-level navigation states. Keeping this explicit makes it easy to reason
/// about which rendering path runs and what keyboard shortcuts should do.
enum Screen {
    Library(BookListScreen),
    Favorites(BookListScreen),
    Categories(CategoriesScreen),
    Folders(FoldersScreen),
    FolderDetail(FolderDetailScreen),
}

impl Screen {
    fn tab(&self) -> Tab {
        match self {
            Screen::Library(_) => Tab::Library,
            Screen::Favorites(_) => Tab::Favorites,
            Screen::Categories(_) => Tab::Categories,
            Screen::Folders(_) | Screen::FolderDetail(_) => Tab::Folders,
        }
    }
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    Searching(String),
    Importing(ImportForm),
    EditingBook { id: i64, form: BookForm },
    Naming(NameForm),
    Confirming(ConfirmDelete),
    SelectingBooks(AddBooksState),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

fn book_list(screen: &mut Screen) -> Option<&mut BookListScreen> {
    match screen {
        Screen::Library(list) | Screen::Favorites(list) => Some(list),
        _ => None,
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: LibraryStore,
    books_dir: PathBuf,
    categories: Vec<Category>,
    authors: Vec<String>,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Load the initial library view. Failing here is fatal because there is
    /// nothing to show yet.
    pub fn new(store: LibraryStore, books_dir: impl Into<PathBuf>) -> Result<Self> {
        let books = store.books()?;
        let categories = store.categories()?;
        let authors = distinct_authors(&books);
        Ok(Self {
            store,
            books_dir: books_dir.into(),
            categories,
            authors,
            screen: Screen::Library(BookListScreen::new(books, BookFilter::default())),
            mode: Mode::Normal,
            status: None,
        })
    }

    /// Hand the store back so the caller can close it on shutdown.
    pub fn into_store(self) -> LibraryStore {
        self.store
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    /// Store failures never escape: they end up in the footer.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching(query) => self.handle_search(code, query),
            Mode::Importing(form) => self.handle_import(code, form),
            Mode::EditingBook { id, form } => self.handle_edit_book(code, id, form),
            Mode::Naming(form) => self.handle_naming(code, form),
            Mode::Confirming(confirm) => self.handle_confirm(code, confirm),
            Mode::SelectingBooks(state) => self.handle_select_books(code, state),
        };

        exit
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
                return Mode::Normal;
            }
            KeyCode::Char('1') => return self.switch_tab(Tab::Library),
            KeyCode::Char('2') => return self.switch_tab(Tab::Favorites),
            KeyCode::Char('3') => return self.switch_tab(Tab::Categories),
            KeyCode::Char('4') => return self.switch_tab(Tab::Folders),
            _ => {}
        }

        match self.screen {
            Screen::Library(_) | Screen::Favorites(_) => self.handle_book_list_key(code),
            Screen::Categories(_) => self.handle_categories_key(code),
            Screen::Folders(_) => self.handle_folders_key(code),
            Screen::FolderDetail(_) => self.handle_folder_detail_key(code),
        }
    }

    fn handle_book_list_key(&mut self, code: KeyCode) -> Mode {
        let Some(list) = book_list(&mut self.screen) else {
            return Mode::Normal;
        };

        let status = match code {
            KeyCode::Up => {
                list.move_selection(-1);
                None
            }
            KeyCode::Down => {
                list.move_selection(1);
                None
            }
            KeyCode::PageUp => {
                list.move_selection(-PAGE);
                None
            }
            KeyCode::PageDown => {
                list.move_selection(PAGE);
                None
            }
            KeyCode::Home => {
                list.select_first();
                None
            }
            KeyCode::End => {
                list.select_last();
                None
            }
            KeyCode::Char('/') => return Mode::Searching(list.filter.query.clone()),
            KeyCode::Char('c') => {
                let label = list.cycle_category(&self.categories);
                Some(format!("Category filter: {label}"))
            }
            KeyCode::Char('a') => {
                let label = list.cycle_author(&self.authors);
                Some(format!("Author filter: {label}"))
            }
            KeyCode::Char('x') | KeyCode::Esc => {
                if list.filter.is_active() {
                    list.clear_filters();
                    Some("Filters cleared.".to_string())
                } else {
                    None
                }
            }
            KeyCode::Char('+') | KeyCode::Char('i') => {
                let preset = match &list.filter.category {
                    CategoryFilter::Named(name) => Some(name.clone()),
                    _ => None,
                };
                self.clear_status();
                return Mode::Importing(ImportForm::new(&self.categories, preset.as_deref()));
            }
            KeyCode::Char('-') | KeyCode::Delete => match list.current_book() {
                Some(book) => {
                    return Mode::Confirming(ConfirmDelete::Book {
                        id: book.id,
                        title: book.title.clone(),
                    })
                }
                None => {
                    self.set_status("No book selected to delete.", StatusKind::Error);
                    return Mode::Normal;
                }
            },
            _ => {
                let current = list.current_book().cloned();
                return self.handle_book_action(code, current);
            }
        };

        if let Some(text) = status {
            self.set_status(text, StatusKind::Info);
        }
        Mode::Normal
    }

    /// Actions shared by every screen that lists books: open, favorite, edit.
    fn handle_book_action(&mut self, code: KeyCode, book: Option<Book>) -> Mode {
        if !matches!(
            code,
            KeyCode::Enter | KeyCode::Char('f') | KeyCode::Char('e')
        ) {
            return Mode::Normal;
        }
        let Some(book) = book else {
            self.set_status("No book selected.", StatusKind::Error);
            return Mode::Normal;
        };

        match code {
            KeyCode::Enter => match open_book(&book) {
                Ok(format) => {
                    self.set_status(
                        format!("Opened {} ({format}).", book.display_title()),
                        StatusKind::Info,
                    );
                }
                Err(err) => {
                    self.report(err);
                }
            },
            KeyCode::Char('f') => {
                let favorite = !book.favorite;
                match self.store.set_favorite(book.id, favorite) {
                    Ok(_) => {
                        let text = if favorite {
                            format!("Added \"{}\" to favorites.", book.title)
                        } else {
                            format!("Removed \"{}\" from favorites.", book.title)
                        };
                        self.set_status(text, StatusKind::Info);
                        self.reload();
                    }
                    Err(err) => {
                        self.report(err.into());
                    }
                }
            }
            KeyCode::Char('e') => {
                self.clear_status();
                return Mode::EditingBook {
                    id: book.id,
                    form: BookForm::from_book(&book, &self.categories),
                };
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_categories_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Categories(screen) = &mut self.screen else {
            return Mode::Normal;
        };

        match code {
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::PageUp => screen.move_selection(-PAGE),
            KeyCode::PageDown => screen.move_selection(PAGE),
            KeyCode::Char('+') => {
                self.clear_status();
                return Mode::Naming(NameForm::new(NameTarget::NewCategory, ""));
            }
            KeyCode::Char('e') | KeyCode::Char('-') | KeyCode::Delete | KeyCode::Enter => {
                let Some(row) = screen.current().cloned() else {
                    self.set_status("No category selected.", StatusKind::Error);
                    return Mode::Normal;
                };
                match code {
                    KeyCode::Char('e') => {
                        self.clear_status();
                        return Mode::Naming(NameForm::new(
                            NameTarget::RenameCategory(row.category.id),
                            &row.category.name,
                        ));
                    }
                    KeyCode::Enter => {
                        let filter = BookFilter {
                            category: CategoryFilter::Named(row.category.name.clone()),
                            ..BookFilter::default()
                        };
                        self.open_library(filter);
                    }
                    _ => {
                        return Mode::Confirming(ConfirmDelete::Category {
                            id: row.category.id,
                            name: row.category.name,
                            books: row.books,
                        })
                    }
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_folders_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Folders(screen) = &mut self.screen else {
            return Mode::Normal;
        };

        match code {
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::PageUp => screen.move_selection(-PAGE),
            KeyCode::PageDown => screen.move_selection(PAGE),
            KeyCode::Char('+') => {
                self.clear_status();
                return Mode::Naming(NameForm::new(NameTarget::NewFolder, ""));
            }
            KeyCode::Char('e') | KeyCode::Char('-') | KeyCode::Delete | KeyCode::Enter => {
                let Some(folder) = screen.current().cloned() else {
                    self.set_status("No folder selected.", StatusKind::Error);
                    return Mode::Normal;
                };
                match code {
                    KeyCode::Char('e') => {
                        self.clear_status();
                        return Mode::Naming(NameForm::new(
                            NameTarget::RenameFolder(folder.id),
                            &folder.name,
                        ));
                    }
                    KeyCode::Enter => match self.store.books_in_folder(folder.id) {
                        Ok(books) => {
                            self.clear_status();
                            self.screen =
                                Screen::FolderDetail(FolderDetailScreen::new(folder, books));
                        }
                        Err(err) => {
                            self.report(err.into());
                        }
                    },
                    _ => {
                        return Mode::Confirming(ConfirmDelete::Folder {
                            id: folder.id,
                            name: folder.name,
                        })
                    }
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_folder_detail_key(&mut self, code: KeyCode) -> Mode {
        let Screen::FolderDetail(screen) = &mut self.screen else {
            return Mode::Normal;
        };
        let folder_id = screen.folder.id;

        match code {
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::PageUp => screen.move_selection(-PAGE),
            KeyCode::PageDown => screen.move_selection(PAGE),
            KeyCode::Esc => {
                self.clear_status();
                self.show_folders(Some(folder_id));
            }
            KeyCode::Char('-') | KeyCode::Delete => match screen.current_book() {
                Some(book) => {
                    return Mode::Confirming(ConfirmDelete::Unlink {
                        folder_id,
                        book_id: book.id,
                        title: book.title.clone(),
                    })
                }
                None => self.set_status("No book selected to remove.", StatusKind::Error),
            },
            KeyCode::Char('+') => match self.store.books_outside_folder(folder_id) {
                Ok(books) if books.is_empty() => {
                    self.set_status("Every book is already in this folder.", StatusKind::Info)
                }
                Ok(books) => {
                    self.clear_status();
                    return Mode::SelectingBooks(AddBooksState::new(folder_id, books));
                }
                Err(err) => {
                    self.report(err.into());
                }
            },
            _ => {
                let current = screen.current_book().cloned();
                return self.handle_book_action(code, current);
            }
        }
        Mode::Normal
    }

    fn handle_search(&mut self, code: KeyCode, mut query: String) -> Mode {
        let Some(list) = book_list(&mut self.screen) else {
            return Mode::Normal;
        };

        match code {
            KeyCode::Esc => {
                list.set_query("");
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => {
                list.move_selection(-1);
                return Mode::Searching(query);
            }
            KeyCode::Down => {
                list.move_selection(1);
                return Mode::Searching(query);
            }
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => query.push(ch),
            _ => return Mode::Searching(query),
        }

        list.set_query(&query);
        Mode::Searching(query)
    }

    fn handle_import(&mut self, code: KeyCode, mut form: ImportForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Import cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Left if form.active == ImportField::Category => form.category.previous(),
            KeyCode::Right if form.active == ImportField::Category => form.category.next(),
            KeyCode::Enter => {
                let imported = form.parse_inputs().and_then(|(path, category)| {
                    import_book(&self.store, &self.books_dir, Path::new(&path), category)
                });
                match imported {
                    Ok(book) => {
                        self.set_status(
                            format!(
                                "Book \"{}\" added to category \"{}\".",
                                book.title,
                                book.category_label()
                            ),
                            StatusKind::Info,
                        );
                        self.reload();
                        return Mode::Normal;
                    }
                    Err(err) => {
                        form.error = Some(self.report(err));
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::Importing(form)
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: i64, mut form: BookForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Left if form.active == BookField::Category => form.category.previous(),
            KeyCode::Right if form.active == BookField::Category => form.category.next(),
            KeyCode::Enter => {
                let saved = form.parse_inputs().and_then(|(title, author, category)| {
                    Ok(self
                        .store
                        .update_book(id, &title, &author, category.as_deref())?)
                });
                match saved {
                    Ok(true) => {
                        self.set_status("Book updated.", StatusKind::Info);
                        self.reload();
                        return Mode::Normal;
                    }
                    Ok(false) => {
                        self.set_status("That book no longer exists.", StatusKind::Error);
                        self.reload();
                        return Mode::Normal;
                    }
                    Err(err) => form.error = Some(self.report(err)),
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::EditingBook { id, form }
    }

    fn handle_naming(&mut self, code: KeyCode, mut form: NameForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_name(&form) {
                Ok(message) => {
                    self.set_status(message, StatusKind::Info);
                    self.reload();
                    return Mode::Normal;
                }
                Err(err) => form.error = Some(self.report(err)),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::Naming(form)
    }

    fn save_name(&mut self, form: &NameForm) -> Result<String> {
        let message = match form.target {
            NameTarget::NewCategory => {
                let category = self.store.add_category(&form.name)?;
                format!("Category \"{}\" added.", category.name)
            }
            NameTarget::RenameCategory(id) => {
                self.store.edit_category(id, &form.name)?;
                format!("Category renamed to \"{}\".", form.name.trim())
            }
            NameTarget::NewFolder => {
                let folder = self.store.add_folder(&form.name)?;
                if let Screen::Folders(screen) = &mut self.screen {
                    screen.set_folders(self.store.folders()?);
                    screen.focus(folder.id);
                }
                format!("Folder \"{}\" added.", folder.name)
            }
            NameTarget::RenameFolder(id) => {
                self.store.update_folder(id, &form.name)?;
                format!("Folder renamed to \"{}\".", form.name.trim())
            }
        };
        Ok(message)
    }

    fn handle_confirm(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(message) => {
                        self.set_status(message, StatusKind::Info);
                        self.reload();
                    }
                    Err(err) => {
                        self.report(err);
                    }
                }
                Mode::Normal
            }
            _ => Mode::Confirming(confirm),
        }
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) -> Result<String> {
        let message = match confirm {
            ConfirmDelete::Book { id, title } => {
                if self.store.delete_book(*id)? {
                    format!("Deleted \"{title}\".")
                } else {
                    format!("\"{title}\" was already gone.")
                }
            }
            ConfirmDelete::Category { id, name, .. } => {
                self.store.delete_category(*id)?;
                format!("Deleted category \"{name}\".")
            }
            ConfirmDelete::Folder { id, name } => {
                self.store.delete_folder(*id)?;
                format!("Deleted folder \"{name}\".")
            }
            ConfirmDelete::Unlink {
                folder_id,
                book_id,
                title,
            } => {
                self.store.remove_book_from_folder(*folder_id, *book_id)?;
                format!("Removed \"{title}\" from the folder.")
            }
        };
        Ok(message)
    }

    fn handle_select_books(&mut self, code: KeyCode, mut state: AddBooksState) -> Mode {
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Up => state.move_selection(-1),
            KeyCode::Down => state.move_selection(1),
            KeyCode::PageUp => state.move_selection(-PAGE),
            KeyCode::PageDown => state.move_selection(PAGE),
            KeyCode::Char(' ') => state.toggle_current(),
            KeyCode::Enter => {
                let mut added = 0usize;
                for book in state.chosen_books() {
                    match self.store.add_book_to_folder(state.folder_id, book.id) {
                        Ok(true) => added += 1,
                        Ok(false) => {}
                        Err(err) => {
                            self.report(err.into());
                            self.reload();
                            return Mode::Normal;
                        }
                    }
                }
                let message = if added == 1 {
                    "Book added to folder.".to_string()
                } else {
                    format!("Added {added} books to folder.")
                };
                self.set_status(message, StatusKind::Info);
                self.reload();
                return Mode::Normal;
            }
            _ => {}
        }
        Mode::SelectingBooks(state)
    }

    fn switch_tab(&mut self, tab: Tab) -> Mode {
        self.clear_status();
        match tab {
            Tab::Library => self.open_library(BookFilter::default()),
            Tab::Favorites => match self.load_books() {
                Ok(books) => {
                    let filter = BookFilter {
                        favorites_only: true,
                        ..BookFilter::default()
                    };
                    self.screen =
                        Screen::Favorites(BookListScreen::new(favorites(&books), filter))
                }
                Err(err) => {
                    self.report(err);
                }
            },
            Tab::Categories => match self.load_books() {
                Ok(books) => {
                    self.screen =
                        Screen::Categories(CategoriesScreen::new(&self.categories, &books))
                }
                Err(err) => {
                    self.report(err);
                }
            },
            Tab::Folders => self.show_folders(None),
        }
        Mode::Normal
    }

    fn open_library(&mut self, filter: BookFilter) {
        match self.load_books() {
            Ok(books) => self.screen = Screen::Library(BookListScreen::new(books, filter)),
            Err(err) => {
                self.report(err);
            }
        }
    }

    /// Fetch every book and bring the category and author pickers in line
    /// with it.
    fn load_books(&mut self) -> Result<Vec<Book>> {
        let books = self.store.books()?;
        self.categories = self.store.categories()?;
        self.authors = distinct_authors(&books);
        Ok(books)
    }

    fn show_folders(&mut self, focus: Option<i64>) {
        match self.store.folders() {
            Ok(folders) => {
                let mut screen = FoldersScreen::new(folders);
                if let Some(id) = focus {
                    screen.focus(id);
                }
                self.screen = Screen::Folders(screen);
            }
            Err(err) => {
                self.report(err.into());
            }
        }
    }

    /// Re-read everything the current screen shows after a mutation.
    fn refresh(&mut self) -> Result<()> {
        let books = self.load_books()?;

        match &mut self.screen {
            Screen::Library(list) => list.set_books(books),
            Screen::Favorites(list) => list.set_books(favorites(&books)),
            Screen::Categories(screen) => screen.set_data(&self.categories, &books),
            Screen::Folders(screen) => screen.set_folders(self.store.folders()?),
            Screen::FolderDetail(screen) => {
                let folder_id = screen.folder.id;
                match self
                    .store
                    .folders()?
                    .into_iter()
                    .find(|f| f.id == folder_id)
                {
                    Some(folder) => {
                        screen.folder = folder;
                        screen.set_books(self.store.books_in_folder(folder_id)?);
                    }
                    None => self.show_folders(None),
                }
            }
        }
        Ok(())
    }

    fn reload(&mut self) {
        if let Err(err) = self.refresh() {
            self.report(err);
        }
    }

    /// Log an error, show it in the footer, and return the displayed text.
    fn report(&mut self, err: Error) -> String {
        error!("{err:#}");
        let message = surface_error(&err);
        self.set_status(message.clone(), StatusKind::Error);
        message
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        match &self.screen {
            Screen::Library(list) => self.draw_book_list(frame, chunks[1], "Library", list),
            Screen::Favorites(list) => self.draw_book_list(frame, chunks[1], "Favorites", list),
            Screen::Categories(screen) => self.draw_categories(frame, chunks[1], screen),
            Screen::Folders(screen) => self.draw_folders(frame, chunks[1], screen),
            Screen::FolderDetail(screen) => self.draw_folder_detail(frame, chunks[1], screen),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::Searching(query) => self.draw_search_bar(frame, area, query),
            Mode::Importing(form) => {
                let cursor = (form.active == ImportField::Path)
                    .then(|| (0, "File: ".len() + form.path.chars().count()));
                self.draw_form(frame, area, "Import Book", form.lines(), &form.error, cursor);
            }
            Mode::EditingBook { form, .. } => {
                let cursor = match form.active {
                    BookField::Title => Some((0, "Title: ".len() + form.title.chars().count())),
                    BookField::Author => {
                        Some((1, "Author: ".len() + form.author.chars().count()))
                    }
                    BookField::Category => None,
                };
                self.draw_form(frame, area, "Edit Book", form.lines(), &form.error, cursor);
            }
            Mode::Naming(form) => {
                let cursor = Some((0, "Name: ".len() + form.name.chars().count()));
                self.draw_form(
                    frame,
                    area,
                    form.target.title(),
                    form.lines(),
                    &form.error,
                    cursor,
                );
            }
            Mode::Confirming(confirm) => self.draw_confirm(frame, area, confirm),
            Mode::SelectingBooks(state) => self.draw_add_books(frame, area, state),
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let active = self.screen.tab();
        let selected = TABS.iter().position(|tab| *tab == active).unwrap_or(0);
        let tabs = Tabs::new(TABS.iter().map(|tab| tab.title()))
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title("Bookshelf"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_book_list(&self, frame: &mut Frame, area: Rect, title: &str, list: &BookListScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let filter = &list.filter;
        let summary = Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::Gray)),
            Span::raw(if filter.query.is_empty() {
                "-".to_string()
            } else {
                filter.query.clone()
            }),
            Span::styled("   Category: ", Style::default().fg(Color::Gray)),
            Span::raw(filter.category.label().to_string()),
            Span::styled("   Author: ", Style::default().fg(Color::Gray)),
            Span::raw(filter.author.clone().unwrap_or_else(|| "All".to_string())),
        ]);
        frame.render_widget(Paragraph::new(summary), chunks[0]);

        let block_title = format!("{title} ({} of {})", list.filtered.len(), list.books.len());
        if list.filtered.is_empty() {
            let text = if filter.favorites_only && list.books.is_empty() {
                "No favorites yet. Press 'f' on a book to add it."
            } else if list.books.is_empty() {
                "No books yet. Press '+' to import one."
            } else {
                "No books match the current filters."
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(block_title));
            frame.render_widget(message, chunks[1]);
            return;
        }

        self.render_books(frame, chunks[1], block_title, &list.filtered, list.selected);
    }

    fn render_books(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: String,
        books: &[Book],
        selected: usize,
    ) {
        let items: Vec<ListItem> = books
            .iter()
            .map(|book| {
                let star = if book.favorite { "★ " } else { "  " };
                let author = if book.author.trim().is_empty() {
                    String::new()
                } else {
                    format!(" - {}", book.author.trim())
                };
                ListItem::new(Line::from(vec![
                    Span::styled(star, Style::default().fg(Color::Yellow)),
                    Span::styled(
                        book.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(author, Style::default().fg(Color::Gray)),
                    Span::styled(
                        format!("  [{}]", book.category_label()),
                        Style::default().fg(Color::Cyan),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_categories(&self, frame: &mut Frame, area: Rect, screen: &CategoriesScreen) {
        let title = format!("Categories ({} uncategorized books)", screen.uncategorized);
        if screen.rows.is_empty() {
            let message = Paragraph::new("No categories yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = screen
            .rows
            .iter()
            .map(|row| {
                let noun = if row.books == 1 { "book" } else { "books" };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        row.category.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {} {noun}", row.books),
                        Style::default().fg(Color::Gray),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(screen.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_folders(&self, frame: &mut Frame, area: Rect, screen: &FoldersScreen) {
        if screen.folders.is_empty() {
            let message = Paragraph::new("No folders yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Folders"));
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = screen
            .folders
            .iter()
            .map(|folder| ListItem::new(format!("▤ {}", folder.name)))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Folders"))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(screen.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_folder_detail(&self, frame: &mut Frame, area: Rect, screen: &FolderDetailScreen) {
        let title = format!("{} ({} books)", screen.folder.name, screen.books.len());
        if screen.books.is_empty() {
            let message = Paragraph::new("This folder is empty. Press '+' to add books.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(message, area);
            return;
        }
        self.render_books(frame, area, title, &screen.books, screen.selected);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let hints: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::Searching(_)) => &[("[Type]", "Filter"), ("[Enter]", "Keep"), ("[Esc]", "Clear")],
            (_, Mode::SelectingBooks(_)) => &[
                ("[↑↓]", "Navigate"),
                ("[Space]", "Toggle"),
                ("[Enter]", "Add Selected"),
                ("[Esc]", "Cancel"),
            ],
            (_, Mode::Confirming(_)) => &[("[y]", "Confirm"), ("[n]", "Cancel")],
            (_, Mode::Naming(_)) => &[("[Enter]", "Save"), ("[Esc]", "Cancel")],
            (_, Mode::Importing(_)) | (_, Mode::EditingBook { .. }) => &[
                ("[Enter]", "Save"),
                ("[Tab]", "Next Field"),
                ("[←→]", "Category"),
                ("[Esc]", "Cancel"),
            ],
            (Screen::Library(_), _) | (Screen::Favorites(_), _) => &[
                ("[↑↓]", "Select"),
                ("[Enter]", "Read"),
                ("[/]", "Search"),
                ("[c]", "Category"),
                ("[a]", "Author"),
                ("[f]", "Favorite"),
                ("[+]", "Import"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[1-4]", "Tabs"),
                ("[q]", "Quit"),
            ],
            (Screen::Categories(_), _) => &[
                ("[↑↓]", "Select"),
                ("[Enter]", "Show Books"),
                ("[+]", "Add"),
                ("[e]", "Rename"),
                ("[-]", "Delete"),
                ("[1-4]", "Tabs"),
                ("[q]", "Quit"),
            ],
            (Screen::Folders(_), _) => &[
                ("[↑↓]", "Select"),
                ("[Enter]", "Open"),
                ("[+]", "Add"),
                ("[e]", "Rename"),
                ("[-]", "Delete"),
                ("[1-4]", "Tabs"),
                ("[q]", "Quit"),
            ],
            (Screen::FolderDetail(_), _) => &[
                ("[↑↓]", "Select"),
                ("[Enter]", "Read"),
                ("[f]", "Favorite"),
                ("[+]", "Add Books"),
                ("[-]", "Remove"),
                ("[Esc]", "Back"),
                ("[q]", "Quit"),
            ],
        };

        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let spans: Vec<Span<'static>> = hints
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(format!(" {label}   ")),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, query: &str) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {query}")))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    /// Modal form popup. `cursor` is (row, column) inside the form body.
    fn draw_form(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        mut lines: Vec<Line<'static>>,
        error: &Option<String>,
        cursor: Option<(u16, usize)>,
    ) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        if let Some(error) = error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if let Some((row, column)) = cursor {
            frame.set_cursor_position((inner.x + column as u16, inner.y + row));
        }
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(confirm.title())
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Red));
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(confirm.message()),
            Line::from(""),
            Line::from(Span::styled(
                "y to confirm • n or Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_add_books(&self, frame: &mut Frame, area: Rect, state: &AddBooksState) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Add Books to Folder")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let items: Vec<ListItem> = state
            .books
            .iter()
            .enumerate()
            .map(|(index, book)| {
                let checkbox = if state.is_checked(index) { "[x]" } else { "[ ]" };
                ListItem::new(format!("{checkbox} {}", book.display_title()))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::NONE))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(state.selected));
        frame.render_stateful_widget(list, inner, &mut list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewBook;

    fn app_with_books(titles: &[&str]) -> App {
        let store = LibraryStore::open_in_memory().unwrap();
        for title in titles {
            store
                .add_book(&NewBook::new(*title, "Someone", format!("/{title}.pdf"), None))
                .unwrap();
        }
        App::new(store, "/tmp/unused-books-dir").unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch));
        }
    }

    #[test]
    fn favorite_key_updates_store_and_list() {
        let mut app = app_with_books(&["Dune"]);
        app.handle_key(KeyCode::Char('f'));

        assert!(app.store.books().unwrap()[0].favorite);
        let Screen::Library(list) = &app.screen else {
            panic!("expected library screen");
        };
        assert!(list.books[0].favorite);
    }

    #[test]
    fn adding_a_duplicate_category_keeps_form_open() {
        let mut app = app_with_books(&[]);
        app.store.add_category("Fiction").unwrap();
        app.handle_key(KeyCode::Char('3'));

        app.handle_key(KeyCode::Char('+'));
        type_text(&mut app, "Fiction");
        app.handle_key(KeyCode::Enter);

        assert!(matches!(&app.mode, Mode::Naming(form) if form.error.is_some()));
        assert_eq!(app.store.categories().unwrap().len(), 1);
    }

    #[test]
    fn renaming_category_from_screen_retags_books() {
        let mut app = app_with_books(&[]);
        app.store.add_category("Fiction").unwrap();
        app.store
            .add_book(&NewBook::new("Emma", "Austen", "/emma.pdf", Some("Fiction".to_string())))
            .unwrap();
        app.handle_key(KeyCode::Char('3'));

        app.handle_key(KeyCode::Char('e'));
        for _ in 0.."Fiction".len() {
            app.handle_key(KeyCode::Backspace);
        }
        type_text(&mut app, "Novels");
        app.handle_key(KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(
            app.store.books().unwrap()[0].category.as_deref(),
            Some("Novels")
        );
        let Screen::Categories(screen) = &app.screen else {
            panic!("expected categories screen");
        };
        assert_eq!(screen.rows[0].books, 1);
    }

    #[test]
    fn folder_flow_adds_and_deletes() {
        let mut app = app_with_books(&["a", "b"]);
        app.handle_key(KeyCode::Char('4'));
        app.handle_key(KeyCode::Char('+'));
        type_text(&mut app, "Reading List");
        app.handle_key(KeyCode::Enter);
        let folder_id = app.store.folders().unwrap()[0].id;

        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Char('+'));
        app.handle_key(KeyCode::Char(' '));
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Char(' '));
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.store.books_in_folder(folder_id).unwrap().len(), 2);

        app.handle_key(KeyCode::Esc);
        app.handle_key(KeyCode::Char('-'));
        app.handle_key(KeyCode::Char('y'));

        assert!(app.store.folders().unwrap().is_empty());
        assert!(app.store.books_in_folder(folder_id).unwrap().is_empty());
        assert_eq!(app.store.books().unwrap().len(), 2);
    }

    #[test]
    fn editing_title_keeps_an_unlisted_category() {
        let mut app = app_with_books(&[]);
        app.store
            .add_book(&NewBook::new("Dune", "Herbert", "/dune.pdf", Some("Sci-Fi".to_string())))
            .unwrap();
        app.handle_key(KeyCode::Char('1'));

        app.handle_key(KeyCode::Char('e'));
        app.handle_key(KeyCode::Char('!'));
        app.handle_key(KeyCode::Enter);

        let book = &app.store.books().unwrap()[0];
        assert_eq!(book.title, "Dune!");
        assert_eq!(book.category.as_deref(), Some("Sci-Fi"));
    }

    #[test]
    fn categories_tab_shows_categories_added_elsewhere() {
        let mut app = app_with_books(&[]);
        app.store.add_category("Poetry").unwrap();

        app.handle_key(KeyCode::Char('3'));

        let Screen::Categories(screen) = &app.screen else {
            panic!("expected categories screen");
        };
        assert_eq!(screen.rows.len(), 1);
        assert_eq!(screen.rows[0].category.name, "Poetry");
    }

    #[test]
    fn unfavoriting_on_favorites_tab_drops_the_book() {
        let mut app = app_with_books(&["Dune", "Emma"]);
        let emma = app.store.books().unwrap()[1].id;
        app.store.set_favorite(emma, true).unwrap();

        app.handle_key(KeyCode::Char('2'));
        let Screen::Favorites(list) = &app.screen else {
            panic!("expected favorites screen");
        };
        assert_eq!(list.books.len(), 1);
        assert_eq!(list.books[0].title, "Emma");

        app.handle_key(KeyCode::Char('f'));
        let Screen::Favorites(list) = &app.screen else {
            panic!("expected favorites screen");
        };
        assert!(list.books.is_empty());
        assert!(!app.store.books().unwrap()[1].favorite);
    }

    #[test]
    fn author_picker_follows_library_changes() {
        let mut app = app_with_books(&[]);
        assert!(app.authors.is_empty());
        app.store
            .add_book(&NewBook::new("Emma", "Austen", "/emma.pdf", None))
            .unwrap();

        app.handle_key(KeyCode::Char('1'));

        assert_eq!(app.authors, vec!["Austen"]);
    }

    #[test]
    fn search_narrows_library() {
        let mut app = app_with_books(&["Dune", "Emma"]);
        app.handle_key(KeyCode::Char('/'));
        type_text(&mut app, "em");
        app.handle_key(KeyCode::Enter);

        let Screen::Library(list) = &app.screen else {
            panic!("expected library screen");
        };
        assert_eq!(list.filtered.len(), 1);
        assert_eq!(list.filtered[0].title, "Emma");
    }

    #[test]
    fn failed_import_reports_instead_of_crashing() {
        let mut app = app_with_books(&[]);
        app.handle_key(KeyCode::Char('+'));
        type_text(&mut app, "/nowhere/missing.pdf");
        app.handle_key(KeyCode::Enter);

        assert!(matches!(&app.mode, Mode::Importing(form) if form.error.is_some()));
        assert!(app.store.books().unwrap().is_empty());
        assert!(!app.handle_key(KeyCode::Esc));
    }
}
