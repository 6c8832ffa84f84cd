use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, Category, UNCATEGORIZED};

use super::helpers::clean_path_input;

/// Left/right picker over "Uncategorized" plus every category name.
#[derive(Default, Clone)]
pub(crate) struct CategoryPicker {
    options: Vec<String>,
    /// 0 is uncategorized; `n` points at `options[n - 1]`.
    index: usize,
}

impl CategoryPicker {
    /// A `current` name with no matching category row stays selectable so
    /// saving an unrelated edit does not drop it.
    pub(crate) fn new(categories: &[Category], current: Option<&str>) -> Self {
        let mut options: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();
        let index = match current {
            None => 0,
            Some(name) => match options.iter().position(|o| o == name) {
                Some(idx) => idx + 1,
                None => {
                    options.push(name.to_string());
                    options.len()
                }
            },
        };
        Self { options, index }
    }

    pub(crate) fn next(&mut self) {
        self.index = (self.index + 1) % (self.options.len() + 1);
    }

    pub(crate) fn previous(&mut self) {
        let len = self.options.len() + 1;
        self.index = (self.index + len - 1) % len;
    }

    pub(crate) fn value(&self) -> Option<String> {
        match self.index {
            0 => None,
            n => self.options.get(n - 1).cloned(),
        }
    }

    pub(crate) fn label(&self) -> String {
        self.value().unwrap_or_else(|| UNCATEGORIZED.to_string())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ImportField {
    #[default]
    Path,
    Category,
}

/// Form for importing a document from a path on disk.
#[derive(Default, Clone)]
pub(crate) struct ImportForm {
    pub(crate) path: String,
    pub(crate) category: CategoryPicker,
    pub(crate) active: ImportField,
    pub(crate) error: Option<String>,
}

impl ImportForm {
    pub(crate) fn new(categories: &[Category], preset: Option<&str>) -> Self {
        Self {
            category: CategoryPicker::new(categories, preset),
            ..Self::default()
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            ImportField::Path => ImportField::Category,
            ImportField::Category => ImportField::Path,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() || self.active != ImportField::Path {
            return false;
        }
        self.path.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        if self.active == ImportField::Path {
            self.path.pop();
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<(String, Option<String>)> {
        let path = clean_path_input(&self.path);
        if path.is_empty() {
            return Err(anyhow!("A file path is required."));
        }
        Ok((path, self.category.value()))
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line("File", &self.path, self.active == ImportField::Path, true),
            picker_line(
                "Category",
                &self.category.label(),
                self.active == ImportField::Category,
            ),
        ]
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Category,
}

/// Form state for editing a book's title, author, and category.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) category: CategoryPicker,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

impl BookForm {
    pub(crate) fn from_book(book: &Book, categories: &[Category]) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            category: CategoryPicker::new(categories, book.category.as_deref()),
            active: BookField::Title,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Category,
            BookField::Category => BookField::Title,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Title => self.title.push(ch),
            BookField::Author => self.author.push(ch),
            BookField::Category => return false,
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::Category => {}
        }
    }

    /// Validate and normalize form inputs before they are written to the
    /// store.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String, Option<String>)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Book title is required."));
        }
        Ok((
            title.to_string(),
            self.author.trim().to_string(),
            self.category.value(),
        ))
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line("Title", &self.title, self.active == BookField::Title, true),
            field_line("Author", &self.author, self.active == BookField::Author, false),
            picker_line(
                "Category",
                &self.category.label(),
                self.active == BookField::Category,
            ),
        ]
    }
}

/// What a single-name form creates or renames.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum NameTarget {
    NewCategory,
    RenameCategory(i64),
    NewFolder,
    RenameFolder(i64),
}

impl NameTarget {
    pub(crate) fn title(self) -> &'static str {
        match self {
            NameTarget::NewCategory => "Add Category",
            NameTarget::RenameCategory(_) => "Rename Category",
            NameTarget::NewFolder => "Add Folder",
            NameTarget::RenameFolder(_) => "Rename Folder",
        }
    }
}

/// One-line form used for category and folder names.
#[derive(Clone)]
pub(crate) struct NameForm {
    pub(crate) target: NameTarget,
    pub(crate) name: String,
    pub(crate) error: Option<String>,
}

impl NameForm {
    pub(crate) fn new(target: NameTarget, name: &str) -> Self {
        Self {
            target,
            name: name.to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.name.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![field_line("Name", &self.name, true, true)]
    }
}

/// Pending destructive action awaiting a y/n answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ConfirmDelete {
    Book { id: i64, title: String },
    Category { id: i64, name: String, books: usize },
    Folder { id: i64, name: String },
    Unlink { folder_id: i64, book_id: i64, title: String },
}

impl ConfirmDelete {
    pub(crate) fn title(&self) -> &'static str {
        match self {
            ConfirmDelete::Book { .. } => "Delete Book",
            ConfirmDelete::Category { .. } => "Delete Category",
            ConfirmDelete::Folder { .. } => "Delete Folder",
            ConfirmDelete::Unlink { .. } => "Remove From Folder",
        }
    }

    pub(crate) fn message(&self) -> String {
        match self {
            ConfirmDelete::Book { title, .. } => {
                format!("Delete \"{title}\" from the library?")
            }
            ConfirmDelete::Category { name, books, .. } => format!(
                "Delete category \"{name}\"? {books} book(s) will become {UNCATEGORIZED}."
            ),
            ConfirmDelete::Folder { name, .. } => {
                format!("Delete folder \"{name}\"? Its books stay in the library.")
            }
            ConfirmDelete::Unlink { title, .. } => {
                format!("Remove \"{title}\" from this folder?")
            }
        }
    }
}

fn field_line(name: &str, value: &str, active: bool, required: bool) -> Line<'static> {
    let display = match (value.is_empty(), required) {
        (true, true) => "<required>".to_string(),
        (true, false) => "<optional>".to_string(),
        (false, _) => value.to_string(),
    };

    let style = if active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{name}: ")),
        Span::styled(display, style),
    ])
}

fn picker_line(name: &str, value: &str, active: bool) -> Line<'static> {
    let style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(format!("{name}: ")),
        Span::styled(format!("< {value} >"), style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: 1,
                name: "Fiction".to_string(),
            },
            Category {
                id: 2,
                name: "Sci-Fi".to_string(),
            },
        ]
    }

    #[test]
    fn picker_starts_on_current_category_and_wraps() {
        let mut picker = CategoryPicker::new(&categories(), Some("Sci-Fi"));
        assert_eq!(picker.value().as_deref(), Some("Sci-Fi"));
        picker.next();
        assert_eq!(picker.value(), None);
        assert_eq!(picker.label(), UNCATEGORIZED);
        picker.previous();
        assert_eq!(picker.value().as_deref(), Some("Sci-Fi"));
    }

    #[test]
    fn picker_keeps_unlisted_category() {
        let mut picker = CategoryPicker::new(&categories(), Some("Gone"));
        assert_eq!(picker.value().as_deref(), Some("Gone"));
        picker.next();
        assert_eq!(picker.value(), None);
        picker.previous();
        picker.previous();
        assert_eq!(picker.value().as_deref(), Some("Sci-Fi"));
    }

    #[test]
    fn book_form_requires_title() {
        let mut form = BookForm::default();
        assert!(form.parse_inputs().is_err());
        for ch in " Dune ".chars() {
            form.push_char(ch);
        }
        form.toggle_field();
        form.push_char('H');
        let (title, author, category) = form.parse_inputs().unwrap();
        assert_eq!(title, "Dune");
        assert_eq!(author, "H");
        assert_eq!(category, None);
    }

    #[test]
    fn import_form_ignores_typing_on_category_field() {
        let mut form = ImportForm::new(&categories(), Some("Fiction"));
        form.toggle_field();
        assert!(!form.push_char('x'));
        form.toggle_field();
        for ch in "'/tmp/a.pdf'".chars() {
            form.push_char(ch);
        }
        let (path, category) = form.parse_inputs().unwrap();
        assert_eq!(path, "/tmp/a.pdf");
        assert_eq!(category.as_deref(), Some("Fiction"));
    }
}
