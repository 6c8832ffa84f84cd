use std::collections::BTreeSet;

use crate::db::views::{
    category_book_counts, uncategorized_count, BookFilter, CategoryCount, CategoryFilter,
};
use crate::models::{Book, Category, Folder};

use super::helpers::step_selection;

/// A filterable book list. Backs both the library and the favorites tab; the
/// favorites tab simply pins `favorites_only` in its filter.
pub(crate) struct BookListScreen {
    pub(crate) books: Vec<Book>,
    pub(crate) filtered: Vec<Book>,
    pub(crate) filter: BookFilter,
    pub(crate) selected: usize,
}

impl BookListScreen {
    pub(crate) fn new(books: Vec<Book>, filter: BookFilter) -> Self {
        let mut screen = Self {
            books,
            filtered: Vec::new(),
            filter,
            selected: 0,
        };
        screen.apply_filter();
        screen
    }

    pub(crate) fn apply_filter(&mut self) {
        self.filtered = self.filter.apply(&self.books);
        self.ensure_in_bounds();
    }

    pub(crate) fn set_books(&mut self, books: Vec<Book>) {
        self.books = books;
        self.apply_filter();
    }

    pub(crate) fn set_query(&mut self, query: &str) {
        self.filter.query = query.to_string();
        self.selected = 0;
        self.apply_filter();
    }

    /// Step through All -> Uncategorized -> each category -> All.
    pub(crate) fn cycle_category(&mut self, categories: &[Category]) -> String {
        let mut options = vec![CategoryFilter::All, CategoryFilter::Uncategorized];
        options.extend(
            categories
                .iter()
                .map(|c| CategoryFilter::Named(c.name.clone())),
        );
        let current = options
            .iter()
            .position(|o| *o == self.filter.category)
            .unwrap_or(0);
        self.filter.category = options[(current + 1) % options.len()].clone();
        self.selected = 0;
        self.apply_filter();
        self.filter.category.label().to_string()
    }

    /// Step through All -> each author -> All.
    pub(crate) fn cycle_author(&mut self, authors: &[String]) -> String {
        let next = match &self.filter.author {
            None => authors.first().cloned(),
            Some(current) => authors
                .iter()
                .position(|a| a == current)
                .and_then(|idx| authors.get(idx + 1))
                .cloned(),
        };
        self.filter.author = next;
        self.selected = 0;
        self.apply_filter();
        self.filter.author.clone().unwrap_or_else(|| "All".to_string())
    }

    pub(crate) fn clear_filters(&mut self) {
        self.filter = BookFilter {
            favorites_only: self.filter.favorites_only,
            ..BookFilter::default()
        };
        self.apply_filter();
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.filtered.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.filtered.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len().saturating_sub(1);
        }
    }
}

/// Categories with their book counts.
pub(crate) struct CategoriesScreen {
    pub(crate) rows: Vec<CategoryCount>,
    pub(crate) uncategorized: usize,
    pub(crate) selected: usize,
}

impl CategoriesScreen {
    pub(crate) fn new(categories: &[Category], books: &[Book]) -> Self {
        let mut screen = Self {
            rows: Vec::new(),
            uncategorized: 0,
            selected: 0,
        };
        screen.set_data(categories, books);
        screen
    }

    pub(crate) fn set_data(&mut self, categories: &[Category], books: &[Book]) {
        self.rows = category_book_counts(categories, books);
        self.uncategorized = uncategorized_count(books);
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    pub(crate) fn current(&self) -> Option<&CategoryCount> {
        self.rows.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.rows.len(), offset);
    }
}

pub(crate) struct FoldersScreen {
    pub(crate) folders: Vec<Folder>,
    pub(crate) selected: usize,
}

impl FoldersScreen {
    pub(crate) fn new(folders: Vec<Folder>) -> Self {
        let mut screen = Self {
            folders: Vec::new(),
            selected: 0,
        };
        screen.set_folders(folders);
        screen
    }

    pub(crate) fn set_folders(&mut self, folders: Vec<Folder>) {
        self.folders = folders;
        if self.selected >= self.folders.len() {
            self.selected = self.folders.len().saturating_sub(1);
        }
    }

    /// Move the cursor onto the folder with `id`, if it is still listed.
    pub(crate) fn focus(&mut self, id: i64) {
        if let Some(idx) = self.folders.iter().position(|f| f.id == id) {
            self.selected = idx;
        }
    }

    pub(crate) fn current(&self) -> Option<&Folder> {
        self.folders.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.folders.len(), offset);
    }
}

/// Books linked to one folder.
pub(crate) struct FolderDetailScreen {
    pub(crate) folder: Folder,
    pub(crate) books: Vec<Book>,
    pub(crate) selected: usize,
}

impl FolderDetailScreen {
    pub(crate) fn new(folder: Folder, books: Vec<Book>) -> Self {
        Self {
            folder,
            books,
            selected: 0,
        }
    }

    pub(crate) fn set_books(&mut self, books: Vec<Book>) {
        self.books = books;
        if self.selected >= self.books.len() {
            self.selected = self.books.len().saturating_sub(1);
        }
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.books.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.books.len(), offset);
    }
}

/// Multi-select picker shown when adding books to a folder.
pub(crate) struct AddBooksState {
    pub(crate) folder_id: i64,
    pub(crate) books: Vec<Book>,
    pub(crate) checked: BTreeSet<usize>,
    pub(crate) selected: usize,
}

impl AddBooksState {
    pub(crate) fn new(folder_id: i64, books: Vec<Book>) -> Self {
        Self {
            folder_id,
            books,
            checked: BTreeSet::new(),
            selected: 0,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.books.len(), offset);
    }

    pub(crate) fn toggle_current(&mut self) {
        if self.selected >= self.books.len() {
            return;
        }
        if !self.checked.remove(&self.selected) {
            self.checked.insert(self.selected);
        }
    }

    pub(crate) fn is_checked(&self, index: usize) -> bool {
        self.checked.contains(&index)
    }

    /// Checked books, or the highlighted one when nothing is checked.
    pub(crate) fn chosen_books(&self) -> Vec<Book> {
        if self.checked.is_empty() {
            self.books.get(self.selected).cloned().into_iter().collect()
        } else {
            self.checked
                .iter()
                .filter_map(|idx| self.books.get(*idx).cloned())
                .collect()
        }
    }
}
