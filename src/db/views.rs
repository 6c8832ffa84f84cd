//! Read-only compositions over repository output. Nothing here touches the
//! database; screens fetch books and categories once and derive the rest.

use crate::models::{Book, Category};

/// Book count for one category, matched on the exact (case-sensitive) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Category,
    pub books: usize,
}

/// Category selector used by the library and favorites screens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Uncategorized,
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Uncategorized => book.category.is_none(),
            CategoryFilter::Named(name) => book.category.as_deref() == Some(name.as_str()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Uncategorized => crate::models::UNCATEGORIZED,
            CategoryFilter::Named(name) => name,
        }
    }
}

/// Client-side filter combining the title search box with the category and
/// author pickers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub query: String,
    pub category: CategoryFilter,
    pub author: Option<String>,
    pub favorites_only: bool,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        let query = self.query.trim().to_lowercase();
        let title_ok = query.is_empty() || book.title.to_lowercase().contains(&query);
        let author_ok = self
            .author
            .as_deref()
            .map_or(true, |author| book.author == author);

        title_ok
            && author_ok
            && self.category.matches(book)
            && (!self.favorites_only || book.favorite)
    }

    pub fn apply(&self, books: &[Book]) -> Vec<Book> {
        books.iter().filter(|b| self.matches(b)).cloned().collect()
    }

    pub fn is_active(&self) -> bool {
        *self != BookFilter {
            favorites_only: self.favorites_only,
            ..BookFilter::default()
        }
    }
}

pub fn favorites(books: &[Book]) -> Vec<Book> {
    books.iter().filter(|b| b.favorite).cloned().collect()
}

pub fn category_book_counts(categories: &[Category], books: &[Book]) -> Vec<CategoryCount> {
    categories
        .iter()
        .map(|category| CategoryCount {
            category: category.clone(),
            books: books
                .iter()
                .filter(|b| b.category.as_deref() == Some(category.name.as_str()))
                .count(),
        })
        .collect()
}

pub fn uncategorized_count(books: &[Book]) -> usize {
    books.iter().filter(|b| b.category.is_none()).count()
}

/// Distinct non-blank authors for the author picker, sorted
/// case-insensitively.
pub fn distinct_authors(books: &[Book]) -> Vec<String> {
    let mut authors: Vec<String> = Vec::new();
    for book in books {
        let author = book.author.trim();
        if !author.is_empty() && !authors.iter().any(|a| a == author) {
            authors.push(author.to_string());
        }
    }
    authors.sort_by_key(|author| (author.to_lowercase(), author.clone()));
    authors
}
