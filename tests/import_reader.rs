use std::fs;

use bookshelf_manager::library::{check_readable, import_book, BookFormat};
use bookshelf_manager::models::UNKNOWN_AUTHOR;
use bookshelf_manager::LibraryStore;
use rusqlite::Connection;
use tempfile::tempdir;

#[test]
fn import_copies_file_and_registers_book() {
    let source_dir = tempdir().unwrap();
    let library_dir = tempdir().unwrap();
    let source = source_dir.path().join("Pride and Prejudice.epub");
    fs::write(&source, b"epub bytes").unwrap();

    let store = LibraryStore::open_in_memory().unwrap();
    store.add_category("Classics").unwrap();
    let book = import_book(
        &store,
        library_dir.path(),
        &source,
        Some("Classics".to_string()),
    )
    .unwrap();

    assert_eq!(book.title, "Pride and Prejudice");
    assert_eq!(book.author, UNKNOWN_AUTHOR);
    assert_eq!(book.category.as_deref(), Some("Classics"));
    assert!(!book.favorite);
    assert!(book.file_path.ends_with("Pride and Prejudice.epub"));
    assert_ne!(fs::canonicalize(&source).unwrap().to_string_lossy(), book.file_path);
    assert_eq!(fs::read(&book.file_path).unwrap(), b"epub bytes");
    assert_eq!(check_readable(&book).unwrap(), BookFormat::Epub);
    assert_eq!(store.books().unwrap(), vec![book]);
}

#[test]
fn importing_the_same_file_twice_keeps_both_copies() {
    let source_dir = tempdir().unwrap();
    let library_dir = tempdir().unwrap();
    let source = source_dir.path().join("Dune.pdf");
    fs::write(&source, b"%PDF").unwrap();

    let store = LibraryStore::open_in_memory().unwrap();
    let first = import_book(&store, library_dir.path(), &source, None).unwrap();
    let second = import_book(&store, library_dir.path(), &source, None).unwrap();

    assert_ne!(first.file_path, second.file_path);
    assert!(second.file_path.ends_with("Dune (2).pdf"));
    assert_eq!(store.books().unwrap().len(), 2);
}

#[test]
fn unsupported_or_missing_files_are_not_imported() {
    let source_dir = tempdir().unwrap();
    let library_dir = tempdir().unwrap();
    let notes = source_dir.path().join("notes.txt");
    fs::write(&notes, b"plain").unwrap();

    let store = LibraryStore::open_in_memory().unwrap();
    let err = import_book(&store, library_dir.path(), &notes, None).unwrap_err();
    assert!(err.to_string().contains("Unsupported"));

    let missing = source_dir.path().join("gone.pdf");
    assert!(import_book(&store, library_dir.path(), &missing, None).is_err());

    assert!(store.books().unwrap().is_empty());
    assert_eq!(fs::read_dir(library_dir.path()).unwrap().count(), 0);
}

#[test]
fn removed_file_is_reported_on_read() {
    let source_dir = tempdir().unwrap();
    let library_dir = tempdir().unwrap();
    let source = source_dir.path().join("Emma.pdf");
    fs::write(&source, b"%PDF").unwrap();

    let store = LibraryStore::open_in_memory().unwrap();
    let book = import_book(&store, library_dir.path(), &source, None).unwrap();
    fs::remove_file(&book.file_path).unwrap();

    let err = check_readable(&book).unwrap_err();
    assert!(err.to_string().contains("re-import"));
}

#[test]
fn failed_insert_removes_the_copied_file() {
    let data_dir = tempdir().unwrap();
    let source_dir = tempdir().unwrap();
    let books_dir = data_dir.path().join("books");
    let db_path = data_dir.path().join("library.sqlite");
    let source = source_dir.path().join("Emma.pdf");
    fs::write(&source, b"%PDF").unwrap();

    LibraryStore::open(&db_path).unwrap().close().unwrap();
    Connection::open(&db_path)
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER reject_books BEFORE INSERT ON books
             BEGIN SELECT RAISE(ABORT, 'disk is read-only'); END;",
        )
        .unwrap();

    let store = LibraryStore::open(&db_path).unwrap();
    let err = import_book(&store, &books_dir, &source, None).unwrap_err();

    assert!(format!("{err:#}").contains("Book not added"));
    assert!(store.books().unwrap().is_empty());
    assert_eq!(fs::read_dir(&books_dir).unwrap().count(), 0);
    assert!(source.is_file());
}
