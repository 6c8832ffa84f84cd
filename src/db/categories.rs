use log::info;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{map_unique_constraint, normalize_category_name, StoreError, StoreResult};
use crate::models::Category;

const ENTITY: &str = "Category";

/// All categories in creation order.
pub fn fetch_categories(conn: &Connection) -> StoreResult<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;

    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(categories)
}

/// Insert a new category. A name that already exists is rejected with
/// [`StoreError::Duplicate`] and the store is left untouched.
pub fn add_category(conn: &Connection, name: &str) -> StoreResult<Category> {
    let name = normalize_category_name(name, ENTITY)?;
    conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name])
        .map_err(|err| map_unique_constraint(err, ENTITY, &name))?;

    let id = conn.last_insert_rowid();
    info!("added category {id} \"{name}\"");
    Ok(Category { id, name })
}

fn category_name(conn: &Connection, id: i64) -> StoreResult<String> {
    conn.query_row("SELECT name FROM categories WHERE id = ?1", [id], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or(StoreError::NotFound { entity: ENTITY, id })
}

/// Rename a category and rewrite every book tagged with the old name. Both
/// writes commit together; any failure (unknown id, name clash) rolls back and
/// is returned to the caller.
pub fn edit_category(conn: &mut Connection, id: i64, new_name: &str) -> StoreResult<()> {
    let new_name = normalize_category_name(new_name, ENTITY)?;
    let tx = conn.transaction()?;

    let old_name = category_name(&tx, id)?;
    tx.execute(
        "UPDATE categories SET name = ?1 WHERE id = ?2",
        params![new_name, id],
    )
    .map_err(|err| map_unique_constraint(err, ENTITY, &new_name))?;
    let retagged = tx.execute(
        "UPDATE books SET category = ?1 WHERE category = ?2",
        params![new_name, old_name],
    )?;

    tx.commit()?;
    info!("renamed category {id} \"{old_name}\" -> \"{new_name}\" ({retagged} books)");
    Ok(())
}

/// Delete a category after clearing it from every book that references it.
/// Clearing happens first, inside the same transaction, so a later category
/// reusing the name starts with no books.
pub fn delete_category(conn: &mut Connection, id: i64) -> StoreResult<()> {
    let tx = conn.transaction()?;

    let name = category_name(&tx, id)?;
    let cleared = tx.execute(
        "UPDATE books SET category = NULL WHERE category = ?1",
        params![name],
    )?;
    tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;

    tx.commit()?;
    info!("deleted category {id} \"{name}\" ({cleared} books uncategorized)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::books::{add_book, fetch_books};
    use crate::db::connection::open_in_memory;
    use crate::models::NewBook;

    fn tagged(conn: &Connection, title: &str, category: Option<&str>) {
        add_book(
            conn,
            &NewBook::new(title, "", format!("/{title}.epub"), category.map(str::to_string)),
        )
        .unwrap();
    }

    fn categories_of(conn: &Connection) -> Vec<(String, Option<String>)> {
        fetch_books(conn)
            .unwrap()
            .into_iter()
            .map(|b| (b.title, b.category))
            .collect()
    }

    #[test]
    fn duplicate_name_is_rejected_once_listed() {
        let conn = open_in_memory().unwrap();
        add_category(&conn, "Fiction").unwrap();

        let err = add_category(&conn, "Fiction").unwrap_err();
        assert!(err.is_duplicate());

        let names: Vec<_> = fetch_categories(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Fiction"]);
    }

    #[test]
    fn names_are_case_sensitive() {
        let conn = open_in_memory().unwrap();
        add_category(&conn, "Fiction").unwrap();
        add_category(&conn, "fiction").unwrap();
        assert_eq!(fetch_categories(&conn).unwrap().len(), 2);
    }

    #[test]
    fn blank_name_is_rejected() {
        let conn = open_in_memory().unwrap();
        assert!(matches!(
            add_category(&conn, "  "),
            Err(StoreError::EmptyName { .. })
        ));
        assert!(fetch_categories(&conn).unwrap().is_empty());
    }

    #[test]
    fn uncategorized_label_cannot_be_claimed() {
        let mut conn = open_in_memory().unwrap();
        assert!(matches!(
            add_category(&conn, "Uncategorized"),
            Err(StoreError::ReservedName { .. })
        ));

        let fiction = add_category(&conn, "Fiction").unwrap();
        tagged(&conn, "Emma", Some("Fiction"));
        assert!(matches!(
            edit_category(&mut conn, fiction.id, "UNCATEGORIZED"),
            Err(StoreError::ReservedName { .. })
        ));

        assert_eq!(fetch_categories(&conn).unwrap(), vec![fiction]);
        assert_eq!(
            fetch_books(&conn).unwrap()[0].category.as_deref(),
            Some("Fiction")
        );
    }

    #[test]
    fn rename_fans_out_to_matching_books_only() {
        let mut conn = open_in_memory().unwrap();
        let fiction = add_category(&conn, "Fiction").unwrap();
        add_category(&conn, "Sci-Fi").unwrap();
        tagged(&conn, "a", Some("Fiction"));
        tagged(&conn, "b", Some("Fiction"));
        tagged(&conn, "c", Some("Fiction"));
        tagged(&conn, "d", Some("Sci-Fi"));
        tagged(&conn, "e", None);

        edit_category(&mut conn, fiction.id, "Novels").unwrap();

        assert_eq!(
            categories_of(&conn),
            vec![
                ("a".to_string(), Some("Novels".to_string())),
                ("b".to_string(), Some("Novels".to_string())),
                ("c".to_string(), Some("Novels".to_string())),
                ("d".to_string(), Some("Sci-Fi".to_string())),
                ("e".to_string(), None),
            ]
        );
        let names: Vec<_> = fetch_categories(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Novels", "Sci-Fi"]);
    }

    #[test]
    fn rename_onto_existing_name_changes_nothing() {
        let mut conn = open_in_memory().unwrap();
        let fiction = add_category(&conn, "Fiction").unwrap();
        add_category(&conn, "Sci-Fi").unwrap();
        tagged(&conn, "a", Some("Fiction"));

        let err = edit_category(&mut conn, fiction.id, "Sci-Fi").unwrap_err();
        assert!(err.is_duplicate());

        assert_eq!(
            categories_of(&conn),
            vec![("a".to_string(), Some("Fiction".to_string()))]
        );
        assert_eq!(fetch_categories(&conn).unwrap()[0].name, "Fiction");
    }

    #[test]
    fn rename_unknown_category_is_not_found() {
        let mut conn = open_in_memory().unwrap();
        let err = edit_category(&mut conn, 7, "Anything").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_clears_references_then_row() {
        let mut conn = open_in_memory().unwrap();
        let fiction = add_category(&conn, "Fiction").unwrap();
        add_category(&conn, "Sci-Fi").unwrap();
        tagged(&conn, "a", Some("Fiction"));
        tagged(&conn, "b", Some("Sci-Fi"));

        delete_category(&mut conn, fiction.id).unwrap();

        assert_eq!(
            categories_of(&conn),
            vec![
                ("a".to_string(), None),
                ("b".to_string(), Some("Sci-Fi".to_string())),
            ]
        );
        assert!(fetch_categories(&conn)
            .unwrap()
            .iter()
            .all(|c| c.id != fiction.id));

        // A new category reusing the name starts empty.
        add_category(&conn, "Fiction").unwrap();
        assert_eq!(categories_of(&conn)[0].1, None);
    }

    #[test]
    fn delete_unknown_category_is_not_found() {
        let mut conn = open_in_memory().unwrap();
        assert!(delete_category(&mut conn, 3).unwrap_err().is_not_found());
    }
}
