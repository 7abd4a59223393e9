//! Database operations for categories.

use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::{
    Error,
    auth::UserId,
    category::{Category, CategoryId, CategoryName, NewCategory},
    timestamp::{get_timestamp, now, to_millis},
};

/// Create a category owned by `user_id` and return it with its generated ID.
pub fn create_category(
    user_id: UserId,
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = Category {
        id: Uuid::new_v4(),
        user_id,
        name: new_category.name,
        type_: new_category.type_,
        created_at: now(),
    };

    connection.execute(
        "INSERT INTO category (id, user_id, name, type, created_at) VALUES (?1, ?2, ?3, ?4, ?5);",
        (
            category.id,
            category.user_id.as_uuid(),
            category.name.as_ref(),
            category.type_,
            to_millis(category.created_at),
        ),
    )?;

    Ok(category)
}

/// Retrieve the categories owned by `user_id` ordered alphabetically by name.
pub fn get_categories_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, type, created_at FROM category
            WHERE user_id = :user_id
            ORDER BY name ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_uuid())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Whether the category `category_id` exists and is owned by `user_id`.
pub fn category_belongs_to_user(
    category_id: CategoryId,
    user_id: UserId,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .prepare("SELECT EXISTS(SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2);")?
        .query_row((category_id, user_id.as_uuid()), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id BLOB PRIMARY KEY,
            user_id BLOB NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
            created_at INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        type_: row.get(3)?,
        created_at: get_timestamp(row, 4)?,
    })
}
