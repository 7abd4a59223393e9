//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Error, TransactionType,
    auth::UserId,
    category::CategoryId,
    timestamp::{get_timestamp, now, to_millis},
};

// ============================================================================
// MODELS
// ============================================================================

/// The maximum number of characters in a transaction description.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Database identifier for a transaction.
pub type TransactionId = Uuid;

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// The category the transaction is filed under.
    pub category_id: CategoryId,
    /// Whether money was spent or earned.
    #[serde(rename = "type")]
    pub type_: TransactionType,
    /// The amount of money spent or earned in this transaction. Always positive.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The client supplied fields of a transaction after validation.
///
/// Used both for creating a transaction and for replacing the fields of an
/// existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The category the transaction is filed under.
    pub category_id: CategoryId,
    /// Whether money was spent or earned.
    pub type_: TransactionType,
    /// A positive amount of money.
    pub amount: f64,
    /// A non-empty description.
    pub description: String,
    /// When the transaction happened.
    pub date: OffsetDateTime,
}

/// Check that `amount` is a finite number greater than zero.
///
/// # Errors
/// Returns [Error::NonPositiveAmount] otherwise.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::NonPositiveAmount)
    }
}

/// Trim `description` and check its length.
///
/// # Errors
/// This function will return an:
/// - [Error::EmptyDescription] if `description` is empty or only whitespace,
/// - [Error::DescriptionTooLong] if it has more than [MAX_DESCRIPTION_LENGTH] characters.
pub fn validate_description(description: &str) -> Result<String, Error> {
    let description = description.trim();

    if description.is_empty() {
        Err(Error::EmptyDescription)
    } else if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        Err(Error::DescriptionTooLong)
    } else {
        Ok(description.to_owned())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction owned by `user_id`.
///
/// The caller is responsible for checking that the category belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::UnknownCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserId,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (id, user_id, category_id, type, amount, description, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING id, user_id, category_id, type, amount, description, date, created_at",
        )?
        .query_row(
            (
                Uuid::new_v4(),
                user_id.as_uuid(),
                new_transaction.category_id,
                new_transaction.type_,
                new_transaction.amount,
                new_transaction.description,
                to_millis(new_transaction.date),
                to_millis(now()),
            ),
            map_transaction_row,
        )
        .map_err(map_foreign_key_error)?;

    Ok(transaction)
}

/// Retrieve the transaction `id` if it is owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, category_id, type, amount, description, date, created_at
             FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        )?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_uuid())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id BLOB PRIMARY KEY,
                user_id BLOB NOT NULL,
                category_id BLOB NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
                amount REAL NOT NULL CHECK (amount > 0),
                description TEXT NOT NULL,
                date INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON DELETE RESTRICT
                )",
        (),
    )?;

    // Every listing filters by owner and sorts by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// Expects the columns in the order id, user_id, category_id, type, amount,
/// description, date, created_at.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let category_id = row.get(2)?;
    let type_ = row.get(3)?;
    let amount = row.get(4)?;
    let description = row.get(5)?;
    let date = get_timestamp(row, 6)?;
    let created_at = get_timestamp(row, 7)?;

    Ok(Transaction {
        id,
        user_id,
        category_id,
        type_,
        amount,
        description,
        date,
        created_at,
    })
}

pub(crate) fn map_foreign_key_error(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::UnknownCategory,
        error => error.into(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod validation_tests {
    use crate::Error;

    use super::{MAX_DESCRIPTION_LENGTH, validate_amount, validate_description};

    #[test]
    fn amount_must_be_positive() {
        assert_eq!(validate_amount(42.5), Ok(42.5));
        assert_eq!(validate_amount(0.0), Err(Error::NonPositiveAmount));
        assert_eq!(validate_amount(-1.0), Err(Error::NonPositiveAmount));
    }

    #[test]
    fn amount_must_be_finite() {
        assert_eq!(validate_amount(f64::INFINITY), Err(Error::NonPositiveAmount));
        assert_eq!(validate_amount(f64::NAN), Err(Error::NonPositiveAmount));
    }

    #[test]
    fn description_is_trimmed() {
        assert_eq!(validate_description("  Coffee\n"), Ok("Coffee".to_owned()));
    }

    #[test]
    fn description_must_not_be_blank() {
        assert_eq!(validate_description(" \t"), Err(Error::EmptyDescription));
    }

    #[test]
    fn description_length_is_limited() {
        let at_limit = "é".repeat(MAX_DESCRIPTION_LENGTH);
        let too_long = "a".repeat(MAX_DESCRIPTION_LENGTH + 1);

        assert!(validate_description(&at_limit).is_ok());
        assert_eq!(
            validate_description(&too_long),
            Err(Error::DescriptionTooLong)
        );
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::datetime;
    use uuid::Uuid;

    use crate::{
        Error, TransactionType,
        auth::{PasswordHash, User, create_user},
        category::{Category, CategoryName, NewCategory, create_category},
        db::initialize,
        transaction::{NewTransaction, create_transaction, get_transaction},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(email: &str, connection: &Connection) -> User {
        create_user(
            "Test",
            email,
            &PasswordHash::new_unchecked("hunter2"),
            connection,
        )
        .unwrap()
    }

    fn create_test_category(user: &User, connection: &Connection) -> Category {
        create_category(
            user.id,
            NewCategory {
                name: CategoryName::new_unchecked("Groceries"),
                type_: TransactionType::Expense,
            },
            connection,
        )
        .unwrap()
    }

    fn new_transaction(category: &Category, amount: f64) -> NewTransaction {
        NewTransaction {
            category_id: category.id,
            type_: TransactionType::Expense,
            amount,
            description: "Weekly shop".to_owned(),
            date: datetime!(2025-10-27 09:30 UTC),
        }
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", &conn);
        let category = create_test_category(&user, &conn);

        let transaction =
            create_transaction(user.id, new_transaction(&category, 42.5), &conn).unwrap();

        assert_eq!(transaction.user_id, user.id);
        assert_eq!(transaction.category_id, category.id);
        assert_eq!(transaction.amount, 42.5);
        assert_eq!(transaction.description, "Weekly shop");
        assert_eq!(transaction.date, datetime!(2025-10-27 09:30 UTC));
        assert_eq!(
            get_transaction(transaction.id, user.id, &conn),
            Ok(transaction)
        );
    }

    #[test]
    fn create_fails_on_unknown_category() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", &conn);
        let mut transaction = new_transaction(&create_test_category(&user, &conn), 1.0);
        transaction.category_id = Uuid::new_v4();

        let result = create_transaction(user.id, transaction, &conn);

        assert_eq!(result, Err(Error::UnknownCategory));
    }

    #[test]
    fn get_hides_other_users_transactions() {
        let conn = get_test_connection();
        let alice = create_test_user("alice@example.com", &conn);
        let bob = create_test_user("bob@example.com", &conn);
        let category = create_test_category(&alice, &conn);
        let transaction =
            create_transaction(alice.id, new_transaction(&category, 10.0), &conn).unwrap();

        assert_eq!(
            get_transaction(transaction.id, bob.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn category_in_use_cannot_be_deleted() {
        let conn = get_test_connection();
        let user = create_test_user("alice@example.com", &conn);
        let category = create_test_category(&user, &conn);
        create_transaction(user.id, new_transaction(&category, 10.0), &conn).unwrap();

        let result = conn.execute("DELETE FROM category WHERE id = ?1", [category.id]);

        assert!(result.is_err());
    }
}
