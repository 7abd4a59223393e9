//! The endpoint for replacing the fields of an existing transaction.

use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::Connection;
use uuid::Uuid;

use crate::{
    Error,
    app_state::DbState,
    auth::{CurrentSession, UserId},
    db::lock_connection,
    timestamp::to_millis,
    transaction::{
        NewTransaction, Transaction, TransactionForm, TransactionId, core::map_foreign_key_error,
        map_transaction_row,
    },
    validation::ApiJson,
};

/// A route handler for updating a transaction owned by the signed in user.
///
/// Responds with the updated transaction, or 404 if the transaction does not
/// exist or belongs to someone else.
pub async fn update_transaction_endpoint(
    session: CurrentSession,
    State(state): State<DbState>,
    Path(transaction_id): Path<String>,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<Json<Transaction>, Error> {
    // An ID that is not a UUID cannot match any row.
    let transaction_id =
        Uuid::parse_str(&transaction_id).map_err(|_| Error::UpdateMissingTransaction)?;

    let connection = lock_connection(&state.db_connection)?;
    let new_transaction = form.validate_for_user(session.user_id(), &connection)?;

    let transaction = update_transaction(
        transaction_id,
        session.user_id(),
        new_transaction,
        &connection,
    )?;
    tracing::debug!(
        "User {} updated transaction {}",
        session.user_id(),
        transaction.id
    );

    Ok(Json(transaction))
}

/// Replace the mutable fields of the transaction `id` owned by `user_id`.
///
/// The ownership check and the update are a single statement.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if no transaction with `id` is owned by `user_id`,
/// - [Error::UnknownCategory] if the category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserId,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "UPDATE \"transaction\"
             SET category_id = ?1, type = ?2, amount = ?3, description = ?4, date = ?5
             WHERE id = ?6 AND user_id = ?7
             RETURNING id, user_id, category_id, type, amount, description, date, created_at",
        )?
        .query_row(
            (
                new_transaction.category_id,
                new_transaction.type_,
                new_transaction.amount,
                new_transaction.description,
                to_millis(new_transaction.date),
                id,
                user_id.as_uuid(),
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => map_foreign_key_error(error),
        })
}

#[cfg(test)]
mod update_transaction_tests {
    use rusqlite::Connection;
    use time::macros::datetime;
    use uuid::Uuid;

    use crate::{
        Error, TransactionType,
        auth::{PasswordHash, create_user},
        category::{CategoryName, NewCategory, create_category},
        db::initialize,
        transaction::{NewTransaction, create_transaction, get_transaction},
    };

    use super::update_transaction;

    #[test]
    fn update_replaces_fields_and_keeps_owner() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let hash = PasswordHash::new_unchecked("hunter2");
        let user = create_user("Alice", "alice@example.com", &hash, &conn).unwrap();
        let category = create_category(
            user.id,
            NewCategory {
                name: CategoryName::new_unchecked("Salary"),
                type_: TransactionType::Income,
            },
            &conn,
        )
        .unwrap();
        let new_transaction = NewTransaction {
            category_id: category.id,
            type_: TransactionType::Income,
            amount: 10.0,
            description: "Pay".to_owned(),
            date: datetime!(2025-10-01 09:00 UTC),
        };
        let original = create_transaction(user.id, new_transaction.clone(), &conn).unwrap();

        let updated = update_transaction(
            original.id,
            user.id,
            NewTransaction {
                amount: 20.0,
                description: "Bonus".to_owned(),
                ..new_transaction
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.user_id, user.id);
        assert_eq!(updated.amount, 20.0);
        assert_eq!(updated.description, "Bonus");
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(get_transaction(original.id, user.id, &conn), Ok(updated));
    }

    #[test]
    fn update_missing_transaction() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let hash = PasswordHash::new_unchecked("hunter2");
        let user = create_user("Alice", "alice@example.com", &hash, &conn).unwrap();
        let category = create_category(
            user.id,
            NewCategory {
                name: CategoryName::new_unchecked("Salary"),
                type_: TransactionType::Income,
            },
            &conn,
        )
        .unwrap();

        let result = update_transaction(
            Uuid::new_v4(),
            user.id,
            NewTransaction {
                category_id: category.id,
                type_: TransactionType::Income,
                amount: 10.0,
                description: "Pay".to_owned(),
                date: datetime!(2025-10-01 09:00 UTC),
            },
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }
}
