//! The endpoint for deleting a transaction and the response to requests without an ID.

use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::Connection;
use uuid::Uuid;

use crate::{
    Acknowledgement, Error, app_state::DbState, auth::CurrentSession, auth::UserId,
    db::lock_connection, transaction::TransactionId,
};

/// A route handler for deleting a transaction owned by the signed in user.
///
/// Responds with `{"success": true}`, or 404 if the transaction does not exist
/// or belongs to someone else.
pub async fn delete_transaction_endpoint(
    session: CurrentSession,
    State(state): State<DbState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Acknowledgement>, Error> {
    let transaction_id =
        Uuid::parse_str(&transaction_id).map_err(|_| Error::DeleteMissingTransaction)?;

    let connection = lock_connection(&state.db_connection)?;

    match delete_transaction(transaction_id, session.user_id(), &connection)? {
        0 => Err(Error::DeleteMissingTransaction),
        _ => {
            tracing::debug!(
                "User {} deleted transaction {transaction_id}",
                session.user_id()
            );
            Ok(Json(Acknowledgement::SUCCESS))
        }
    }
}

/// A route handler for update and delete requests that left out the
/// transaction ID, e.g. `DELETE /api/transactions/`.
pub async fn missing_transaction_id_endpoint(_session: CurrentSession) -> Error {
    Error::MissingTransactionId
}

type RowsAffected = usize;

fn delete_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
            &[(":id", &id), (":user_id", &user_id.as_uuid())],
        )
        .map_err(|err| err.into())
}
