//! The endpoint for listing the current user's transactions.

use axum::{Json, extract::State};

use crate::{
    Error,
    app_state::DbState,
    auth::CurrentSession,
    db::lock_connection,
    transaction::{Transaction, TransactionFilters, get_transactions},
    validation::ApiQuery,
};

/// A route handler that returns the signed in user's transactions, newest
/// first, narrowed by the optional `startDate`, `endDate` and `categoryId`
/// query parameters.
pub async fn list_transactions_endpoint(
    session: CurrentSession,
    State(state): State<DbState>,
    ApiQuery(filters): ApiQuery<TransactionFilters>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let query = filters.parse()?;

    let connection = lock_connection(&state.db_connection)?;

    get_transactions(session.user_id(), &query, &connection).map(Json)
}
