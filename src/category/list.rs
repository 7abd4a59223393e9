//! The endpoint for listing the current user's categories.

use axum::{Json, extract::State};

use crate::{
    Error,
    app_state::DbState,
    auth::CurrentSession,
    category::{Category, get_categories_for_user},
    db::lock_connection,
};

/// Return every category owned by the signed in user, ordered by name.
pub async fn list_categories_endpoint(
    session: CurrentSession,
    State(state): State<DbState>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_categories_for_user(session.user_id(), &connection).map(Json)
}
