//! The endpoint for creating categories.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    Error,
    app_state::DbState,
    auth::CurrentSession,
    category::{Category, CategoryForm, create_category},
    db::lock_connection,
    validation::ApiJson,
};

/// Validate the request body and create a category owned by the signed in user.
pub async fn create_category_endpoint(
    session: CurrentSession,
    State(state): State<DbState>,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let new_category = form.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(session.user_id(), new_category, &connection)?;
    tracing::debug!("User {} created category {}", session.user_id(), category.id);

    Ok((StatusCode::CREATED, Json(category)))
}
