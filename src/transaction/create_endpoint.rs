//! The endpoint for recording a new transaction.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    Error,
    app_state::DbState,
    auth::CurrentSession,
    db::lock_connection,
    transaction::{Transaction, TransactionForm, create_transaction},
    validation::ApiJson,
};

/// A route handler for creating a transaction owned by the signed in user.
///
/// Responds with `201 Created` and the stored transaction.
pub async fn create_transaction_endpoint(
    session: CurrentSession,
    State(state): State<DbState>,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let new_transaction = form.validate_for_user(session.user_id(), &connection)?;

    let transaction = create_transaction(session.user_id(), new_transaction, &connection)?;
    tracing::debug!(
        "User {} created transaction {}",
        session.user_id(),
        transaction.id
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

    use crate::{
        ErrorBody, Transaction, TransactionType, build_router, endpoints,
        test_utils::{create_test_category, get_test_app_state, sign_up_test_user},
    };

    #[tokio::test]
    async fn create_transaction_in_future_then_filter_by_date() {
        let state = get_test_app_state();
        let (user, cookie) = sign_up_test_user(&state, "alice@example.com");
        let category = create_test_category(&state, user.id, "Groceries", TransactionType::Expense);
        let server = TestServer::new(build_router(state)).unwrap();
        let date = OffsetDateTime::now_utc() + Duration::days(30);

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(cookie.clone())
            .json(&json!({
                "categoryId": category.id,
                "type": "expense",
                "amount": 42.50,
                "description": "Weekly shop",
                "date": date.format(&Rfc3339).unwrap(),
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let transaction = response.json::<Transaction>();
        assert_eq!(transaction.user_id, user.id);
        assert_eq!(transaction.category_id, category.id);
        assert_eq!(transaction.amount, 42.50);

        let day = date.date().to_string();
        let matching = server
            .get(endpoints::TRANSACTIONS_API)
            .add_query_params(json!({"startDate": day, "endDate": day}))
            .add_cookie(cookie.clone())
            .await
            .json::<Vec<Transaction>>();
        assert_eq!(matching, vec![transaction]);

        let past = (date - Duration::days(60)).date().to_string();
        let not_matching = server
            .get(endpoints::TRANSACTIONS_API)
            .add_query_params(json!({"startDate": past, "endDate": past}))
            .add_cookie(cookie)
            .await
            .json::<Vec<Transaction>>();
        assert!(not_matching.is_empty());
    }

    #[tokio::test]
    async fn create_fails_on_non_positive_amount() {
        let state = get_test_app_state();
        let (user, cookie) = sign_up_test_user(&state, "alice@example.com");
        let category = create_test_category(&state, user.id, "Groceries", TransactionType::Expense);
        let server = TestServer::new(build_router(state)).unwrap();

        for amount in [0.0, -12.0] {
            let response = server
                .post(endpoints::TRANSACTIONS_API)
                .add_cookie(cookie.clone())
                .json(&json!({
                    "categoryId": category.id,
                    "type": "expense",
                    "amount": amount,
                    "description": "Refund?",
                    "date": "2025-10-27T09:30:00Z",
                }))
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let body = response.json::<ErrorBody>();
            assert_eq!(
                body.data.unwrap().get("amount").unwrap().message,
                "Amount must be positive"
            );
        }
    }

    #[tokio::test]
    async fn create_fails_on_empty_description() {
        let state = get_test_app_state();
        let (user, cookie) = sign_up_test_user(&state, "alice@example.com");
        let category = create_test_category(&state, user.id, "Groceries", TransactionType::Expense);
        let server = TestServer::new(build_router(state)).unwrap();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(cookie)
            .json(&json!({
                "categoryId": category.id,
                "type": "expense",
                "amount": 5,
                "description": "",
                "date": "2025-10-27T09:30:00Z",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(
            response
                .json::<ErrorBody>()
                .data
                .unwrap()
                .get("description")
                .is_some()
        );
    }

    #[tokio::test]
    async fn create_fails_on_other_users_category() {
        let state = get_test_app_state();
        let (bob, _) = sign_up_test_user(&state, "bob@example.com");
        let (_, alice_cookie) = sign_up_test_user(&state, "alice@example.com");
        let bobs_category = create_test_category(&state, bob.id, "Rent", TransactionType::Expense);
        let server = TestServer::new(build_router(state)).unwrap();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(alice_cookie)
            .json(&json!({
                "categoryId": bobs_category.id,
                "type": "expense",
                "amount": 5,
                "description": "Sneaky",
                "date": "2025-10-27T09:30:00Z",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response
                .json::<ErrorBody>()
                .data
                .unwrap()
                .get("categoryId")
                .unwrap()
                .message,
            "Category not found"
        );
    }

    #[tokio::test]
    async fn create_reports_malformed_body() {
        let state = get_test_app_state();
        let (_, cookie) = sign_up_test_user(&state, "alice@example.com");
        let server = TestServer::new(build_router(state)).unwrap();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(cookie)
            .content_type("application/json")
            .bytes("{not json".into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<ErrorBody>().data.unwrap().get("body").is_some());
    }

    #[tokio::test]
    async fn create_requires_session() {
        let server = TestServer::new(build_router(get_test_app_state())).unwrap();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
