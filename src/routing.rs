//! Application router configuration.

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post, put},
};

use crate::{
    AppState,
    auth::{
        AuthState, get_session, get_sign_in_page, get_sign_out, get_sign_up_page, post_sign_in_api,
        post_sign_in_form, post_sign_out_api, post_sign_up_api, post_sign_up_form, route_guard,
    },
    category::{create_category_endpoint, list_categories_endpoint},
    dashboard::get_dashboard_page,
    endpoints,
    error_pages::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, list_transactions_endpoint,
        missing_transaction_id_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route, including the fallback, sits behind [route_guard]. The API
/// routes are exempt from its redirect and check the session themselves.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_dashboard_page))
        .route(
            endpoints::SIGN_IN_VIEW,
            get(get_sign_in_page).post(post_sign_in_form),
        )
        .route(
            endpoints::SIGN_UP_VIEW,
            get(get_sign_up_page).post(post_sign_up_form),
        )
        .route(endpoints::SIGN_OUT_VIEW, get(get_sign_out));

    let auth_routes = Router::new()
        .route(endpoints::SIGN_UP_API, post(post_sign_up_api))
        .route(endpoints::SIGN_IN_API, post(post_sign_in_api))
        .route(endpoints::SIGN_OUT_API, post(post_sign_out_api))
        .route(endpoints::GET_SESSION_API, get(get_session));

    let resource_routes = Router::new()
        .route(
            endpoints::CATEGORIES_API,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_API,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_API,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_MISSING_ID_API,
            put(missing_transaction_id_endpoint).delete(missing_transaction_id_endpoint),
        );

    page_routes
        .merge(auth_routes)
        .merge(resource_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(
            AuthState::from_ref(&state),
            route_guard,
        ))
        .with_state(state)
}
