//! The overview page that signed in users land on.

use std::collections::HashMap;

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::macros::format_description;

use crate::{
    Error,
    app_state::DbState,
    auth::CurrentSession,
    category::{Category, CategoryId, get_categories_for_user},
    db::lock_connection,
    endpoints,
    error_pages::get_internal_server_error_page,
    html::{
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_amount, link,
    },
    transaction::{Transaction, get_recent_transactions},
};

/// How many transactions to show on the overview.
const RECENT_TRANSACTION_LIMIT: u32 = 10;

/// Display a page with the user's categories and their most recent transactions.
pub async fn get_dashboard_page(
    Extension(session): Extension<CurrentSession>,
    State(state): State<DbState>,
) -> Response {
    let (categories, transactions) = match load_overview(&session, &state) {
        Ok(overview) => overview,
        Err(error) => {
            tracing::error!("Could not load the overview page: {error}");
            return get_internal_server_error_page();
        }
    };

    dashboard_view(&session.0.user.name, &categories, &transactions).into_response()
}

fn load_overview(
    session: &CurrentSession,
    state: &DbState,
) -> Result<(Vec<Category>, Vec<Transaction>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let categories = get_categories_for_user(session.user_id(), &connection)?;
    let transactions =
        get_recent_transactions(session.user_id(), RECENT_TRANSACTION_LIMIT, &connection)?;

    Ok((categories, transactions))
}

fn dashboard_view(user_name: &str, categories: &[Category], transactions: &[Transaction]) -> Markup {
    let category_names: HashMap<CategoryId, &str> = categories
        .iter()
        .map(|category| (category.id, category.name.as_ref()))
        .collect();
    let date_format = format_description!("[year]-[month]-[day]");

    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between w-full max-w-screen-lg mb-6"
            {
                h1 class="text-2xl font-bold" { "Welcome, " (user_name) }
                (link(endpoints::SIGN_OUT_VIEW, "Sign out"))
            }

            section class="w-full max-w-screen-lg mb-8"
            {
                h2 class="text-xl font-semibold mb-4" { "Categories" }

                @if categories.is_empty() {
                    p id="no-categories" { "No categories yet." }
                } @else {
                    ul id="categories" class="flex flex-wrap gap-2"
                    {
                        @for category in categories {
                            li class="px-3 py-1 rounded bg-gray-200 dark:bg-gray-700"
                            {
                                (category.name) " (" (category.type_) ")"
                            }
                        }
                    }
                }
            }

            section class="w-full max-w-screen-lg"
            {
                h2 class="text-xl font-semibold mb-4" { "Recent Transactions" }

                @if transactions.is_empty() {
                    p id="no-transactions" { "No transactions yet." }
                } @else {
                    table id="transactions" class="w-full text-sm text-left"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (transaction.date.format(&date_format).unwrap_or_default())
                                    }
                                    td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (category_names.get(&transaction.category_id).copied().unwrap_or("Unknown"))
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (format_amount(transaction.amount, transaction.type_))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Overview", &content)
}
