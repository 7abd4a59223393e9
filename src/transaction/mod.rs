//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the validation of client supplied fields
//! - Database functions for storing, querying, and managing transactions
//! - The JSON API handlers, all of which are scoped to the signed in user

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod list_endpoint;
mod query;

pub use core::{
    MAX_DESCRIPTION_LENGTH, NewTransaction, Transaction, TransactionId, create_transaction,
    create_transaction_table, get_transaction, map_transaction_row, validate_amount,
    validate_description,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::{delete_transaction_endpoint, missing_transaction_id_endpoint};
pub use edit_endpoint::{update_transaction, update_transaction_endpoint};
pub use form::TransactionForm;
pub use list_endpoint::list_transactions_endpoint;
pub use query::{TransactionFilters, TransactionQuery, get_recent_transactions, get_transactions};
