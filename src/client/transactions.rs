//! Client-side state for the signed in user's transactions.

use tokio::sync::watch;

use crate::{
    NewTransaction, Transaction, TransactionFilters,
    client::{ApiClient, ClientError, ResourceState, resource::ResourceStore},
    endpoints,
    transaction::TransactionForm,
};

/// Holds the user's transactions and the status of the last request.
#[derive(Debug)]
pub struct TransactionsStore {
    api: ApiClient,
    store: ResourceStore<Transaction>,
}

impl TransactionsStore {
    /// Create an empty store that talks to the server through `api`.
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: ResourceStore::new(),
        }
    }

    /// Watch the transactions, loading flag and error message for changes.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Transaction>> {
        self.store.subscribe()
    }

    /// A copy of the current state.
    pub fn state(&self) -> ResourceState<Transaction> {
        self.store.snapshot()
    }

    /// Replace the local list with the transactions on the server that match
    /// `filters`.
    ///
    /// Empty filters are left out of the query string. Failures are recorded
    /// in the state rather than returned.
    pub async fn fetch_transactions(&self, filters: &TransactionFilters) {
        self.store
            .fetch(
                "transactions",
                self.api
                    .get_with_query::<Vec<Transaction>, _>(endpoints::TRANSACTIONS_API, filters),
            )
            .await;
    }

    /// Record a transaction and append it to the local list.
    ///
    /// # Errors
    ///
    /// Returns the [ClientError] from the server, which is also recorded in the state.
    pub async fn create_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, ClientError> {
        let form = TransactionForm::from(transaction);

        self.store
            .create(
                "transaction",
                self.api
                    .post::<Transaction, _>(endpoints::TRANSACTIONS_API, &form),
            )
            .await
    }
}
