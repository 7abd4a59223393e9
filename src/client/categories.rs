//! Client-side state for the signed in user's categories.

use tokio::sync::watch;

use crate::{
    Category, TransactionType,
    category::CategoryForm,
    client::{ApiClient, ClientError, ResourceState, resource::ResourceStore},
    endpoints,
};

/// Holds the user's categories and the status of the last request.
#[derive(Debug)]
pub struct CategoriesStore {
    api: ApiClient,
    store: ResourceStore<Category>,
}

impl CategoriesStore {
    /// Create an empty store that talks to the server through `api`.
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: ResourceStore::new(),
        }
    }

    /// Watch the categories, loading flag and error message for changes.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Category>> {
        self.store.subscribe()
    }

    /// A copy of the current state.
    pub fn state(&self) -> ResourceState<Category> {
        self.store.snapshot()
    }

    /// Replace the local list with the categories on the server.
    ///
    /// Failures are recorded in the state rather than returned.
    pub async fn fetch_categories(&self) {
        self.store
            .fetch(
                "categories",
                self.api.get::<Vec<Category>>(endpoints::CATEGORIES_API),
            )
            .await;
    }

    /// Create a category and append it to the local list.
    ///
    /// # Errors
    ///
    /// Returns the [ClientError] from the server, which is also recorded in the state.
    pub async fn create_category(
        &self,
        name: &str,
        type_: TransactionType,
    ) -> Result<Category, ClientError> {
        let form = CategoryForm {
            name: name.to_owned(),
            type_: type_.to_string(),
        };

        self.store
            .create(
                "category",
                self.api.post::<Category, _>(endpoints::CATEGORIES_API, &form),
            )
            .await
    }
}
