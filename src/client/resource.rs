//! The reactive state shared by the resource stores.

use std::future::Future;

use tokio::sync::watch;

use crate::client::ClientError;

/// A list fetched from the API along with the status of the last request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    /// The items from the last successful fetch, plus any created since.
    pub items: Vec<T>,
    /// Whether a request is in flight.
    pub loading: bool,
    /// The message of the last failed request, cleared when a new request starts.
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

/// Clears the loading flag when dropped, so that it is reset on every exit
/// path including cancellation.
struct LoadingGuard<'a, T> {
    state: &'a watch::Sender<ResourceState<T>>,
}

impl<'a, T> LoadingGuard<'a, T> {
    fn start(state: &'a watch::Sender<ResourceState<T>>) -> Self {
        state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        Self { state }
    }
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        self.state.send_modify(|state| state.loading = false);
    }
}

/// The fetch and create logic shared by the category and transaction stores.
#[derive(Debug)]
pub(crate) struct ResourceStore<T> {
    state: watch::Sender<ResourceState<T>>,
}

impl<T: Clone> ResourceStore<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: watch::Sender::new(ResourceState::default()),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    pub(crate) fn snapshot(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    /// Replace the items with the result of `request`, or record its error.
    pub(crate) async fn fetch<F>(&self, resource_name: &str, request: F)
    where
        F: Future<Output = Result<Vec<T>, ClientError>>,
    {
        let _loading = LoadingGuard::start(&self.state);

        match request.await {
            Ok(items) => self.state.send_modify(|state| state.items = items),
            Err(error) => {
                tracing::error!("Error fetching {resource_name}: {error}");
                self.record_error(&error);
            }
        }
    }

    /// Append the result of `request` to the items, or record and return its error.
    pub(crate) async fn create<F>(&self, resource_name: &str, request: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let _loading = LoadingGuard::start(&self.state);

        match request.await {
            Ok(item) => {
                self.state
                    .send_modify(|state| state.items.push(item.clone()));
                Ok(item)
            }
            Err(error) => {
                tracing::error!("Error creating {resource_name}: {error}");
                self.record_error(&error);
                Err(error)
            }
        }
    }

    fn record_error(&self, error: &ClientError) {
        let message = error.to_string();
        self.state.send_modify(|state| state.error = Some(message));
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;

    use crate::client::ClientError;

    use super::{ResourceState, ResourceStore};

    fn api_error(message: &str) -> ClientError {
        ClientError::Api {
            status: 500,
            message: message.to_owned(),
            fields: None,
        }
    }

    #[tokio::test]
    async fn fetch_replaces_items() {
        let store = ResourceStore::new();

        store.fetch("numbers", async { Ok(vec![1, 2]) }).await;
        store.fetch("numbers", async { Ok(vec![3]) }).await;

        assert_eq!(
            store.snapshot(),
            ResourceState {
                items: vec![3],
                loading: false,
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn fetch_failure_keeps_items_and_records_error() {
        let store = ResourceStore::new();
        store.fetch("numbers", async { Ok(vec![1]) }).await;

        store
            .fetch("numbers", async { Err(api_error("Server is down")) })
            .await;

        let state = store.snapshot();
        assert_eq!(state.items, vec![1]);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Server is down"));
    }

    #[tokio::test]
    async fn new_request_clears_previous_error() {
        let store = ResourceStore::new();
        store
            .fetch("numbers", async { Err::<Vec<i32>, _>(api_error("oops")) })
            .await;

        store.fetch("numbers", async { Ok(vec![1]) }).await;

        assert_eq!(store.snapshot().error, None);
    }

    #[tokio::test]
    async fn create_appends_and_returns_item() {
        let store = ResourceStore::new();
        store.fetch("numbers", async { Ok(vec![1]) }).await;

        let got = store.create("number", async { Ok(2) }).await;

        assert_eq!(got.unwrap(), 2);
        assert_eq!(store.snapshot().items, vec![1, 2]);
    }

    #[tokio::test]
    async fn create_failure_is_recorded_and_returned() {
        let store = ResourceStore::<i32>::new();

        let got = store.create("number", async { Err(api_error("Nope")) }).await;

        assert!(matches!(got, Err(ClientError::Api { .. })));
        let state = store.snapshot();
        assert!(state.items.is_empty());
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Nope"));
    }

    #[tokio::test]
    async fn loading_is_set_while_in_flight_and_reset_on_cancel() {
        let store = ResourceStore::<i32>::new();
        let mut receiver = store.subscribe();

        {
            let fetch = store.fetch("numbers", pending());
            tokio::pin!(fetch);
            tokio::select! {
                _ = &mut fetch => unreachable!("pending never completes"),
                changed = receiver.changed() => changed.unwrap(),
            }
            assert!(receiver.borrow_and_update().loading);
        }

        assert!(!store.snapshot().loading);
    }
}
