//! Client-side stores for the finance tracker API.
//!
//! Each store wraps a group of endpoints and keeps the latest results in a
//! [tokio::sync::watch] channel so that views can re-render when they change.
//! All stores built from clones of the same [ApiClient] share one session cookie.

mod api;
mod auth;
mod categories;
mod guard;
mod resource;
mod transactions;

pub use api::{ApiClient, ClientError};
pub use auth::{AuthStore, Navigation, SessionListener, SessionSignal};
pub use categories::CategoriesStore;
pub use guard::guard_navigation;
pub use resource::ResourceState;
pub use transactions::TransactionsStore;
