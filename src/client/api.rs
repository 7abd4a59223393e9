//! A thin JSON client for the finance tracker API.

use reqwest::{Client, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};

use crate::{ErrorBody, FieldErrors};

/// The errors that may occur when calling the API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server rejected the request.
    #[error("{message}")]
    Api {
        /// The HTTP status code of the response.
        status: u16,
        /// The server's description of the error.
        message: String,
        /// Which fields failed validation, if any.
        fields: Option<FieldErrors>,
    },

    /// The request could not be sent or the response could not be decoded.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    /// The HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(error) => error.status().map(|status| status.as_u16()),
        }
    }
}

/// An HTTP client for one server that keeps the session cookie between requests.
///
/// Cloning the client shares its cookie store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the server at `base_url`, e.g. "http://localhost:3000".
    ///
    /// # Errors
    ///
    /// Returns [ClientError::Http] if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().cookie_store(true).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();

        Ok(Self { http, base_url })
    }

    /// The address of the server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        send(self.http.get(self.url(path))).await
    }

    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        send(self.http.get(self.url(path)).query(query)).await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        send(self.http.post(self.url(path)).json(body)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let text = response.text().await?;
    let error = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ClientError::Api {
            status: body.status_code,
            message: body.status_message,
            fields: body.data,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .map(str::to_owned)
                .unwrap_or_else(|| text.clone()),
            fields: None,
        },
    };

    Err(error)
}
