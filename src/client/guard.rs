//! Deciding whether client-side navigation needs a session.

use crate::{
    client::{AuthStore, Navigation},
    endpoints::{self, is_auth_exempt},
};

/// Decide whether the client may navigate to `path`.
///
/// Public and API routes are always allowed. Any other route needs a session,
/// which is fetched from the server rather than trusted from the store since
/// it may have expired or been ended elsewhere. If the session cannot be
/// fetched the client is sent to the sign-in page.
pub async fn guard_navigation(auth: &AuthStore, path: &str) -> Navigation {
    if is_auth_exempt(path) {
        return Navigation::Allow;
    }

    match auth.fetch_session().await {
        Ok(Some(_)) => Navigation::Allow,
        Ok(None) => Navigation::Redirect(endpoints::SIGN_IN_VIEW),
        Err(error) => {
            tracing::warn!("Could not check the session before navigating to {path}: {error}");
            Navigation::Redirect(endpoints::SIGN_IN_VIEW)
        }
    }
}
