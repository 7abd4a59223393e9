//! Users, sessions and the handlers for signing up, in and out.

mod cookie;
mod current_session;
mod get_session;
mod middleware;
mod password;
mod session;
mod sign_in;
mod sign_out;
mod sign_up;
mod user;

pub use current_session::{AuthState, CurrentSession, get_session_from_jar};
pub use get_session::get_session;
pub use middleware::route_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use session::{Session, SessionData, SessionToken, create_session, create_session_table};
pub use sign_in::{SignInRequest, get_sign_in_page, post_sign_in_api, post_sign_in_form};
pub use sign_out::{get_sign_out, post_sign_out_api};
pub use sign_up::{SignUpRequest, get_sign_up_page, post_sign_up_api, post_sign_up_form};
pub use user::{User, UserId, create_user, create_user_table};

#[cfg(test)]
pub(crate) use cookie::{COOKIE_SESSION_TOKEN, set_session_cookie};
