use actix_web::cookie::{time::Duration, Cookie, SameSite};

use crate::auth::token::TOKEN_TTL_DAYS;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// HttpOnly, SameSite=Lax session cookie living as long as the token.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(TOKEN_TTL_DAYS))
        .finish()
}

/// Overwrites the session cookie with an already-expired empty one.
pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .finish()
}
