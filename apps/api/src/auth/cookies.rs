use axum_extra::extract::cookie::{Cookie, SameSite};

pub const SESSION_COOKIE: &str = "session";
pub const ID_TOKEN_COOKIE: &str = "id_token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// The state cookie only has to survive the round-trip to the provider.
const OAUTH_STATE_TTL_SECS: i64 = 600;

/// Builds an http-only cookie carrying a credential.
pub fn credential_cookie(
    name: &'static str,
    value: String,
    ttl_secs: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}

pub fn oauth_state_cookie(state: String, secure: bool) -> Cookie<'static> {
    credential_cookie(OAUTH_STATE_COOKIE, state, OAUTH_STATE_TTL_SECS, secure)
}

/// A cookie matching `name` on `/`, for use with `CookieJar::remove`.
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}
