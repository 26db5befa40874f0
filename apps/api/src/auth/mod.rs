// Identity verification, login sessions and the OAuth handshake.

pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod sessions;
