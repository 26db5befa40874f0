pub mod account;
pub mod cv;
pub mod login_session;
