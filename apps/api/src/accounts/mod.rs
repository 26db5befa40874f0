// Account Service: profile read/update/delete for the resolved account,
// plus name-only account creation.

pub mod handlers;
pub mod repo;
pub mod service;
