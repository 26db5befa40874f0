// CV Store: one structured resume document per account, written with
// full-replace semantics.

pub mod handlers;
pub mod models;
pub mod repo;
