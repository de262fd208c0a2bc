//! # TaskHub Shared Library
//!
//! Types and logic shared by the TaskHub API server and its tests.
//!
//! ## Module Organization
//!
//! - `auth`: credential issuance, the token gate and the email-match guard
//! - `models`: user and task documents
//! - `store`: the document store trait with PostgreSQL and in-memory backends
//! - `db`: connection pool and migrations for the PostgreSQL backend

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
