//! # TaskHub API Server Library
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration management
//! - `error`: error handling and HTTP response mapping
//! - `middleware`: token gate and email-match guard layers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
