/// Middleware modules for the API server
///
/// - `auth`: token gate and email-match guard layers

pub mod auth;
