//! HTTP middleware: session layer and auth extractors.

pub mod auth;
pub mod session;
