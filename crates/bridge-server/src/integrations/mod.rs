//! Web framework integrations.

#[cfg(feature = "axum-integration")]
pub mod axum;
