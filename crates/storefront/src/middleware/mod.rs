//! Request middleware and extractors for the storefront.

pub mod auth;

pub use auth::{CurrentUser, OptionalUser, RequireUser};
