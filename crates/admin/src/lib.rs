//! Juniper Row Admin library.
//!
//! This crate provides the back-office functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! This crate drives the order lifecycle for the whole store: status
//! transitions, bulk operations, and customer data. Only deploy it on
//! network-restricted infrastructure behind the admin auth layer.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
