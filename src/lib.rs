//! todo-board library
//!
//! Storage, ordering, and web components of the task board, exported for
//! the binary and for integration tests.

pub mod cli;
pub mod config;
pub mod csrf;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod service;
pub mod session;
pub mod types;
pub mod validation;
pub mod web;
