//! Web front end: routing, request actions, and page rendering.

pub mod action;
mod server;
pub mod templates;

pub use server::{AppState, CSRF_HEADER, router, start_server};
