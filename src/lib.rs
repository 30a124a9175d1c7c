pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod utils;
pub mod validation;
pub mod web;

pub use web::{create_app, AppState};
