//! Core business logic for vidtube.

pub mod services;
pub mod views;

pub use services::*;
