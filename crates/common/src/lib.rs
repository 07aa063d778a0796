//! Shared utilities for vidtube.
//!
//! This crate provides the pieces every other crate leans on:
//!
//! - **Errors**: the [`AppError`] taxonomy and its HTTP mapping
//! - **Config**: layered file + environment configuration
//! - **IDs**: ULID generation and reference validation
//! - **Tokens**: access/refresh JWT issuance and verification
//! - **Storage**: the object-storage abstraction for media assets
//! - **Pagination**: the page envelope returned by every list endpoint

pub mod auth;
pub mod config;
pub mod error;
pub mod id;
pub mod pagination;
pub mod storage;

pub use auth::TokenIssuer;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::{validate_id, IdGenerator};
pub use pagination::{Page, PageRequest};
pub use storage::{LocalStorage, StorageBackend, UploadedFile};
