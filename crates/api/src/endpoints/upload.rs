//! Multipart staging.
//!
//! Handlers drain the whole form into memory first so a service call
//! sees either all of its files or an error, never a half-read stream.

use std::collections::HashMap;

use axum::extract::Multipart;
use vidtube_common::{AppError, AppResult};
use vidtube_core::StagedFile;

/// A fully drained multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, StagedFile>,
}

impl MultipartForm {
    /// Drain a multipart stream. Fields with a filename become staged
    /// files, the rest become text fields.
    pub async fn stage(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();

            if let Some(file_name) = field.file_name().map(ToString::to_string) {
                let content_type = field
                    .content_type()
                    .map_or_else(|| "application/octet-stream".to_string(), ToString::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .to_vec();
                form.files.insert(
                    name,
                    StagedFile {
                        file_name,
                        content_type,
                        data,
                    },
                );
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// A text field, if present and non-empty.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|s| !s.is_empty())
    }

    /// A required text field.
    pub fn require_text(&self, name: &str) -> AppResult<&str> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing field: {name}")))
    }

    /// Take a staged file out of the form, if present.
    pub fn take_file(&mut self, name: &str) -> Option<StagedFile> {
        self.files.remove(name)
    }

    /// Take a required staged file out of the form.
    pub fn require_file(&mut self, name: &str) -> AppResult<StagedFile> {
        self.take_file(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing file: {name}")))
    }
}
