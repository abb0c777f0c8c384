//! Multipart file extraction.
//!
//! Upload routes replace body validation with file extraction: the route
//! declares a map of [`FileFieldConfig`]s, and the pipeline walks the
//! multipart form pulling the named fields. Absent-but-required, oversized,
//! and disallowed-MIME fields fail with field-specific errors; undeclared
//! form fields are ignored.

use std::collections::HashMap;

use axum::extract::multipart::Multipart;
use bytes::Bytes;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// One uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct FileField {
    /// The form field name.
    pub name: String,
    /// The declared MIME type of the part.
    pub mime_type: String,
    /// Size of the buffered content in bytes.
    pub size_bytes: usize,
    /// The file content.
    pub buffer: Bytes,
}

/// Declaration for one expected file field.
#[derive(Debug, Clone, Default)]
pub struct FileFieldConfig {
    /// Whether the field must be present.
    pub required: bool,
    /// Per-field size limit; the configured gateway maximum applies when
    /// unset.
    pub max_size_bytes: Option<usize>,
    /// Allowed MIME types. `None` accepts anything; entries may be exact
    /// (`image/png`) or a type wildcard (`image/*`).
    pub allowed_mime_types: Option<Vec<String>>,
}

impl FileFieldConfig {
    /// A required file field.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    /// An optional file field.
    pub fn optional() -> Self {
        Self::default()
    }

    /// Sets the per-field size limit.
    pub fn max_size(mut self, bytes: usize) -> Self {
        self.max_size_bytes = Some(bytes);
        self
    }

    /// Restricts the field to the given MIME types.
    pub fn mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_mime_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    fn allows(&self, mime_type: &str) -> bool {
        let Some(allowed) = &self.allowed_mime_types else {
            return true;
        };
        allowed.iter().any(|candidate| {
            if let Some(prefix) = candidate.strip_suffix("/*") {
                mime_type.split('/').next() == Some(prefix)
            } else {
                candidate == mime_type
            }
        })
    }
}

/// Walks the multipart form and extracts the declared fields.
///
/// `default_max` bounds fields without their own limit.
pub async fn extract_files(
    mut multipart: Multipart,
    configs: &HashMap<String, FileFieldConfig>,
    default_max: usize,
) -> GatewayResult<HashMap<String, FileField>> {
    let mut found: HashMap<String, FileField> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| GatewayError::validation(format!("Malformed multipart body: {err}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let Some(config) = configs.get(&name) else {
            // Undeclared fields are skipped, not errors.
            continue;
        };

        let mime_type = field
            .content_type()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM.as_ref())
            .to_string();
        if !config.allows(&mime_type) {
            return Err(GatewayError::InvalidFileType {
                field: name,
                mime_type,
            });
        }

        let limit = config.max_size_bytes.unwrap_or(default_max);
        let buffer = field
            .bytes()
            .await
            .map_err(|err| GatewayError::validation(format!("Unreadable file field: {err}")))?;
        if buffer.len() > limit {
            return Err(GatewayError::FileTooLarge {
                field: name,
                limit_bytes: limit,
            });
        }

        debug!(field = %name, mime = %mime_type, size = buffer.len(), "extracted file field");
        found.insert(
            name.clone(),
            FileField {
                name,
                mime_type,
                size_bytes: buffer.len(),
                buffer,
            },
        );
    }

    for (name, config) in configs {
        if config.required && !found.contains_key(name) {
            return Err(GatewayError::MissingFile {
                field: name.clone(),
            });
        }
    }

    Ok(found)
}
