use std::collections::{BTreeMap, HashMap};

use axum::extract::{multipart::MultipartError, Multipart};

use crate::errors::AppError;
use crate::models::upload::StoredFile;
use crate::uploads::UploadRelay;

/// Text fields and stored files decoded from a `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: BTreeMap<String, StoredFile>,
}

impl MultipartForm {
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    pub fn take_or_empty(&mut self, name: &str) -> String {
        self.take(name).unwrap_or_default()
    }
}

/// Reads every part, saving file parts through the upload relay as they arrive.
///
/// Only fields in `file_fields` may carry a file, one file each. Parts with
/// an empty filename are skipped. Files saved before a later part fails stay
/// on disk.
pub async fn read_multipart(
    mut multipart: Multipart,
    uploads: &UploadRelay,
    file_fields: &[&str],
) -> Result<MultipartForm, AppError> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(original_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await.map_err(malformed)?;
            form.fields.insert(name, value);
            continue;
        };

        if original_name.is_empty() {
            continue;
        }
        if !file_fields.contains(&name.as_str()) {
            return Err(AppError::Validation(format!("Unexpected file field '{name}'")));
        }
        if form.files.contains_key(&name) {
            return Err(AppError::Validation(format!(
                "Only one file is accepted for '{name}'"
            )));
        }

        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(malformed)?;
        let stored = uploads.store(&name, &original_name, &mime_type, data).await?;
        form.files.insert(name, stored);
    }

    Ok(form)
}

fn malformed(e: MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart body: {e}"))
}
