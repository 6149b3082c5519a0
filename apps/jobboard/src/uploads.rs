use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::upload::StoredFile;
use crate::store::StoreError;

/// Saves attachments under random names in one flat directory.
pub struct UploadRelay {
    dir: PathBuf,
}

impl UploadRelay {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        info!("Upload directory ready at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Writes `data` to a new file and returns the reference to embed in a
    /// record. The stored name never carries the original extension.
    pub async fn store(
        &self,
        field_name: &str,
        original_name: &str,
        mime_type: &str,
        data: Bytes,
    ) -> Result<StoredFile, StoreError> {
        let filename = Uuid::new_v4().simple().to_string();
        let path = self.path(&filename);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(&data).await?;
        file.flush().await?;

        debug!(
            "Stored upload {field_name}/{original_name} as {filename} ({} bytes)",
            data.len()
        );

        Ok(StoredFile {
            field_name: field_name.to_string(),
            original_name: original_name.to_string(),
            filename,
            size: data.len() as u64,
            mime_type: mime_type.to_string(),
        })
    }
}
