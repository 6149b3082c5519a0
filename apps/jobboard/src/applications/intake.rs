use std::collections::BTreeMap;

use tracing::info;

use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::upload::StoredFile;
use crate::store::{Collection, RecordStore};

/// File fields accepted on an application, at most one file each.
pub const APPLICATION_FILE_FIELDS: &[&str] = &["idCard", "license", "schoolCert"];

#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub job_id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub id_number: String,
    pub files: BTreeMap<String, StoredFile>,
}

/// Appends an application. The job id is stored as given.
pub async fn submit(store: &RecordStore, submission: Submission) -> Result<Application, AppError> {
    let application = Application {
        job_id: submission.job_id,
        name: submission.name,
        address: submission.address,
        phone: submission.phone,
        id_number: submission.id_number,
        files: submission.files,
    };

    store
        .append(Collection::Applications, application.clone())
        .await?;
    info!(
        "Received application for job {} with {} file(s)",
        application.job_id,
        application.files.len()
    );
    Ok(application)
}

pub async fn list_applications(store: &RecordStore) -> Vec<Application> {
    store.load(Collection::Applications).await
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_submit_does_not_check_job_exists() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();

        submit(
            &store,
            Submission {
                job_id: "X".to_string(),
                name: "Ana".to_string(),
                address: "Main St".to_string(),
                phone: "555".to_string(),
                id_number: "ID1".to_string(),
                files: BTreeMap::new(),
            },
        )
        .await
        .unwrap();

        let apps = list_applications(&store).await;
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].job_id, "X");
        assert!(apps[0].files.is_empty());
    }

    #[tokio::test]
    async fn test_submit_keeps_file_references() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();

        let mut files = BTreeMap::new();
        files.insert(
            "license".to_string(),
            StoredFile {
                field_name: "license".to_string(),
                original_name: "license.pdf".to_string(),
                filename: "a1b2c3".to_string(),
                size: 12,
                mime_type: "application/pdf".to_string(),
            },
        );
        submit(
            &store,
            Submission {
                job_id: "1".to_string(),
                files,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let apps = list_applications(&store).await;
        assert_eq!(apps[0].files["license"].filename, "a1b2c3");
    }
}
