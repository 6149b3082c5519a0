use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::job::Job;
use crate::store::{Collection, RecordStore};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewJob {
    pub title: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub description: String,
}

/// Appends a listing posted by the administrator `posted_by`. The id is the
/// creation time in milliseconds; two listings created in the same millisecond
/// share an id.
pub async fn add_job(store: &RecordStore, new_job: NewJob, posted_by: &str) -> Result<Job, AppError> {
    let job = Job {
        id: chrono::Utc::now().timestamp_millis().to_string(),
        title: new_job.title,
        location: new_job.location,
        job_type: new_job.job_type,
        description: new_job.description,
    };

    store.append(Collection::Jobs, job.clone()).await?;
    info!("{posted_by} added job {} ({})", job.id, job.title);
    Ok(job)
}

/// All listings, oldest first.
pub async fn list_jobs(store: &RecordStore) -> Vec<Job> {
    store.load(Collection::Jobs).await
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const ADMIN: &str = "admin@example.com";

    fn driver() -> NewJob {
        NewJob {
            title: "Driver".to_string(),
            location: "City".to_string(),
            job_type: "Full-time".to_string(),
            description: "desc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();

        let created = add_job(&store, driver(), ADMIN).await.unwrap();
        let jobs = list_jobs(&store).await;

        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert!(!job.id.is_empty());
        assert!(job.id.parse::<i64>().is_ok());
        assert_eq!(job.id, created.id);
        assert_eq!(job.title, "Driver");
        assert_eq!(job.location, "City");
        assert_eq!(job.job_type, "Full-time");
        assert_eq!(job.description, "desc");
    }

    #[tokio::test]
    async fn test_listing_keeps_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();

        for title in ["first", "second", "third"] {
            add_job(
                &store,
                NewJob {
                    title: title.to_string(),
                    ..driver()
                },
                ADMIN,
            )
            .await
            .unwrap();
        }

        let titles: Vec<_> = list_jobs(&store)
            .await
            .into_iter()
            .map(|j| j.title)
            .collect();
        assert_eq!(titles, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_stored_json_uses_type_key() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();
        add_job(&store, driver(), ADMIN).await.unwrap();

        let raw = std::fs::read_to_string(store.path(Collection::Jobs)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["type"], "Full-time");
    }
}
