use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    /// Creation time in Unix milliseconds, as a string.
    pub id: String,
    pub title: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub description: String,
}
