use serde::{Deserialize, Serialize};

/// Reference to a file saved by the upload relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub field_name: String,
    pub original_name: String,
    /// Generated name inside the upload directory. Carries no extension.
    pub filename: String,
    pub size: u64,
    pub mime_type: String,
}
