use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::upload::StoredFile;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Application {
    /// Not checked against the job catalog.
    pub job_id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub id_number: String,
    #[serde(deserialize_with = "deserialize_files")]
    pub files: BTreeMap<String, StoredFile>,
}

/// Older data files hold one array of upload descriptors per field.
#[derive(Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Stored(StoredFile),
    Legacy(Vec<LegacyFile>),
}

#[derive(Deserialize)]
struct LegacyFile {
    fieldname: String,
    originalname: String,
    filename: String,
    size: u64,
    mimetype: String,
}

impl From<LegacyFile> for StoredFile {
    fn from(f: LegacyFile) -> Self {
        StoredFile {
            field_name: f.fieldname,
            original_name: f.originalname,
            filename: f.filename,
            size: f.size,
            mime_type: f.mimetype,
        }
    }
}

fn deserialize_files<'de, D>(deserializer: D) -> Result<BTreeMap<String, StoredFile>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, FileEntry>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(field, entry)| match entry {
            FileEntry::Stored(file) => Some((field, file)),
            FileEntry::Legacy(files) => files.into_iter().next().map(|f| (field, f.into())),
        })
        .collect())
}
