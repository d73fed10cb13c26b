use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

fn default_mime_type() -> String {
    "text/plain".to_string()
}

impl DriveFile {
    pub fn new<I: Into<String>, N: Into<String>, M: Into<String>, C: Into<String>>(
        id: I,
        name: N,
        mime_type: M,
        content: C,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            content: content.into(),
            created: Utc::now(),
        }
    }

    /// Whether the content can be shown to the model as text
    pub fn is_textual(&self) -> bool {
        ["text", "json", "javascript", "html"]
            .iter()
            .any(|kind| self.mime_type.contains(kind))
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// File storage organised in named folders
pub trait Drive: Send + Sync {
    /// Files directly inside the folder called `folder`
    fn list_folder(&self, folder: &str) -> StoreResult<Vec<DriveFile>>;

    fn create_folder(&self, folder: &str) -> StoreResult<()>;

    fn file(&self, id: &str) -> StoreResult<DriveFile>;

    /// Overwrite the content of a file, returning the updated file
    fn set_content(&self, id: &str, content: &str) -> StoreResult<DriveFile>;
}

#[derive(Debug, Default)]
struct DriveState {
    folders: BTreeMap<String, Vec<String>>,
    files: HashMap<String, DriveFile>,
}

#[derive(Debug, Default)]
pub struct InMemoryDrive {
    state: Mutex<DriveState>,
}

impl InMemoryDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `file` into `folder`, creating the folder when needed
    pub fn add_file(&self, folder: &str, file: DriveFile) {
        let mut state = self.state.lock().unwrap();
        state
            .folders
            .entry(folder.to_string())
            .or_default()
            .push(file.id.clone());
        state.files.insert(file.id.clone(), file);
    }

    /// Create `folder` unless it exists already
    pub fn add_folder(&self, folder: &str) {
        self.state
            .lock()
            .unwrap()
            .folders
            .entry(folder.to_string())
            .or_default();
    }

    pub fn has_folder(&self, folder: &str) -> bool {
        self.state.lock().unwrap().folders.contains_key(folder)
    }
}

impl Drive for InMemoryDrive {
    fn list_folder(&self, folder: &str) -> StoreResult<Vec<DriveFile>> {
        let state = self.state.lock().unwrap();
        let ids = state
            .folders
            .get(folder)
            .ok_or_else(|| StoreError::FolderNotFound(folder.to_string()))?;
        Ok(ids
            .iter()
            .filter_map(|id| state.files.get(id).cloned())
            .collect())
    }

    fn create_folder(&self, folder: &str) -> StoreResult<()> {
        self.add_folder(folder);
        Ok(())
    }

    fn file(&self, id: &str) -> StoreResult<DriveFile> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::FileNotFound(id.to_string()))
    }

    fn set_content(&self, id: &str, content: &str) -> StoreResult<DriveFile> {
        let mut state = self.state.lock().unwrap();
        let file = state
            .files
            .get_mut(id)
            .ok_or_else(|| StoreError::FileNotFound(id.to_string()))?;
        file.content = content.to_string();
        Ok(file.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_folder() {
        let drive = InMemoryDrive::new();
        assert_eq!(
            drive.list_folder("sample").unwrap_err(),
            StoreError::FolderNotFound("sample".to_string())
        );

        drive.create_folder("sample").unwrap();
        assert!(drive.list_folder("sample").unwrap().is_empty());
    }

    #[test]
    fn test_set_content() {
        let drive = InMemoryDrive::new();
        drive.add_file("sample", DriveFile::new("f1", "notes.txt", "text/plain", "old"));

        let updated = drive.set_content("f1", "new").unwrap();
        assert_eq!(updated.content, "new");
        assert_eq!(drive.file("f1").unwrap().content, "new");
        assert!(drive.set_content("nope", "x").is_err());
    }

    #[test]
    fn test_is_textual() {
        assert!(DriveFile::new("a", "a.json", "application/json", "{}").is_textual());
        assert!(!DriveFile::new("b", "b.png", "image/png", "").is_textual());
    }
}
