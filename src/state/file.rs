use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::apikey::ApiKeyResourceModel;
use crate::constants::state::FORMAT_VERSION;
use crate::errors::ProvisionerError;
use crate::state::StateStore;

/// On-disk layout of the state file
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    version: u8,
    #[serde(default)]
    resources: BTreeMap<String, ApiKeyResourceModel>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

/// JSON state file holding every tracked record.
///
/// The file contains API key tokens, so it is written with owner-only
/// permissions and replaced atomically on every change.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StateDocument, ProvisionerError> {
        if !self.path.exists() {
            return Ok(StateDocument::default());
        }

        let data = fs::read(&self.path).map_err(|e| {
            ProvisionerError::State(format!(
                "Failed to read state file {}: {e}",
                self.path.display()
            ))
        })?;

        let document: StateDocument = serde_json::from_slice(&data).map_err(|e| {
            ProvisionerError::State(format!(
                "Failed to parse state file {}: {e}",
                self.path.display()
            ))
        })?;

        if document.version != FORMAT_VERSION {
            return Err(ProvisionerError::State(format!(
                "Unsupported state file version {} (expected {FORMAT_VERSION})",
                document.version
            )));
        }

        Ok(document)
    }

    fn save(&self, document: &StateDocument) -> Result<(), ProvisionerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    ProvisionerError::State(format!("Failed to create state directory: {e}"))
                })?;
                info!("Created state directory: {}", parent.display());
            }
        }

        let data = serde_json::to_string_pretty(document)
            .map_err(|e| ProvisionerError::State(format!("Failed to serialize state: {e}")))?;

        let tmp_path = self.path.with_extension("tmp");
        // Stale leftovers would keep their old permissions
        if tmp_path.exists() {
            fs::remove_file(&tmp_path).map_err(|e| {
                ProvisionerError::State(format!("Failed to remove stale state file: {e}"))
            })?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        // Owner-only from creation, the file holds tokens (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600); // rw-------
        }

        let mut file = options
            .open(&tmp_path)
            .map_err(|e| ProvisionerError::State(format!("Failed to create state file: {e}")))?;
        file.write_all(data.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| ProvisionerError::State(format!("Failed to write state file: {e}")))?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .map_err(|e| ProvisionerError::State(format!("Failed to replace state file: {e}")))?;

        debug!(
            path = %self.path.display(),
            resources = document.resources.len(),
            "State file written"
        );
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, name: &str) -> Result<Option<ApiKeyResourceModel>, ProvisionerError> {
        let _guard = self.lock.lock().await;
        Ok(self.load()?.resources.remove(name))
    }

    async fn put(&self, name: &str, record: &ApiKeyResourceModel) -> Result<(), ProvisionerError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load()?;
        document.resources.insert(name.to_string(), record.clone());
        self.save(&document)
    }

    async fn remove(&self, name: &str) -> Result<bool, ProvisionerError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load()?;
        let removed = document.resources.remove(name).is_some();
        if removed {
            self.save(&document)?;
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<String>, ProvisionerError> {
        let _guard = self.lock.lock().await;
        Ok(self.load()?.resources.into_keys().collect())
    }

    fn store_type(&self) -> &'static str {
        "file"
    }
}
