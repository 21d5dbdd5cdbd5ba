use crate::domain::ports::Store;
use crate::utils::error::{GroupsError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Stores each key as `<key>.json` inside `base_path`.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
    seeds: HashMap<String, Vec<Value>>,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            seeds: HashMap::new(),
        }
    }

    pub fn with_seed(mut self, key: &str, values: Vec<Value>) -> Self {
        self.seeds.insert(key.to_string(), values);
        self
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(GroupsError::storage(format!("invalid store key '{}'", key)));
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Vec<Value>> {
        let path = self.key_path(key)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(self.seeds.get(key).cloned().unwrap_or_default());
            }
            Err(e) => return Err(e.into()),
        };

        parse_array(&data, &path)
    }

    async fn replace(&self, key: &str, values: Vec<Value>) -> Result<()> {
        let path = self.key_path(key)?;
        tokio::fs::create_dir_all(&self.base_path).await?;

        // 先寫暫存檔再改名，避免讀到寫一半的檔案
        let tmp_path = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(&values)?;
        tokio::fs::write(&tmp_path, &data).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                tracing::warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e.into());
        }

        tracing::debug!("Wrote {} entries to {}", values.len(), path.display());
        Ok(())
    }
}

fn parse_array(data: &[u8], path: &Path) -> Result<Vec<Value>> {
    match serde_json::from_slice::<Value>(data) {
        Ok(Value::Array(values)) => Ok(values),
        Ok(_) => Err(GroupsError::storage(format!(
            "{} must contain a JSON array",
            path.display()
        ))),
        Err(e) => Err(GroupsError::storage(format!(
            "invalid JSON in {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Reads a seed file holding a JSON array.
pub fn load_seed(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        GroupsError::storage(format!("seed file {} unreadable: {}", path.display(), e))
    })?;
    parse_array(&data, path)
}
