use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;

/// Whole-document JSON storage, one file per logical name.
///
/// Every document has its own async lock. `update` holds it for the full
/// load-modify-save cycle so concurrent writers to the same document are
/// serialized instead of overwriting each other.
pub struct JsonStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl JsonStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;

        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load a document, falling back to its default when the file does not exist.
    pub async fn load<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;
        Ok(self.read(name).await?.unwrap_or_default())
    }

    /// Like `load`, but reports a missing file as `None`.
    pub async fn load_optional<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;
        self.read(name).await
    }

    pub async fn save<T>(&self, name: &str, document: &T) -> Result<()>
    where
        T: Serialize,
    {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;
        self.write(name, document).await
    }

    /// Atomic read-modify-write of one document.
    pub async fn update<T, R, F>(&self, name: &str, apply: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> R,
    {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let mut document: T = self.read(name).await?.unwrap_or_default();
        let result = apply(&mut document);
        self.write(name, &document).await?;
        Ok(result)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    fn lock_for(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(name.to_string()).or_default().clone()
    }

    async fn read<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let path = self.path_for(name);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let document = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(document))
    }

    async fn write<T>(&self, name: &str, document: &T) -> Result<()>
    where
        T: Serialize,
    {
        let path = self.path_for(name);
        let tmp_path = self.dir.join(format!(".{}.json.tmp", name));

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document
            .serialize(&mut serializer)
            .with_context(|| format!("Failed to serialize document {}", name))?;

        fs::write(&tmp_path, &buf)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }
}
