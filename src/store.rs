use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const API_URL_KEY: &str = "api_base_url";
pub const CURRENT_USER_KEY: &str = "currentUser";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Small key-value store persisted as one JSON object.
///
/// Every write is flushed to disk. A missing or unreadable file loads as an
/// empty store.
pub struct Preferences {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl Preferences {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(values) => values,
                Err(e) => {
                    log::warn!("ignoring corrupt state file {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("cannot read state file {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Typed read. A value that no longer decodes is treated as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("state entry '{key}' is invalid: {e}");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.values.insert(key.to_string(), value);
        self.save()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn save(&self) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(&self.values).map_err(|source| {
            StoreError::Encode {
                key: "*".to_string(),
                source,
            }
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        email: String,
        id: String,
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut prefs = Preferences::open(&path);
        prefs.set(API_URL_KEY, &"http://farm.local/api").unwrap();
        prefs
            .set(
                CURRENT_USER_KEY,
                &Profile {
                    email: "test@example.com".into(),
                    id: "mockUser123".into(),
                },
            )
            .unwrap();

        let reopened = Preferences::open(&path);
        assert_eq!(reopened.get_str(API_URL_KEY), Some("http://farm.local/api"));
        let profile: Profile = reopened.get(CURRENT_USER_KEY).unwrap();
        assert_eq!(profile.id, "mockUser123");
    }

    #[test]
    fn remove_deletes_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut prefs = Preferences::open(&path);
        prefs.set("k", &1).unwrap();
        prefs.remove("k").unwrap();
        prefs.remove("never-set").unwrap();
        assert_eq!(Preferences::open(&path).get::<i32>("k"), None);
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let prefs = Preferences::open(&path);
        assert_eq!(prefs.get_str(API_URL_KEY), None);
    }

    #[test]
    fn mistyped_entry_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = Preferences::open(dir.path().join("state.json"));
        prefs.set(CURRENT_USER_KEY, &"just a string").unwrap();
        assert_eq!(prefs.get::<Profile>(CURRENT_USER_KEY), None);
    }
}
