use std::{collections::HashSet, path::PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{domain::UserId, errors::Error, settings::SettingsBackend, Result};

/// On-disk layout: `{ "enabledUsers": ["<id>", ...] }`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDocument {
    #[serde(default)]
    enabled_users: Vec<String>,
}

/// Settings persisted as a single JSON document.
///
/// Every save rewrites the whole file from the last known enabled set, so
/// saving is refused until the document has been read successfully.
pub struct JsonFileBackend {
    path: PathBuf,
    enabled: Mutex<Option<HashSet<UserId>>>,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enabled: Mutex::new(None),
        }
    }

    async fn read_document(&self) -> Result<HashSet<UserId>> {
        let txt = match tokio::fs::read_to_string(&self.path).await {
            Ok(txt) => txt,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e.into()),
        };
        if txt.trim().is_empty() {
            return Ok(HashSet::new());
        }

        let doc: SettingsDocument = serde_json::from_str(&txt)?;
        let set = doc
            .enabled_users
            .iter()
            .filter_map(|raw| match raw.trim().parse::<u64>() {
                Ok(id) => Some(UserId(id)),
                Err(_) => {
                    tracing::warn!(
                        "skipping invalid user id `{raw}` in {}",
                        self.path.display()
                    );
                    None
                }
            })
            .collect();
        Ok(set)
    }

    async fn write_document(&self, enabled: &HashSet<UserId>) -> Result<()> {
        let mut ids: Vec<UserId> = enabled.iter().copied().collect();
        ids.sort();
        let doc = SettingsDocument {
            enabled_users: ids.iter().map(ToString::to_string).collect(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let txt = serde_json::to_string_pretty(&doc)?;
        tokio::fs::write(&self.path, txt).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsBackend for JsonFileBackend {
    fn describe(&self) -> &'static str {
        "json file"
    }

    async fn load(&self) -> Result<HashSet<UserId>> {
        let set = self.read_document().await?;
        *self.enabled.lock().await = Some(set.clone());
        Ok(set)
    }

    async fn save(&self, user: UserId, enabled: bool) -> Result<()> {
        let mut guard = self.enabled.lock().await;
        let Some(known) = guard.as_mut() else {
            return Err(Error::External(format!(
                "{} was never read successfully; not overwriting it",
                self.path.display()
            )));
        };
        if enabled {
            known.insert(user);
        } else {
            known.remove(&user);
        }
        self.write_document(known).await
    }
}
