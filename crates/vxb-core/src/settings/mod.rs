//! Per-user opt-in preference for automatic link rewriting.
//!
//! `SettingsStore` keeps the enabled users in memory and writes through to a
//! `SettingsBackend`. The in-memory set is authoritative: a failed write is
//! logged and the toggle still applies until the next restart.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::{config::SettingsBackendKind, domain::UserId, Result};

mod file;
mod postgres;

pub use file::JsonFileBackend;
pub use postgres::PostgresBackend;

/// Persistence medium behind the settings store.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    fn describe(&self) -> &'static str;

    /// All users whose preference is enabled.
    async fn load(&self) -> Result<HashSet<UserId>>;

    /// Upsert one user's preference.
    async fn save(&self, user: UserId, enabled: bool) -> Result<()>;
}

/// Keeps nothing; preferences are forgotten on restart.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryBackend;

#[async_trait]
impl SettingsBackend for MemoryBackend {
    fn describe(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<HashSet<UserId>> {
        Ok(HashSet::new())
    }

    async fn save(&self, _user: UserId, _enabled: bool) -> Result<()> {
        Ok(())
    }
}

/// Answer for users without a stored preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PreferencePolicy {
    /// Users must opt in; absence of a record means disabled.
    #[default]
    OptIn,
    /// No preference system: rewriting applies to everyone.
    AlwaysOn,
}

pub struct SettingsStore {
    backend: Box<dyn SettingsBackend>,
    policy: PreferencePolicy,
    enabled: HashSet<UserId>,
}

impl SettingsStore {
    /// Load every enabled user from `backend` before serving traffic.
    ///
    /// A load failure is logged and the store starts empty.
    pub async fn open(backend: Box<dyn SettingsBackend>, policy: PreferencePolicy) -> Self {
        let enabled = match backend.load().await {
            Ok(set) => set,
            Err(e) => {
                tracing::error!(
                    "failed to load settings from {}: {e}; starting empty",
                    backend.describe()
                );
                HashSet::new()
            }
        };

        tracing::info!(
            backend = backend.describe(),
            enabled_users = enabled.len(),
            "settings loaded"
        );

        Self {
            backend,
            policy,
            enabled,
        }
    }

    /// Open the store configured by `kind`.
    ///
    /// An unreachable database degrades to memory-only settings.
    pub async fn from_config(kind: &SettingsBackendKind) -> Self {
        let backend: Box<dyn SettingsBackend> = match kind {
            SettingsBackendKind::None | SettingsBackendKind::Memory => Box::new(MemoryBackend),
            SettingsBackendKind::File(path) => Box::new(JsonFileBackend::new(path.clone())),
            SettingsBackendKind::Postgres(url) => match PostgresBackend::connect(url).await {
                Ok(pg) => Box::new(pg),
                Err(e) => {
                    tracing::error!("database unavailable ({e}); using memory-only settings");
                    Box::new(MemoryBackend)
                }
            },
        };
        let policy = match kind {
            SettingsBackendKind::None => PreferencePolicy::AlwaysOn,
            _ => PreferencePolicy::OptIn,
        };

        Self::open(backend, policy).await
    }

    pub fn policy(&self) -> PreferencePolicy {
        self.policy
    }

    pub fn is_enabled(&self, user: UserId) -> bool {
        match self.policy {
            PreferencePolicy::AlwaysOn => true,
            PreferencePolicy::OptIn => self.enabled.contains(&user),
        }
    }

    /// Update the preference in memory, then persist it.
    ///
    /// Returns `false` if the write to the backend failed (already logged).
    pub async fn set_enabled(&mut self, user: UserId, enabled: bool) -> bool {
        if enabled {
            self.enabled.insert(user);
        } else {
            self.enabled.remove(&user);
        }

        match self.backend.save(user, enabled).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    user = %user,
                    "failed to persist setting to {}: {e}",
                    self.backend.describe()
                );
                false
            }
        }
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled.len()
    }
}
