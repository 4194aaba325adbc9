use std::{env, path::PathBuf};

use crate::{errors::Error, links::DEFAULT_TARGET_HOST, Result};

/// Which medium backs the per-user settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingsBackendKind {
    /// No preference system: every user is implicitly enabled.
    None,
    Memory,
    File(PathBuf),
    Postgres(String),
}

impl SettingsBackendKind {
    /// Short name for logs; never includes the connection string.
    pub fn label(&self) -> &'static str {
        match self {
            SettingsBackendKind::None => "none",
            SettingsBackendKind::Memory => "memory",
            SettingsBackendKind::File(_) => "file",
            SettingsBackendKind::Postgres(_) => "postgres",
        }
    }
}

/// What happens to the original message once its links were rewritten.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepostMode {
    /// Suppress the original preview and reply with the rewritten links.
    #[default]
    Reply,
    /// Repost the text with rewritten links, then delete the original.
    Repost,
}

/// Typed configuration, read from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub settings_backend: SettingsBackendKind,
    pub http_port: u16,
    pub target_host: String,
    pub repost_mode: RepostMode,
    pub event_queue_capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Existing env vars win over `.env`.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process env in `load`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let discord_token = lookup("DISCORD_TOKEN").unwrap_or_default();
        if discord_token.trim().is_empty() {
            return Err(Error::Config(
                "DISCORD_TOKEN environment variable is required".to_string(),
            ));
        }

        let database_url = lookup("DATABASE_URL").and_then(non_empty);
        let settings_file = lookup("SETTINGS_FILE").and_then(non_empty).map(PathBuf::from);
        let settings_backend = match lookup("SETTINGS_BACKEND").and_then(non_empty) {
            Some(kind) => parse_backend_kind(&kind, database_url, settings_file)?,
            None => match (database_url, settings_file) {
                (Some(url), _) => SettingsBackendKind::Postgres(url),
                (None, Some(path)) => SettingsBackendKind::File(path),
                (None, None) => SettingsBackendKind::Memory,
            },
        };

        let http_port = parse_num(&lookup, "PORT")?.unwrap_or(3000);
        let target_host = lookup("REWRITE_TARGET_HOST")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_TARGET_HOST.to_string());

        let repost_mode = match lookup("REPOST_MODE").and_then(non_empty) {
            None => RepostMode::default(),
            Some(v) => match v.trim().to_lowercase().as_str() {
                "reply" => RepostMode::Reply,
                "repost" => RepostMode::Repost,
                other => {
                    return Err(Error::Config(format!(
                        "REPOST_MODE must be `reply` or `repost`, got `{other}`"
                    )))
                }
            },
        };

        let event_queue_capacity = parse_num(&lookup, "EVENT_QUEUE_CAPACITY")?
            .unwrap_or(256usize)
            .max(1);

        Ok(Self {
            discord_token,
            settings_backend,
            http_port,
            target_host,
            repost_mode,
            event_queue_capacity,
        })
    }
}

fn parse_backend_kind(
    kind: &str,
    database_url: Option<String>,
    settings_file: Option<PathBuf>,
) -> Result<SettingsBackendKind> {
    match kind.trim().to_lowercase().as_str() {
        "none" => Ok(SettingsBackendKind::None),
        "memory" => Ok(SettingsBackendKind::Memory),
        "file" => Ok(SettingsBackendKind::File(
            settings_file.unwrap_or_else(|| PathBuf::from("user-settings.json")),
        )),
        "postgres" => database_url.map(SettingsBackendKind::Postgres).ok_or_else(|| {
            Error::Config("SETTINGS_BACKEND=postgres requires DATABASE_URL".to_string())
        }),
        other => Err(Error::Config(format!(
            "unknown SETTINGS_BACKEND `{other}` (expected none|memory|file|postgres)"
        ))),
    }
}

fn parse_num<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} is not a valid number: `{raw}`")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(load(&[]), Err(Error::Config(_))));
        assert!(matches!(load(&[("DISCORD_TOKEN", "  ")]), Err(Error::Config(_))));
    }

    #[test]
    fn defaults_to_memory_settings_and_reply_mode() {
        let cfg = load(&[("DISCORD_TOKEN", "t")]).unwrap();
        assert_eq!(cfg.settings_backend, SettingsBackendKind::Memory);
        assert_eq!(cfg.repost_mode, RepostMode::Reply);
        assert_eq!(cfg.http_port, 3000);
        assert_eq!(cfg.target_host, "vxtwitter.com");
        assert_eq!(cfg.event_queue_capacity, 256);
    }

    #[test]
    fn database_url_wins_over_settings_file() {
        let cfg = load(&[
            ("DISCORD_TOKEN", "t"),
            ("DATABASE_URL", "postgres://localhost/bot"),
            ("SETTINGS_FILE", "/tmp/s.json"),
        ])
        .unwrap();
        assert_eq!(
            cfg.settings_backend,
            SettingsBackendKind::Postgres("postgres://localhost/bot".to_string())
        );

        let cfg = load(&[("DISCORD_TOKEN", "t"), ("SETTINGS_FILE", "/tmp/s.json")]).unwrap();
        assert_eq!(
            cfg.settings_backend,
            SettingsBackendKind::File(PathBuf::from("/tmp/s.json"))
        );
    }

    #[test]
    fn explicit_backend_override() {
        let cfg = load(&[
            ("DISCORD_TOKEN", "t"),
            ("DATABASE_URL", "postgres://localhost/bot"),
            ("SETTINGS_BACKEND", "none"),
        ])
        .unwrap();
        assert_eq!(cfg.settings_backend, SettingsBackendKind::None);

        let err = load(&[("DISCORD_TOKEN", "t"), ("SETTINGS_BACKEND", "postgres")]);
        assert!(matches!(err, Err(Error::Config(_))));

        let err = load(&[("DISCORD_TOKEN", "t"), ("SETTINGS_BACKEND", "redis")]);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn parses_port_and_repost_mode() {
        let cfg = load(&[
            ("DISCORD_TOKEN", "t"),
            ("PORT", "8080"),
            ("REPOST_MODE", "Repost"),
        ])
        .unwrap();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.repost_mode, RepostMode::Repost);

        assert!(load(&[("DISCORD_TOKEN", "t"), ("PORT", "eighty")]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "t"), ("REPOST_MODE", "delete")]).is_err());
    }
}
