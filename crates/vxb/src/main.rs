use std::sync::Arc;

use vxb_core::{config::Config, settings::SettingsStore};

mod health;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vxb_core::logging::init("vxb")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        backend = cfg.settings_backend.label(),
        target_host = %cfg.target_host,
        "starting"
    );

    // Settings are fully loaded before any gateway traffic is accepted.
    let store = SettingsStore::from_config(&cfg.settings_backend).await;

    tokio::spawn(health::serve(cfg.http_port));

    vxb_discord::router::run(cfg, store)
        .await
        .map_err(|e| anyhow::anyhow!("discord bot failed: {e}"))
}
