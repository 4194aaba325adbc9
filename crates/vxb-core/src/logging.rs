use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize logging/tracing for the bot.
pub fn init(service_name: &str) -> Result<()> {
    // Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("logging init failed: {e}")))?;

    Ok(())
}

/// Info for everything, our crates included.
fn default_directives(service_name: &str) -> String {
    format!("info,vxb=info,vxb_core=info,vxb_discord=info,{service_name}=info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_info() {
        let directives = default_directives("vxb");
        assert!(directives.starts_with("info,"));
        assert!(directives.parse::<EnvFilter>().is_ok());
    }
}
