use mosaic_server::{ServerConfig, start_server};
use tracing_subscriber::EnvFilter;

fn env_dimension(name: &str, default: u32) -> anyhow::Result<u32> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => {
            let value: u32 = v.parse().map_err(|e| anyhow::anyhow!("{name}={v:?}: {e}"))?;
            if value == 0 {
                anyhow::bail!("{name} must be positive");
            }
            Ok(value)
        }
        _ => Ok(default),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Bind address and tile size from env or default
    let defaults = ServerConfig::default();
    let cfg = ServerConfig {
        bind_addr: std::env::var("MOSAIC_BIND").unwrap_or(defaults.bind_addr),
        tile_width: env_dimension("MOSAIC_TILE_WIDTH", defaults.tile_width)?,
        tile_height: env_dimension("MOSAIC_TILE_HEIGHT", defaults.tile_height)?,
    };

    let (_addr, handle) = start_server(cfg).await?;
    // Park forever
    handle.await.ok();
    Ok(())
}
