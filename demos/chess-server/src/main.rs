use mess::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Reads the server settings from the environment.
///
/// `MESS_ADDR` wins over `PORT`; with neither set the server listens on
/// port 8080 on every interface.
fn config_from_env(
    var: impl Fn(&str) -> Option<String>,
) -> Result<ServerConfig, String> {
    let bind_addr = match (var("MESS_ADDR"), var("PORT")) {
        (Some(addr), _) => addr,
        (None, Some(port)) => {
            let port: u16 = port
                .parse()
                .map_err(|_| format!("PORT must be a port number, got {port:?}"))?;
            format!("0.0.0.0:{port}")
        }
        (None, None) => DEFAULT_ADDR.to_string(),
    };

    Ok(ServerConfig { bind_addr })
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = config_from_env(|key| std::env::var(key).ok())?;
    tracing::info!(addr = %config.bind_addr, "starting chess server");

    let server = MessServerBuilder::new()
        .config(config)
        .build::<StandardChess>()
        .await?;

    server.run().await?;
    Ok(())
}
