use stockroom::config::Config;
use stockroom::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = Config::resolve_path(std::env::args().nth(1));
    let cfg = Config::load(&path);

    let level = cfg.as_ref().map(|c| c.log_level.as_str()).unwrap_or("info");
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    let cfg = match cfg {
        Ok(cfg) => {
            info!(path = %path.display(), "Server config file successfully parsed");
            cfg
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Server config file was not successfully parsed. Exiting...");
            return Err(e.into());
        }
    };

    server::listener::run(&cfg).await?;

    info!("Server closed");
    Ok(())
}
