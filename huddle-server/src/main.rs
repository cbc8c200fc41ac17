use anyhow::Result;
use clap::Parser;
use huddle_server::{RelayService, router};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Signaling relay for huddle calls.
#[derive(Parser)]
#[command(name = "huddle-relay")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:3001")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let relay = RelayService::new();
    let app = router(relay);

    info!("signaling relay listening on http://{}", args.bind);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
