//! telemdash_sim: serves a simulated device on 0.0.0.0:<port> (default 8001).

use std::net::SocketAddr;

use telemdash_sim::{parse_port, parse_seed, router, AppState, DeviceModel, DEFAULT_PORT};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!(
            "Usage: {} [--port PORT|-p PORT] [--seed N] [--no-jitter]",
            args.first().map(String::as_str).unwrap_or("telemdash_sim")
        );
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let port = parse_port(args.iter().cloned(), DEFAULT_PORT);
    let seed = parse_seed(args.iter().cloned());
    let jitter = !args.iter().any(|a| a == "--no-jitter");

    let app = router(AppState::new(DeviceModel::new(seed), jitter));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, ?seed, jitter, "simulated device listening");
    axum::serve(listener, app).await?;
    Ok(())
}
