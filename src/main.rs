mod logger;

use clap::Parser;
use messages_gateway::Config;

#[derive(Parser, Debug)]
#[command(name = "messages-gateway")]
struct Args {
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "0.0.0.0:8787")]
    listen: String,

    /// `log`/`EnvFilter`-style directive, e.g. "info" or "messages_gateway=debug".
    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(&args.log_filter);

    let config = Config::from_env()?;
    let router = messages_gateway::build_router(config);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    log::info!("listening on {}", args.listen);

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("failed to install ctrl-c handler: {err}");
        return;
    }

    log::info!("received shutdown signal, draining in-flight requests");
}
