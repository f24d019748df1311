//! Standalone Mixdesk console connecting to a running engine.

use clap::Parser;

/// Mixdesk console
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine server URL
    #[arg(short, long, env = "MIXDESK_SERVER", default_value = "http://localhost:8080")]
    server: String,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!("Starting Mixdesk console in native mode");

    mixdesk_frontend::run_native_gui(args.server)
}
