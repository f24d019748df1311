//! Mixdesk engine server and console.

use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mixdesk::{config::Config, create_app_with_state, state::AppState};

/// Mixdesk - mixer console with a reference in-memory engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run in headless mode (engine only, no console window)
    #[cfg(not(feature = "no-gui"))]
    #[arg(long)]
    headless: bool,

    /// Port to listen on
    #[arg(short, long, env = "MIXDESK_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Number of empty tracks to create at startup
    #[arg(long)]
    initial_tracks: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_figment(args.port, args.log_level.clone(), args.initial_tracks)?;
    let _log_guard = init_logging(&config)?;

    #[cfg(not(feature = "no-gui"))]
    let gui_enabled = !args.headless;
    #[cfg(feature = "no-gui")]
    let gui_enabled = false;

    if gui_enabled {
        info!("Starting Mixdesk engine with console...");
        run_with_gui(config)
    } else {
        info!("Starting Mixdesk engine (headless mode)...");
        run_headless(config)
    }
}

/// Stdout logging, plus a non-blocking file writer when `logging.log_file` is set.
fn init_logging(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match &config.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stdout_layer = fmt::layer().with_target(false).compact();

    match &config.log_file {
        Some(path) => {
            let directory = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(directory)?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            info!("Logging to file {}", path.display());
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .init();
            Ok(None)
        }
    }
}

async fn build_state(config: &Config) -> AppState {
    let state = AppState::new();
    for _ in 0..config.initial_tracks {
        state.add_empty_track().await;
    }
    if config.initial_tracks > 0 {
        info!("Seeded {} empty tracks", config.initial_tracks);
    }
    state
}

#[cfg(not(feature = "no-gui"))]
fn run_with_gui(config: Config) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let runtime = tokio::runtime::Runtime::new()?;

    // Shared shutdown flag for coordination between threads
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_gui = shutdown_flag.clone();
    let port = config.port;

    let (server_started_tx, server_started_rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        runtime.block_on(async move {
            let state = build_state(&config).await;
            let app = create_app_with_state(state).await;

            let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!("Failed to bind {}: {}", addr, e);
                    shutdown_flag.store(true, Ordering::SeqCst);
                    server_started_tx.send(()).ok();
                    return;
                }
            };
            info!("Server listening on {}", addr);

            server_started_tx.send(()).ok();

            let shutdown_signal = async move {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install Ctrl+C handler");

                info!("Received Ctrl+C, shutting down gracefully...");
                info!("Signaling console to close...");
                shutdown_flag.store(true, Ordering::SeqCst);
            };

            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal)
                .await
            {
                error!("Server error: {}", e);
            }
        });
    });

    // Wait for server to start
    server_started_rx.recv().ok();
    std::thread::sleep(std::time::Duration::from_millis(100));

    info!("Launching console on main thread...");

    // Blocks until the window closes
    if let Err(e) = mixdesk::gui::launch_gui_with_shutdown(port, shutdown_flag_gui) {
        error!("GUI error: {:?}", e);
    }

    Ok(())
}

#[cfg(feature = "no-gui")]
fn run_with_gui(_config: Config) -> anyhow::Result<()> {
    anyhow::bail!("GUI disabled. Rebuild without --features no-gui")
}

#[tokio::main]
async fn run_headless(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config).await;
    let app = create_app_with_state(state).await;

    // Bind to all interfaces so consoles on other machines can connect
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down");
    Ok(())
}
