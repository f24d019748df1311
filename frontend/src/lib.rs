//! Mixdesk console library.
//!
//! Exposes the native console window for embedding in the engine binary.

#![warn(clippy::all, rust_2018_idioms)]

pub mod api;
mod app;
pub mod binder;
pub mod engine;
pub mod fader;
pub mod gain;
pub mod meter;
pub mod state;
pub mod toggle;
mod ws;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub use app::MixdeskApp;

/// Open the console window against `server_url` (without tracing init, the caller owns that).
pub fn run_native_gui(server_url: String) -> eframe::Result<()> {
    run(server_url, None)
}

/// Like [`run_native_gui`], closing the window once `shutdown_flag` is set.
pub fn run_native_gui_with_shutdown(
    server_url: String,
    shutdown_flag: Arc<AtomicBool>,
) -> eframe::Result<()> {
    run(server_url, Some(shutdown_flag))
}

fn run(server_url: String, shutdown_flag: Option<Arc<AtomicBool>>) -> eframe::Result<()> {
    tracing::info!("Initializing Mixdesk console connecting to {}", server_url);

    // Engine round trips and the event stream run here; the UI stays on this thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("mixdesk-console")
        .enable_all()
        .build()
        .map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;
    let _guard = runtime.enter();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("Mixdesk"),
        ..Default::default()
    };

    eframe::run_native(
        "Mixdesk",
        native_options,
        Box::new(move |cc| Ok(Box::new(MixdeskApp::new(cc, &server_url, shutdown_flag)))),
    )
}
