//! Native GUI module - launches the console window in-process.
//!
//! GUI is enabled by default. Use --features no-gui to disable.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn local_server_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}

#[cfg(not(feature = "no-gui"))]
pub fn launch_gui_with_shutdown(port: u16, shutdown_flag: Arc<AtomicBool>) -> eframe::Result<()> {
    tracing::info!(
        "Launching native console with shutdown handler connecting to port {}...",
        port
    );
    mixdesk_frontend::run_native_gui_with_shutdown(local_server_url(port), shutdown_flag)
}

#[cfg(feature = "no-gui")]
pub fn launch_gui_with_shutdown(_port: u16, _shutdown_flag: Arc<AtomicBool>) -> Result<(), String> {
    Err("GUI disabled. Rebuild without --features no-gui".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_server_url() {
        assert_eq!(local_server_url(8080), "http://localhost:8080");
    }
}
