//! Color Inverter - always-on-top window showing the inverted screen beneath it

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod logging;

use overlay::OverlayConfig;

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use overlay::InverterWindow;
    use windows::Win32::UI::HiDpi::{
        SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    };

    logging::init();

    // Window geometry and GDI capture must agree on physical pixels
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }

    let config = OverlayConfig::default();
    let window = InverterWindow::create(config).context("failed to create overlay window")?;
    window.run().context("overlay stopped")?;

    tracing::info!("exiting");
    Ok(())
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    logging::init();
    let config = OverlayConfig::default();
    anyhow::bail!(
        "screen capture is only implemented for Windows (would open {}x{} at ({}, {}))",
        config.initial.width,
        config.initial.height,
        config.initial.x,
        config.initial.y
    )
}
