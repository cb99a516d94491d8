//! src/main.rs
//! ============================================================================
//! # folders: Demo Driver for the Folder View Engine
//!
//! Watches one directory and logs every display signal the engine emits.
//! The directory comes from the first CLI argument, falling back to the
//! configured one.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use folders_core::config::{FoldersConfig, ICON_PIXEL_SIZE};
use folders_core::controller::events::IconSignal;
use folders_core::controller::synchronizer::Synchronizer;
use folders_core::fs::icon_theme::IconTheme;
use folders_core::logging::Logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Logger::init_tracing();

    let mut config = FoldersConfig::load().await?;
    if let Some(dir) = std::env::args().nth(1) {
        config.directory = PathBuf::from(dir);
    }

    info!("Watching {:?} (sort: {:?})", config.directory, config.sort_by);

    // The icon index walks every theme directory; keep it off the runtime.
    let theme = Arc::new(IconTheme::new(ICON_PIXEL_SIZE));
    {
        let theme = theme.clone();
        tokio::task::spawn_blocking(move || theme.build_index()).await?;
    }

    let (signal_tx, mut signal_rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(signal) = signal_rx.recv().await {
            match signal {
                IconSignal::IconAdded(record) => {
                    info!(
                        "+ {} ({}, order {:.2})",
                        record.name,
                        record.size_human(),
                        record.order
                    );
                }
                IconSignal::IconRemoved(record) => info!("- {}", record.name),
                IconSignal::IconImageChanged(record) => {
                    info!("~ {} image -> {:?}", record.name, record.glyph_path);
                }
                IconSignal::IconReordered(record) => {
                    info!("~ {} reordered (order {:.2})", record.name, record.order);
                }
                IconSignal::ResortComplete => info!("resort complete"),
            }
        }
    });

    let mut synchronizer = Synchronizer::new(config.clone(), theme, signal_tx);
    synchronizer.start(config);

    tokio::select! {
        _ = synchronizer.run() => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    synchronizer.stop();

    Ok(())
}
