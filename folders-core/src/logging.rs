//! src/logging.rs
//! ============================================================================
//! # Logging: Tracing Setup for the Folder View Engine
//!
//! Installs a two-layer `tracing` subscriber: a daily rolling file under the
//! platform data directory (falling back to `./logs`) and an ANSI stderr
//! layer for live debugging. Both layers honour `RUST_LOG`, defaulting to
//! `info`.

use std::{
    fs,
    path::PathBuf,
    sync::OnceLock,
    sync::atomic::{AtomicUsize, Ordering},
};

use directories::ProjectDirs;
use tracing::Metadata;
use tracing_appender::rolling::{RollingFileAppender, daily};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self, FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    prelude::*,
};

pub struct Logger;

impl Logger {
    /// Call **once** near the start of `main`.
    pub fn init_tracing() {
        SEQ.get_or_init(|| AtomicUsize::new(1));

        let log_dir: PathBuf = Self::log_dir();
        fs::create_dir_all(&log_dir).ok();

        // daily rolling file appender → <log_dir>/folders-YYYY-MM-DD.log
        let file: RollingFileAppender = daily(log_dir, "folders");

        let file_layer = fmt::layer()
            .event_format(SeqFileMod)
            .with_writer(file)
            .with_ansi(false)
            .with_filter(env_filter());

        // stderr layer for live debugging
        let stderr_layer = fmt::layer()
            .event_format(SeqFileMod)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_filter(env_filter());

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .init();
    }

    /// Platform log directory, `./logs` when the platform dirs are unknown.
    fn log_dir() -> PathBuf {
        ProjectDirs::from("org", "example", "Folders")
            .map(|dirs| dirs.data_local_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::from_default_env().add_directive("info".parse().expect("static directive"))
}

static SEQ: OnceLock<AtomicUsize> = OnceLock::new();

/// Custom formatter: `[SEQ] LEVEL [file:line mod::path] message`
struct SeqFileMod;

impl<S, N> FormatEvent<S, N> for SeqFileMod
where
    S: tracing::Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut w: Writer<'_>,
        ev: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let seq: usize = SEQ
            .get()
            .expect("SEQ not initialised")
            .fetch_add(1, Ordering::Relaxed);

        let meta: &'static Metadata<'static> = ev.metadata();
        write!(
            w,
            "{seq:06} {:5} [{}:{} {}] ",
            meta.level(),
            meta.file().unwrap_or("??"),
            meta.line().unwrap_or(0),
            meta.module_path().unwrap_or("???"),
        )?;

        ctx.field_format().format_fields(w.by_ref(), ev)?;
        writeln!(w)
    }
}
