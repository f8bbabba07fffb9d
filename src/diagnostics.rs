//! Structured logging bootstrap.
//!
//! Grounded on the `tracing_subscriber::registry().with(...)` composition
//! the pack's CLI examples use for their own logging setup, trimmed down
//! to the two layers this crate actually needs: a plain formatter and an
//! `EnvFilter` so `RUST_LOG` controls verbosity.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber. Call once, as early as
/// possible in `main`; a second call is a harmless no-op since
/// `try_init`'s error (subscriber already set) is swallowed rather than
/// treated as fatal.
pub fn init_tracing() {
    let filter = EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy();
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}
