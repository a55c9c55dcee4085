//! Reading CLI inputs and writing JSON results.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Once;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Settings;
use crate::ScopeError;

static TRACING_INIT: Once = Once::new();

/// Installs a stderr subscriber, only when `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ScopeError> {
    let source = fs::read_to_string(path).map_err(|e| ScopeError::from(e).with_context(path.display()))?;
    serde_json::from_str(&source).map_err(|e| ScopeError::from(e).with_context(path.display()))
}

/// Settings from `path`, or the defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ScopeError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Ok(Settings::default()),
    }
}

/// Pretty-prints `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ScopeError> {
    let rendered = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered)?;
    Ok(())
}
