//! Ambient logging wrapper. The codec itself never decides whether a
//! process wants `env_logger`, `tracing-subscriber`, or something else
//! wired to the `log` facade — call sites only `log::debug!`/`log::warn!`
//! directly; the functions here exist for callers (and this crate's own
//! test harnesses, if ever run as a binary) that want a quick one-line
//! `env_logger` init without pulling it in as a hard dependency of the
//! library surface.

use log::{log_enabled, Level};

/// Initializes the logger with the `env_logger` crate. A caller embedding
/// this codec in its own process is free to initialize its own `log`
/// backend instead; this is a convenience, not a requirement.
pub fn init_logger() {
    env_logger::init();
}

/// Logs a record-parse error at `warn` level, gated so the `format!` call
/// in the common "this error doesn't happen" case is never paid for.
pub fn log_parse_error(err: &crate::error::CodecError) {
    if log_enabled!(Level::Warn) {
        log::warn!("record parse failed: {err}");
    }
}
