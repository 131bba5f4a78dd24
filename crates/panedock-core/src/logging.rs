#![forbid(unsafe_code)]

//! Tracing bootstrap.
//!
//! Library code only emits `tracing` events under `panedock.*` targets. Hosts
//! that do not run their own subscriber can call [`init_subscriber`] (feature
//! `subscriber`) once at startup.

/// Target prefix used by every panedock tracing event.
pub const LOG_TARGET_PREFIX: &str = "panedock";

/// Default filter directive when neither the argument nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "panedock=info";

/// Install a global fmt subscriber.
///
/// `filter` takes precedence over `RUST_LOG`; both fall back to
/// [`DEFAULT_FILTER`]. Returns `false` if a global subscriber was already
/// installed.
#[cfg(feature = "subscriber")]
pub fn init_subscriber(filter: Option<&str>) -> bool {
    use tracing_subscriber::EnvFilter;

    let env_filter = match filter {
        Some(directives) => EnvFilter::try_new(directives),
        None => EnvFilter::try_from_default_env(),
    }
    .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
