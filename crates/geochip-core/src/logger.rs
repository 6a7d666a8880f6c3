//! Logging setup for tools, benches and tests built on geochip.
//!
//! Library code only emits through the `log` macros (and `tracing` spans
//! behind the feature). Binaries pick a backend once at startup:
//!
//! * [`init_with_level`] / [`init_from_env`]: a stderr `log` backend. Records
//!   from `geochip*` crates pass at the chosen level; other crates are capped
//!   at `warn` so dependency chatter stays out of chip-read traces.
//! * `init_tracing` (feature `tracing`): a `tracing-subscriber` with span
//!   close timings, text or JSON.
//!
//! Both read their level from the `GEOCHIP_LOG` environment variable.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log level (`off`, `error` … `trace`).
pub const LOG_ENV: &str = "GEOCHIP_LOG";

const OWN_PREFIX: &str = "geochip";

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl StderrLogger {
    fn threshold(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_PREFIX) {
            self.level
        } else {
            self.level.min(LevelFilter::Warn)
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.threshold(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // [  0.125s DEBUG geochip_rasterize::source] rasterizing ...
        let elapsed = self.started.elapsed().as_secs_f64();
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:>8.3}s {:<5} {}] {}",
            elapsed,
            record.level(),
            record.module_path().unwrap_or(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Level named by `raw`, or `default` when unset or not a level name.
fn parse_level(raw: Option<&str>, default: LevelFilter) -> LevelFilter {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Level from [`LOG_ENV`], falling back to `default`.
pub fn level_from_env(default: LevelFilter) -> LevelFilter {
    parse_level(std::env::var(LOG_ENV).ok().as_deref(), default)
}

/// Install the stderr logger at `level`.
///
/// Only the first call installs; later calls keep the first level and
/// return `Ok`. Fails if a different `log` backend is already set.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(())
}

/// [`init_with_level`] at the level named by [`LOG_ENV`] (default `warn`).
pub fn init_from_env() -> Result<(), log::SetLoggerError> {
    init_with_level(level_from_env(LevelFilter::Warn))
}

/// Install a global `tracing` subscriber.
///
/// The filter comes from [`LOG_ENV`] in `EnvFilter` syntax, defaulting to
/// `info` for geochip crates and `warn` elsewhere. Span close events carry
/// the duration of instrumented chip reads, rasterizations and evaluations.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(
            "warn,geochip=info,geochip_core=info,geochip_rasterize=info,\
             geochip_labels=info,geochip_eval=info",
        )
    });
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true);
    if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    }
}
