//! Runtime configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `PARTSBIN_ADDR` | `0.0.0.0:8080` |
//! | `PARTSBIN_TEMPLATES` | `templates` |
//! | `PARTSBIN_CATALOG` | unset: built-in reference catalog |
//! | `PARTSBIN_RATE_PER_SEC` | `1` |
//! | `PARTSBIN_BURST` | `3` |
//! | `PARTSBIN_GRACE_SECS` | `10` |
//! | `PARTSBIN_LOG_FORMAT` | `json` (or `pretty`) |
//!
//! Unset variables take their default. A variable that is set but does not
//! parse is an error: the process refuses to start rather than run with a
//! value nobody asked for.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::logging::LogFormat;
use crate::middleware::rate_limit::{DEFAULT_BURST, DEFAULT_RATE_PER_SEC};

const DEFAULT_TEMPLATES: &str = "templates";
const DEFAULT_GRACE_SECS: u64 = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    pub templates_dir: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub rate_per_sec: f64,
    pub burst: u32,
    pub grace_period: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr = match lookup("PARTSBIN_ADDR") {
            Some(raw) => parse("PARTSBIN_ADDR", &raw)?,
            None => default_addr(),
        };

        let rate_per_sec = match lookup("PARTSBIN_RATE_PER_SEC") {
            Some(raw) => parse("PARTSBIN_RATE_PER_SEC", &raw)?,
            None => DEFAULT_RATE_PER_SEC,
        };
        if !(rate_per_sec.is_finite() && rate_per_sec > 0.0) {
            return Err(Error::config(format!(
                "PARTSBIN_RATE_PER_SEC must be a positive number, got {rate_per_sec}"
            )));
        }

        let burst = match lookup("PARTSBIN_BURST") {
            Some(raw) => parse("PARTSBIN_BURST", &raw)?,
            None => DEFAULT_BURST,
        };
        if burst == 0 {
            return Err(Error::config("PARTSBIN_BURST must be at least 1"));
        }

        let grace_secs = match lookup("PARTSBIN_GRACE_SECS") {
            Some(raw) => parse("PARTSBIN_GRACE_SECS", &raw)?,
            None => DEFAULT_GRACE_SECS,
        };

        let log_format = match lookup("PARTSBIN_LOG_FORMAT") {
            Some(raw) => parse("PARTSBIN_LOG_FORMAT", &raw)?,
            None => LogFormat::Json,
        };

        Ok(Self {
            addr,
            templates_dir: lookup("PARTSBIN_TEMPLATES")
                .unwrap_or_else(|| DEFAULT_TEMPLATES.to_owned())
                .into(),
            catalog_path: lookup("PARTSBIN_CATALOG").map(PathBuf::from),
            rate_per_sec,
            burst,
            grace_period: Duration::from_secs(grace_secs),
            log_format,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES),
            catalog_path: None,
            rate_per_sec: DEFAULT_RATE_PER_SEC,
            burst: DEFAULT_BURST,
            grace_period: Duration::from_secs(DEFAULT_GRACE_SECS),
            log_format: LogFormat::Json,
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(format!("{key}={raw:?}: {e}")))
}
