//! Best-effort error reporting through the Sentry SDK.

use anyhow::{Context, Result};
use sentry::integrations::anyhow::capture_anyhow;
use sentry::types::{Dsn, Uuid};
use sentry::{ClientInitGuard, ClientOptions};
use slipsync_core::ErrorReporter;
use std::time::Duration;
use tracing::{debug, warn};

pub const DSN_ENV: &str = "SENTRY_DSN";

const ENVIRONMENT: &str = "production";
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

pub fn parse_dsn(dsn: &str) -> Result<Dsn> {
    dsn.trim()
        .parse::<Dsn>()
        .with_context(|| format!("parsing {DSN_ENV}"))
}

pub fn client_options(dsn: Dsn) -> ClientOptions {
    ClientOptions {
        dsn: Some(dsn),
        environment: Some(ENVIRONMENT.into()),
        release: sentry::release_name!(),
        shutdown_timeout: FLUSH_TIMEOUT,
        traces_sample_rate: 1.0,
        ..ClientOptions::default()
    }
}

/// Capture `error` on the current hub, tagged with what the loop was doing.
pub fn capture_with_context(context: &str, error: &anyhow::Error) -> Uuid {
    sentry::with_scope(
        |scope| scope.set_tag("context", context),
        || capture_anyhow(error),
    )
}

/// Owns the SDK client; queued events are flushed when it is dropped.
pub struct SentryReporter {
    _guard: ClientInitGuard,
}

impl SentryReporter {
    pub fn new(dsn: Dsn) -> Self {
        Self {
            _guard: sentry::init(client_options(dsn)),
        }
    }

    /// Reporter from `SENTRY_DSN`; `None` (with a warning) when unset.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(DSN_ENV) {
            Ok(dsn) if !dsn.trim().is_empty() => Ok(Some(Self::new(parse_dsn(&dsn)?))),
            _ => {
                warn!("{DSN_ENV} not set, error reporting disabled");
                Ok(None)
            }
        }
    }
}

impl ErrorReporter for SentryReporter {
    async fn capture(&self, context: &str, error: &anyhow::Error) {
        let id = capture_with_context(context, error);
        debug!(%id, context, "error reported");
    }
}
