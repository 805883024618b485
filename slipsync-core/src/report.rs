//! Optional error side channel (crash/monitoring sinks).

/// Best-effort sink for errors the reconciler recovers from.
///
/// Implementations must swallow their own failures.
#[allow(async_fn_in_trait)]
pub trait ErrorReporter {
    async fn capture(&self, context: &str, error: &anyhow::Error);
}

/// Reporter used when no monitoring sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReporter;

impl ErrorReporter for NoReporter {
    async fn capture(&self, _context: &str, _error: &anyhow::Error) {}
}
