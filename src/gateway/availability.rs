//! Engine availability probe and its cache.

use crate::config::EngineCommands;
use crate::core::{EngineAvailability, EngineMode};
use crate::engine::CommandRunner;

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Cached availability owned by one gateway.
///
/// A positive result is kept for the life of the gateway. A negative result
/// is re-probed once it is older than the re-probe interval, so installing
/// the engine on a running host is picked up without a restart.
#[derive(Debug)]
pub struct AvailabilityCache {
    state: RwLock<Option<EngineAvailability>>,
    reprobe_interval: Duration,
}

impl AvailabilityCache {
    /// Creates an empty cache.
    pub fn new(reprobe_interval: Duration) -> Self {
        Self {
            state: RwLock::new(None),
            reprobe_interval,
        }
    }

    /// Returns the cached result, if any.
    pub fn get(&self) -> Option<EngineAvailability> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the cached result.
    pub fn store(&self, availability: EngineAvailability) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(availability);
    }

    /// Returns `true` if the cached result should not be trusted as-is.
    pub fn needs_probe(&self) -> bool {
        match self.get() {
            None => true,
            Some(a) if a.available => false,
            Some(a) => a
                .age()
                .to_std()
                .map_or(true, |age| age >= self.reprobe_interval),
        }
    }
}

/// Probes the daemon client, then the standalone scanner.
///
/// Never fails: anything short of a zero exit status counts as absent.
pub async fn probe_engine(
    runner: &dyn CommandRunner,
    commands: &EngineCommands,
    timeout: Duration,
) -> EngineAvailability {
    let candidates = [
        (EngineMode::Daemon, &commands.daemon_scan.program),
        (EngineMode::Standalone, &commands.standalone_scan.program),
    ];

    for (mode, program) in candidates {
        match runner.run(program, &commands.probe_args, timeout).await {
            Ok(output) if output.success() => {
                tracing::debug!(%mode, program = %program, "Engine probe succeeded");
                return EngineAvailability::available(mode);
            }
            Ok(output) => {
                tracing::debug!(
                    %mode,
                    program = %program,
                    exit_code = ?output.exit_code,
                    "Engine probe exited unsuccessfully"
                );
            }
            Err(e) => {
                tracing::debug!(%mode, program = %program, error = %e, "Engine probe failed");
            }
        }
    }

    EngineAvailability::unavailable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MockResponse, MockRunner};

    #[tokio::test]
    async fn test_probe_prefers_daemon() {
        let runner = MockRunner::new()
            .with_response("clamdscan", MockResponse::ok("ClamAV 1.0.3"))
            .with_response("clamscan", MockResponse::ok("ClamAV 1.0.3"));

        let availability =
            probe_engine(&runner, &EngineCommands::default(), Duration::from_secs(1)).await;

        assert_eq!(availability.mode, Some(EngineMode::Daemon));
        assert_eq!(runner.calls_to("clamscan"), 0);
        assert_eq!(runner.calls()[0].args, vec!["--version".to_string()]);
    }

    #[tokio::test]
    async fn test_probe_falls_back_to_standalone() {
        let runner = MockRunner::new()
            .with_response("clamdscan", MockResponse::exit(2, "", "error"))
            .with_response("clamscan", MockResponse::ok("ClamAV 1.0.3"));

        let availability =
            probe_engine(&runner, &EngineCommands::default(), Duration::from_secs(1)).await;

        assert!(availability.available);
        assert_eq!(availability.mode, Some(EngineMode::Standalone));
    }

    #[tokio::test]
    async fn test_probe_fails_open() {
        let runner = MockRunner::new().with_response("clamscan", MockResponse::Timeout);

        let availability =
            probe_engine(&runner, &EngineCommands::default(), Duration::from_secs(1)).await;

        assert!(!availability.available);
        assert_eq!(runner.call_count(), 2);
    }

    #[test]
    fn test_cache_reprobe_rules() {
        let cache = AvailabilityCache::new(Duration::from_secs(60));
        assert!(cache.needs_probe());

        cache.store(EngineAvailability::unavailable());
        assert!(!cache.needs_probe());

        cache.store(EngineAvailability::available(EngineMode::Daemon));
        assert!(!cache.needs_probe());

        let eager = AvailabilityCache::new(Duration::ZERO);
        eager.store(EngineAvailability::unavailable());
        assert!(eager.needs_probe());
    }
}
