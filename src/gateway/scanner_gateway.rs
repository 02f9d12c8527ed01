//! The scanner gateway implementation.

use crate::audit;
use crate::config::GatewayConfig;
use crate::core::{ConfigError, EngineStatus, ScanError, ScanRequest, ScanVerdict};
use crate::engine::{
    parse_database_info, parse_scan_output, parse_version_output, run_strategies, CommandOutput,
    CommandRunner, ParsedOutput, ScanStrategy, TokioCommandRunner,
};
use crate::gateway::availability::{probe_engine, AvailabilityCache};
use crate::gateway::staging::StagedFile;
use crate::quarantine::{FilesystemQuarantine, QuarantineRecord, QuarantineStore};

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Reason recorded when a caller quarantines without a verdict in hand.
const MANUAL_QUARANTINE_REASON: &str = "quarantined by request";

/// Builder for creating a `ScannerGateway`.
pub struct ScannerGatewayBuilder {
    config: GatewayConfig,
    runner: Option<Arc<dyn CommandRunner>>,
    quarantine: Option<Arc<dyn QuarantineStore>>,
    strategies: Option<Vec<ScanStrategy>>,
}

impl ScannerGatewayBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            runner: None,
            quarantine: None,
            strategies: None,
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the command runner.
    pub fn with_runner<R: CommandRunner + 'static>(mut self, runner: R) -> Self {
        self.runner = Some(Arc::new(runner));
        self
    }

    /// Sets a command runner wrapped in an Arc.
    pub fn with_arc_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Sets the quarantine store.
    pub fn with_quarantine<Q: QuarantineStore + 'static>(mut self, store: Q) -> Self {
        self.quarantine = Some(Arc::new(store));
        self
    }

    /// Replaces the scan strategy chain derived from the configuration.
    pub fn with_strategies(mut self, strategies: Vec<ScanStrategy>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    /// Builds the gateway.
    pub fn build(self) -> Result<ScannerGateway, ConfigError> {
        self.config.validate()?;

        let strategies = self
            .strategies
            .unwrap_or_else(|| ScanStrategy::chain_from_config(&self.config));
        if strategies.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one scan strategy is required".into(),
            ));
        }

        let quarantine = self.quarantine.unwrap_or_else(|| {
            Arc::new(FilesystemQuarantine::new(self.config.quarantine_dir.clone()))
        });

        Ok(ScannerGateway {
            runner: self
                .runner
                .unwrap_or_else(|| Arc::new(TokioCommandRunner::new())),
            availability: AvailabilityCache::new(self.config.reprobe_interval()),
            quarantine,
            strategies,
            config: self.config,
        })
    }
}

impl Default for ScannerGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform "scan this content" front for an external antivirus engine.
///
/// One gateway is built per process and shared by reference or `Arc`.
/// Its only mutable state is the engine availability cache; verdicts are
/// never cached, so every scan invokes the engine afresh.
///
/// Scans and remediation never fail: scans resolve to a [`ScanVerdict`] and
/// remediation to a `bool`, with failures logged.
///
/// Concurrent calls each spawn their own engine process; there is no cap on
/// how many run at once.
pub struct ScannerGateway {
    config: GatewayConfig,
    runner: Arc<dyn CommandRunner>,
    availability: AvailabilityCache,
    quarantine: Arc<dyn QuarantineStore>,
    strategies: Vec<ScanStrategy>,
}

impl ScannerGateway {
    /// Creates a new builder.
    pub fn builder() -> ScannerGatewayBuilder {
        ScannerGatewayBuilder::new()
    }

    /// Creates a gateway that runs real engine processes.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        Self::builder().with_config(config).build()
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the quarantine store.
    pub fn quarantine_store(&self) -> &Arc<dyn QuarantineStore> {
        &self.quarantine
    }

    /// Returns whether an engine is installed, probing if the cache is stale.
    pub async fn is_available(&self) -> bool {
        if self.availability.needs_probe() {
            return self.refresh_availability().await;
        }
        self.availability.get().is_some_and(|a| a.available)
    }

    /// Probes the engine regardless of the cache.
    pub async fn refresh_availability(&self) -> bool {
        let availability = probe_engine(
            self.runner.as_ref(),
            &self.config.commands,
            self.config.timeouts.probe(),
        )
        .await;

        if availability.available {
            tracing::info!(mode = ?availability.mode, "Antivirus engine available");
        } else {
            tracing::warn!("No antivirus engine found; uploads will not be scanned");
        }
        audit::emit_availability_probed(&availability);

        let available = availability.available;
        self.availability.store(availability);
        available
    }

    /// Scans a request of either kind.
    pub async fn scan(&self, request: &ScanRequest) -> ScanVerdict {
        match request {
            ScanRequest::Path(path) => self.scan_file(path).await,
            ScanRequest::Bytes { data, filename } => self.scan_buffer(data, filename).await,
        }
    }

    /// Scans a file on disk.
    pub async fn scan_file(&self, path: impl AsRef<Path>) -> ScanVerdict {
        let path = path.as_ref();
        let start = Instant::now();

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "Scan target does not exist");
            return ScanVerdict::not_found().with_duration(start.elapsed());
        }

        if !self.is_available().await {
            audit::emit_engine_unavailable(path);
            return ScanVerdict::engine_unavailable().with_duration(start.elapsed());
        }

        let verdict = match run_strategies(self.runner.as_ref(), &self.strategies, path).await {
            Ok(executed) => {
                tracing::debug!(
                    path = %path.display(),
                    mode = %executed.mode,
                    exit_code = ?executed.output.exit_code,
                    "Engine finished"
                );
                verdict_from_output(path, &executed.output)
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(path = %path.display(), error = %e, "Scan timed out");
                ScanVerdict::timeout()
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Scan failed");
                ScanVerdict::inconclusive(e.to_string())
            }
        }
        .with_duration(start.elapsed());

        audit::emit_scan_completed(path, &verdict);
        verdict
    }

    /// Scans an in-memory upload through a staging file.
    ///
    /// The staging file is removed on every exit path.
    pub async fn scan_buffer(&self, data: &[u8], filename: &str) -> ScanVerdict {
        let start = Instant::now();

        let staged = match StagedFile::create(&self.config.temp_dir, filename, data).await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::error!(
                    filename,
                    temp_dir = %self.config.temp_dir.display(),
                    error = %e,
                    "Failed to stage upload for scanning"
                );
                return ScanVerdict::inconclusive(format!("failed to stage upload: {e}"))
                    .with_duration(start.elapsed());
            }
        };

        self.scan_file(staged.path()).await
    }

    /// Moves a file into quarantine. Returns `false` on any failure.
    pub async fn quarantine_file(&self, path: impl AsRef<Path>) -> bool {
        self.quarantine_with_reason(path.as_ref(), MANUAL_QUARANTINE_REASON)
            .await
            .is_some()
    }

    /// Moves an infected file into quarantine, recording the detection.
    pub async fn quarantine_infected(
        &self,
        path: impl AsRef<Path>,
        verdict: &ScanVerdict,
    ) -> Option<QuarantineRecord> {
        let reason = verdict
            .virus_name
            .as_deref()
            .or(verdict.error_message.as_deref())
            .unwrap_or(MANUAL_QUARANTINE_REASON);
        self.quarantine_with_reason(path.as_ref(), reason).await
    }

    async fn quarantine_with_reason(&self, path: &Path, reason: &str) -> Option<QuarantineRecord> {
        match self.quarantine.quarantine(path, reason).await {
            Ok(record) => {
                audit::emit_quarantine_event(&record, "quarantine");
                Some(record)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to quarantine file");
                None
            }
        }
    }

    /// Deletes an infected file. A missing file yields `false`.
    pub async fn delete_infected_file(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                audit::emit_file_deleted(path);
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "File to delete is already gone");
                false
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to delete infected file");
                false
            }
        }
    }

    /// Updates the signature database. Returns `false` on any failure.
    pub async fn update_database(&self) -> bool {
        let command = &self.config.commands.update;
        let start = Instant::now();

        let success = match self
            .runner
            .run(&command.program, &command.args, self.config.timeouts.update())
            .await
        {
            Ok(output) if output.success() => {
                tracing::info!(program = %command.program, "Signature database updated");
                true
            }
            Ok(output) => {
                tracing::error!(
                    program = %command.program,
                    exit_code = ?output.exit_code,
                    stderr = %output.stderr.trim(),
                    "Signature database update failed"
                );
                false
            }
            Err(e) => {
                tracing::error!(program = %command.program, error = %e, "Signature database update failed");
                false
            }
        };

        audit::emit_database_update(success, start.elapsed());
        success
    }

    /// Reports availability plus whatever version metadata can be read.
    pub async fn get_status(&self) -> EngineStatus {
        self.is_available().await;
        let availability = self
            .availability
            .get()
            .unwrap_or_else(crate::core::EngineAvailability::unavailable);
        let mut status = EngineStatus::new(&availability);

        if !availability.available {
            return status;
        }

        if let Some(output) = self.inspect(&self.config.commands.version).await {
            if let Some(version) = parse_version_output(&output.stdout) {
                status.engine_version = version.engine_version;
                status.database_version = version.database_version;
                status.database_date = version.database_date;
            } else {
                tracing::debug!(stdout = %output.stdout.trim(), "Unrecognized version output");
            }
        }

        if let Some(output) = self.inspect(&self.config.commands.database_info).await {
            let info = parse_database_info(&output.stdout);
            status.database_version = info.version.or(status.database_version);
            status.database_date = info.build_time.or(status.database_date);
            status.signature_count = info.signatures;
        }

        status
    }

    /// Runs an inspection command; any failure yields `None`.
    async fn inspect(&self, command: &crate::config::CommandSpec) -> Option<CommandOutput> {
        match self
            .runner
            .run(&command.program, &command.args, self.config.timeouts.inspect())
            .await
        {
            Ok(output) if output.success() => Some(output),
            Ok(output) => {
                tracing::debug!(
                    program = %command.program,
                    exit_code = ?output.exit_code,
                    "Inspection command exited unsuccessfully"
                );
                None
            }
            Err(e) => {
                tracing::debug!(program = %command.program, error = %e, "Inspection command failed");
                None
            }
        }
    }
}

/// Maps engine output to a verdict.
///
/// A process killed by a signal has no exit code. Unless it printed a
/// verdict marker first, it is reported the same way as a timeout.
fn verdict_from_output(path: &Path, output: &CommandOutput) -> ScanVerdict {
    match parse_scan_output(&output.stdout, &output.stderr) {
        ParsedOutput::Infected(name) => ScanVerdict::infected(name),
        ParsedOutput::Clean => ScanVerdict::clean(),
        ParsedOutput::Inconclusive(_) | ParsedOutput::Ambiguous if output.exit_code.is_none() => {
            tracing::warn!(
                path = %path.display(),
                stderr = %output.stderr.trim(),
                "Engine was killed before reporting a verdict"
            );
            ScanVerdict::timeout()
        }
        ParsedOutput::Inconclusive(message) => ScanVerdict::inconclusive(message),
        ParsedOutput::Ambiguous => {
            tracing::debug!(
                path = %path.display(),
                exit_code = ?output.exit_code,
                "Engine output carried no verdict, treating file as clean"
            );
            ScanVerdict::clean()
        }
    }
}

impl std::fmt::Debug for ScannerGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerGateway")
            .field("strategy_count", &self.strategies.len())
            .field("availability", &self.availability.get())
            .field("config", &self.config)
            .finish()
    }
}

impl From<ScanError> for ScanVerdict {
    fn from(error: ScanError) -> Self {
        if error.is_timeout() {
            ScanVerdict::timeout()
        } else {
            ScanVerdict::inconclusive(error.to_string())
        }
    }
}
