//! Gateway configuration.
//!
//! Every engine command is configurable so the gateway makes no assumption
//! about where ClamAV is installed or which client binaries a host ships.
//! Configuration can be built in code through the `with_*` methods or
//! loaded from YAML with [`GatewayConfig::load`].

use crate::core::ConfigError;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// A program plus its fixed leading arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program name or absolute path.
    pub program: String,

    /// Arguments passed before any per-call argument.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Creates a command spec.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Engine commands used by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineCommands {
    /// Client of the long-running daemon; the file path is appended.
    pub daemon_scan: CommandSpec,

    /// Standalone scanner; the file path is appended.
    pub standalone_scan: CommandSpec,

    /// Arguments appended to a scan program to probe that it is installed.
    pub probe_args: Vec<String>,

    /// Prints `ClamAV <engine>/<database>/<date>`.
    pub version: CommandSpec,

    /// Prints signature database metadata.
    pub database_info: CommandSpec,

    /// Downloads fresh signatures.
    pub update: CommandSpec,
}

impl Default for EngineCommands {
    fn default() -> Self {
        Self {
            daemon_scan: CommandSpec::new("clamdscan", ["--no-summary"]),
            standalone_scan: CommandSpec::new("clamscan", ["--no-summary"]),
            probe_args: vec!["--version".to_string()],
            version: CommandSpec::new("clamscan", ["--version"]),
            database_info: CommandSpec::new("sigtool", ["--info", "/var/lib/clamav/daily.cld"]),
            update: CommandSpec::new("freshclam", Vec::<String>::new()),
        }
    }
}

/// Time bounds for engine commands, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Daemon-client scan.
    pub daemon_scan_secs: u64,
    /// Standalone scan; slower because signatures load on every run.
    pub standalone_scan_secs: u64,
    /// Signature database update.
    pub update_secs: u64,
    /// Availability probe, per program.
    pub probe_secs: u64,
    /// Version and database-info inspection.
    pub inspect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            daemon_scan_secs: 30,
            standalone_scan_secs: 60,
            update_secs: 300,
            probe_secs: 10,
            inspect_secs: 10,
        }
    }
}

impl TimeoutConfig {
    /// Daemon-client scan bound.
    pub fn daemon_scan(&self) -> Duration {
        Duration::from_secs(self.daemon_scan_secs)
    }

    /// Standalone scan bound.
    pub fn standalone_scan(&self) -> Duration {
        Duration::from_secs(self.standalone_scan_secs)
    }

    /// Database update bound.
    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }

    /// Probe bound.
    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    /// Inspection bound.
    pub fn inspect(&self) -> Duration {
        Duration::from_secs(self.inspect_secs)
    }
}

/// Root configuration for a [`ScannerGateway`](crate::ScannerGateway).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Engine commands.
    pub commands: EngineCommands,

    /// Command time bounds.
    pub timeouts: TimeoutConfig,

    /// Staging directory for buffer scans.
    pub temp_dir: PathBuf,

    /// Destination of quarantined files.
    pub quarantine_dir: PathBuf,

    /// Output fragments meaning the daemon is not running.
    pub daemon_down_markers: Vec<String>,

    /// Minimum age of a negative availability result before it is re-probed.
    pub reprobe_interval_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            commands: EngineCommands::default(),
            timeouts: TimeoutConfig::default(),
            temp_dir: PathBuf::from("temp/scans"),
            quarantine_dir: PathBuf::from("quarantine"),
            daemon_down_markers: default_daemon_down_markers(),
            reprobe_interval_secs: 60,
        }
    }
}

fn default_daemon_down_markers() -> Vec<String> {
    [
        "Can't connect to clamd",
        "Could not connect to clamd",
        "ERROR: Could not lookup",
        "clamd is not running",
        "Connection refused",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl GatewayConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` references are replaced with environment values before
    /// parsing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        let config: GatewayConfig = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let commands = [
            ("commands.daemon_scan", &self.commands.daemon_scan),
            ("commands.standalone_scan", &self.commands.standalone_scan),
            ("commands.version", &self.commands.version),
            ("commands.database_info", &self.commands.database_info),
            ("commands.update", &self.commands.update),
        ];
        for (name, spec) in commands {
            if spec.program.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name}.program must not be empty")));
            }
        }

        let timeouts = [
            ("timeouts.daemon_scan_secs", self.timeouts.daemon_scan_secs),
            ("timeouts.standalone_scan_secs", self.timeouts.standalone_scan_secs),
            ("timeouts.update_secs", self.timeouts.update_secs),
            ("timeouts.probe_secs", self.timeouts.probe_secs),
            ("timeouts.inspect_secs", self.timeouts.inspect_secs),
        ];
        for (name, secs) in timeouts {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }

        if self.temp_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("temp_dir must not be empty".into()));
        }
        if self.quarantine_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("quarantine_dir must not be empty".into()));
        }

        Ok(())
    }

    /// Returns the re-probe interval.
    pub fn reprobe_interval(&self) -> Duration {
        Duration::from_secs(self.reprobe_interval_secs)
    }

    /// Sets the engine commands.
    pub fn with_commands(mut self, commands: EngineCommands) -> Self {
        self.commands = commands;
        self
    }

    /// Sets the command time bounds.
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the staging directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Sets the quarantine directory.
    pub fn with_quarantine_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.quarantine_dir = dir.into();
        self
    }

    /// Sets the re-probe interval.
    pub fn with_reprobe_interval(mut self, interval: Duration) -> Self {
        self.reprobe_interval_secs = interval.as_secs();
        self
    }

    /// Returns an example configuration file.
    pub fn example() -> String {
        r#"# scangate configuration

# Engine commands. Each scan program gets the file path appended.
commands:
  daemon_scan:
    program: clamdscan
    args: ["--no-summary"]
  standalone_scan:
    program: clamscan
    args: ["--no-summary"]
  probe_args: ["--version"]
  version:
    program: clamscan
    args: ["--version"]
  database_info:
    program: sigtool
    args: ["--info", "/var/lib/clamav/daily.cld"]
  update:
    program: freshclam

timeouts:
  daemon_scan_secs: 30
  standalone_scan_secs: 60
  update_secs: 300
  probe_secs: 10
  inspect_secs: 10

# Relative to the working directory; created on demand.
temp_dir: temp/scans
quarantine_dir: quarantine

# Output fragments meaning "daemon not running": fall back to the standalone scanner.
daemon_down_markers:
  - "Can't connect to clamd"
  - "Could not connect to clamd"
  - "Connection refused"

reprobe_interval_secs: 60
"#
        .to_string()
    }
}

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// Expand `${VAR}` references from the environment; unset variables become empty.
fn expand_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.commands.daemon_scan.program, "clamdscan");
        assert_eq!(config.commands.standalone_scan.program, "clamscan");
        assert_eq!(config.timeouts.daemon_scan(), Duration::from_secs(30));
        assert_eq!(config.timeouts.standalone_scan(), Duration::from_secs(60));
        assert_eq!(config.timeouts.update(), Duration::from_secs(300));
        assert_eq!(config.temp_dir, PathBuf::from("temp/scans"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = GatewayConfig::from_yaml(
            "timeouts:\n  daemon_scan_secs: 5\nquarantine_dir: /var/quarantine\n",
        )
        .unwrap();

        assert_eq!(config.timeouts.daemon_scan_secs, 5);
        assert_eq!(config.timeouts.standalone_scan_secs, 60);
        assert_eq!(config.quarantine_dir, PathBuf::from("/var/quarantine"));
        assert_eq!(config.commands, EngineCommands::default());
    }

    #[test]
    fn test_example_config_parses() {
        let config = GatewayConfig::from_yaml(&GatewayConfig::example()).unwrap();
        assert_eq!(config.quarantine_dir, PathBuf::from("quarantine"));
        assert_eq!(config.daemon_down_markers.len(), 3);
        assert_eq!(config.commands, EngineCommands::default());
    }

    #[test]
    fn test_env_vars_expanded() {
        std::env::set_var("SCANGATE_TEST_QUARANTINE_DIR", "/srv/quarantine");
        let config =
            GatewayConfig::from_yaml("quarantine_dir: ${SCANGATE_TEST_QUARANTINE_DIR}\n").unwrap();
        assert_eq!(config.quarantine_dir, PathBuf::from("/srv/quarantine"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let err = GatewayConfig::from_yaml("timeouts:\n  probe_secs: 0\n").unwrap_err();
        assert!(err.to_string().contains("timeouts.probe_secs"));
    }

    #[test]
    fn test_validate_rejects_empty_program() {
        let err = GatewayConfig::from_yaml("commands:\n  update:\n    program: \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = GatewayConfig::load(Path::new("/no/such/scangate.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_expand_env_vars_unset_is_empty() {
        assert_eq!(
            expand_env_vars("dir: ${SCANGATE_TEST_SURELY_UNSET}/x"),
            "dir: /x"
        );
    }
}
