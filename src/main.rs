//! Scangate CLI.
//!
//! Scans files with the locally installed antivirus engine and manages
//! quarantine from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scangate::{GatewayConfig, ScanVerdict, ScannerGateway, VerdictKind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Scan uploads with a local antivirus engine.
#[derive(Parser, Debug)]
#[command(name = "scangate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a file on disk.
    Scan {
        /// File to scan.
        path: PathBuf,
    },
    /// Scan content read from standard input.
    ScanStdin {
        /// Name the content was uploaded under.
        #[arg(short, long, default_value = "stdin")]
        filename: String,
    },
    /// Report engine availability and database version.
    Status,
    /// Update the signature database.
    Update,
    /// Move a file into quarantine.
    Quarantine {
        /// File to quarantine.
        path: PathBuf,
    },
    /// Delete a file.
    Delete {
        /// File to delete.
        path: PathBuf,
    },
    /// Print example configuration and exit.
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Command::ExampleConfig = args.command {
        println!("{}", GatewayConfig::example());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(args.config.as_deref())?;
    let gateway = ScannerGateway::new(config).context("invalid configuration")?;

    match args.command {
        Command::Scan { path } => {
            let verdict = gateway.scan_file(&path).await;
            report_verdict(&path.display().to_string(), &verdict, args.json)
        }
        Command::ScanStdin { filename } => {
            let mut data = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .context("failed to read standard input")?;
            info!(filename = %filename, size = data.len(), "Scanning standard input");
            let verdict = gateway.scan_buffer(&data, &filename).await;
            report_verdict(&filename, &verdict, args.json)
        }
        Command::Status => {
            let status = gateway.get_status().await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("available:        {}", status.available);
                println!("mode:             {}", display_or_dash(status.mode));
                println!("engine version:   {}", display_or_dash(status.engine_version));
                println!("database version: {}", display_or_dash(status.database_version));
                println!("database date:    {}", display_or_dash(status.database_date));
                println!("signatures:       {}", display_or_dash(status.signature_count));
            }
            Ok(if status.available {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Command::Update => Ok(outcome(gateway.update_database().await, "database update")),
        Command::Quarantine { path } => {
            Ok(outcome(gateway.quarantine_file(&path).await, "quarantine"))
        }
        Command::Delete { path } => {
            Ok(outcome(gateway.delete_infected_file(&path).await, "delete"))
        }
        Command::ExampleConfig => Ok(ExitCode::SUCCESS),
    }
}

fn load_config(path: Option<&Path>) -> Result<GatewayConfig> {
    match path {
        Some(path) => GatewayConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(GatewayConfig::default()),
    }
}

/// Exit status for a verdict, mirroring the engine's own: 0 clean, 1 infected, 2 error.
///
/// An unavailable engine exits 0, matching the gateway's fail-open verdict.
fn verdict_exit_status(kind: VerdictKind) -> u8 {
    match kind {
        VerdictKind::Clean | VerdictKind::EngineUnavailable => 0,
        VerdictKind::Infected => 1,
        VerdictKind::Inconclusive | VerdictKind::Timeout | VerdictKind::NotFound => 2,
    }
}

/// Formats a verdict the way the engine prints its own results.
fn render_verdict(subject: &str, verdict: &ScanVerdict, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(verdict)?);
    }
    Ok(match verdict.kind() {
        VerdictKind::Infected => format!(
            "{subject}: {} FOUND",
            verdict.virus_name.as_deref().unwrap_or("Unknown")
        ),
        VerdictKind::Clean => format!("{subject}: OK"),
        kind => format!(
            "{subject}: {kind} ({})",
            verdict.error_message.as_deref().unwrap_or_default()
        ),
    })
}

fn report_verdict(subject: &str, verdict: &ScanVerdict, json: bool) -> Result<ExitCode> {
    println!("{}", render_verdict(subject, verdict, json)?);
    Ok(ExitCode::from(verdict_exit_status(verdict.kind())))
}

fn outcome(success: bool, operation: &str) -> ExitCode {
    if success {
        println!("{operation}: done");
        ExitCode::SUCCESS
    } else {
        eprintln!("{operation}: failed");
        ExitCode::FAILURE
    }
}

fn display_or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exit_status_per_verdict() {
        assert_eq!(verdict_exit_status(ScanVerdict::clean().kind()), 0);
        assert_eq!(verdict_exit_status(ScanVerdict::engine_unavailable().kind()), 0);
        assert_eq!(verdict_exit_status(ScanVerdict::infected("Eicar").kind()), 1);
        assert_eq!(verdict_exit_status(ScanVerdict::timeout().kind()), 2);
        assert_eq!(verdict_exit_status(ScanVerdict::not_found().kind()), 2);
        assert_eq!(verdict_exit_status(ScanVerdict::inconclusive("boom").kind()), 2);
    }

    #[test]
    fn test_render_verdict_text() {
        assert_eq!(
            render_verdict("a.exe", &ScanVerdict::infected("Eicar"), false).unwrap(),
            "a.exe: Eicar FOUND"
        );
        assert_eq!(
            render_verdict("a.txt", &ScanVerdict::clean(), false).unwrap(),
            "a.txt: OK"
        );
        assert_eq!(
            render_verdict("a.iso", &ScanVerdict::timeout(), false).unwrap(),
            "a.iso: timeout (Scan timeout)"
        );
    }

    #[test]
    fn test_render_verdict_json() {
        let rendered = render_verdict("a.exe", &ScanVerdict::infected("Eicar"), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["virusName"], "Eicar");
        assert_eq!(value["infected"], true);
        assert_eq!(value["safe"], false);
    }

    #[test]
    fn test_load_config_defaults_without_path() {
        assert_eq!(load_config(None).unwrap(), GatewayConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scangate.yaml");
        std::fs::write(&path, "quarantine_dir: /srv/quarantine\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.quarantine_dir, PathBuf::from("/srv/quarantine"));
    }

    #[test]
    fn test_load_config_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));
    }
}
