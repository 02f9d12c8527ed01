//! Basic scan example demonstrating buffer and file scanning.
//!
//! This example shows how to:
//! - Build a gateway around a scripted engine
//! - Scan an upload held in memory
//! - Quarantine a file the engine flags
//!
//! Run with: cargo run --example basic_scan

use scangate::engine::{MockResponse, MockRunner};
use scangate::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    println!("=== Scangate Basic Scan Example ===\n");

    let workdir = std::env::temp_dir().join(format!("scangate-demo-{}", std::process::id()));
    let config = GatewayConfig::default()
        .with_temp_dir(workdir.join("temp"))
        .with_quarantine_dir(workdir.join("quarantine"));

    // A daemon that answers the probe and reports every file clean
    let runner = MockRunner::new()
        .with_response_for("clamdscan", "--version", MockResponse::ok("ClamAV 1.0.3/27103"))
        .with_response("clamdscan", MockResponse::ok("upload: OK"));

    let gateway = ScannerGateway::builder()
        .with_config(config.clone())
        .with_runner(runner)
        .build()?;

    let verdict = gateway
        .scan_buffer(b"This is the content of a clean file.", "document.txt")
        .await;
    println!("document.txt -> {} ({} ms)", verdict.kind(), verdict.scan_duration_ms);

    println!("\n=== Scanning an Infected File ===\n");

    let infected_runner = MockRunner::new()
        .with_response_for("clamdscan", "--version", MockResponse::ok("ClamAV 1.0.3/27103"))
        .with_response(
            "clamdscan",
            MockResponse::exit(1, "upload: Win.Test.EICAR_HDB-1 FOUND", ""),
        );
    let infected_gateway = ScannerGateway::builder()
        .with_config(config)
        .with_runner(infected_runner)
        .build()?;

    tokio::fs::create_dir_all(&workdir).await?;
    let upload = workdir.join("malware.exe");
    tokio::fs::write(&upload, b"malicious content").await?;

    let verdict = infected_gateway.scan_file(&upload).await;
    if verdict.should_block() {
        println!(
            "malware.exe -> infected with {}",
            verdict.virus_name.as_deref().unwrap_or("Unknown")
        );
        if let Some(record) = infected_gateway.quarantine_infected(&upload, &verdict).await {
            println!("Quarantined as {}", record.quarantined_path.display());
            if let Some(digest) = &record.digest {
                println!("Content hash: {digest}");
            }
        }
    }

    println!("\nJSON verdict: {}", serde_json::to_string(&verdict)?);

    tokio::fs::remove_dir_all(&workdir).await?;
    println!("\n=== Example Complete ===");
    Ok(())
}
