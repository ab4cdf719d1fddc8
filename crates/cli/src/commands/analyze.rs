//! `kubesentinel analyze` — One-shot analysis of a log file.
//!
//! Reads a JSON array of log entries, sends them through the non-streaming
//! analysis path, and prints the proposed action as pretty JSON.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kubesentinel_analysis::Analyzer;
use kubesentinel_config::AppConfig;
use kubesentinel_core::log::LogRecord;
use kubesentinel_core::transport::LlmTransport;
use kubesentinel_providers::OllamaTransport;

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let raw = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let logs: Vec<LogRecord> = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse {}: {e}", file.display()))?;

    if logs.is_empty() {
        return Err("log file contains no entries".into());
    }

    println!("🔍 Analyzing {} log entries with {}...", logs.len(), config.ollama.model);

    let transport: Arc<dyn LlmTransport> = Arc::new(OllamaTransport::new(
        &config.ollama.host,
        Duration::from_secs(config.ollama.timeout_secs),
    )?);
    let analyzer = Analyzer::new(transport, &config.ollama.model);

    match analyzer.analyze(&logs).await {
        Some(proposal) => {
            println!("\nProposed action:");
            println!("{}", serde_json::to_string_pretty(&proposal)?);
        }
        None => {
            println!("\n⚠️  No actionable proposal could be extracted from the model response.");
        }
    }

    Ok(())
}
