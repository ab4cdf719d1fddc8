//! `kubesentinel check` — Diagnose configuration and connectivity.

use std::time::Duration;

use kubesentinel_config::AppConfig;
use kubesentinel_core::transport::LlmTransport;
use kubesentinel_providers::OllamaTransport;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 KubeSentinel Check");
    println!("=====================\n");

    let mut issues = 0;

    // Config: loadable and valid (env overrides included)
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid ({})", config.ollama.host);
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue found. See above for details.");
            return Ok(());
        }
    };

    // Ollama: reachable and responding on /api/tags
    let transport = OllamaTransport::new(
        &config.ollama.host,
        Duration::from_secs(config.ollama.timeout_secs),
    )?;
    match transport.health_check().await {
        Ok(true) => println!("  ✅ Ollama reachable (model: {})", config.ollama.model),
        Ok(false) => {
            println!("  ❌ Ollama responded with an error status");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Ollama unreachable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
