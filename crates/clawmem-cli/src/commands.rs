//! Command implementations shared by the one-shot subcommands and the REPL.
//!
//! Failures are returned, not printed; the caller reports them once.

use clawmem_capture::{RecencyDedupCache, TriggerClassifier, build_query, detect_type, normalize};
use clawmem_client::WorkerClient;
use clawmem_runtime::{MemoryTools, PluginConfig, ToolOutput};
use clawmem_types::MemError;
use colored::Colorize;
use serde_json::json;
use std::sync::Arc;

/// Everything a command needs to talk to the worker.
pub struct Session {
    pub config: PluginConfig,
    pub client: WorkerClient,
    pub tools: MemoryTools,
}

impl Session {
    pub fn new(config: PluginConfig) -> Self {
        let client = WorkerClient::new(config.worker_url.as_str());
        let tools = MemoryTools::new(Arc::new(client.clone()));
        Self { config, client, tools }
    }
}

/// Health plus counters, human-readable.
pub async fn status(session: &Session) -> Result<(), String> {
    let url = session.client.base_url();
    if !session.client.health().await {
        return Err(format!("worker not responding at {url}"));
    }
    let stats = session
        .client
        .stats()
        .await
        .map_err(|e| MemError::from(e).to_string())?;
    println!("{} Worker running at {}", "✓".green().bold(), url.bold());
    println!("   Sessions: {}", stats.session_count);
    println!("   Observations: {}", stats.observation_count);
    Ok(())
}

/// Raw search results as pretty JSON.
pub async fn search(session: &Session, query: &str, limit: usize) -> Result<(), String> {
    let results = session
        .client
        .search(query, limit)
        .await
        .map_err(|e| MemError::from(e).to_string())?;
    let out = serde_json::to_string_pretty(&results).map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}

pub async fn stats(session: &Session) -> Result<(), String> {
    let stats = session
        .client
        .stats()
        .await
        .map_err(|e| MemError::from(e).to_string())?;
    let out = serde_json::to_string_pretty(&stats).map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}

pub async fn get(session: &Session, id: i64) -> Result<(), String> {
    let out = session.tools.execute("memory_get", json!({ "id": id }), None).await;
    report(out)
}

pub async fn delete(session: &Session, id: i64) -> Result<(), String> {
    let out = session.tools.execute("memory_delete", json!({ "id": id }), None).await;
    report(out)
}

pub async fn remember(session: &Session, text: &str, kind: Option<&str>) -> Result<(), String> {
    let params = json!({ "text": text, "type": kind });
    let out = session.tools.execute("memory_store", params, None).await;
    report(out)
}

fn report(out: ToolOutput) -> Result<(), String> {
    if out.is_error() {
        return Err(out.text);
    }
    println!("{}", out.text);
    Ok(())
}

/// Dry-run the capture engine on `text` without touching the worker.
pub fn classify(text: &str) {
    let decision = TriggerClassifier::default().classify(text, &RecencyDedupCache::default());
    let verdict = if decision.accepted {
        "capture".green().bold()
    } else {
        "skip".yellow().bold()
    };
    println!("  Decision    : {verdict} ({})", decision.reason);
    println!("  Type        : {}", detect_type(text));
    println!("  Fingerprint : {}", normalize(text).as_str().dimmed());
    match build_query(Some(text)) {
        Some(q) => println!("  Recall query: {q}"),
        None => println!("  Recall query: {}", "<none>".dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_hands_tool_errors_back_to_the_caller() {
        let failed = ToolOutput {
            text: "Memory #6 not found.".into(),
            details: json!({"error": "not_found"}),
        };
        assert_eq!(report(failed), Err("Memory #6 not found.".to_string()));

        let ok = ToolOutput {
            text: "Deleted memory #8".into(),
            details: json!({"action": "deleted", "id": 8}),
        };
        assert_eq!(report(ok), Ok(()));
    }

    #[tokio::test]
    async fn status_returns_unreachable_worker_as_error() {
        let session = Session::new(PluginConfig {
            worker_url: "http://127.0.0.1:9".into(),
            ..PluginConfig::default()
        });
        let err = status(&session).await.unwrap_err();
        assert_eq!(err, "worker not responding at http://127.0.0.1:9");
    }
}
