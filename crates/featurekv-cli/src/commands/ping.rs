//! Check that the online store is reachable

use anyhow::Result;
use featurekv_core::{CodecKind, OnlineStore};
use featurekv_online::RepoConfig;
use serde::Serialize;
use std::time::Instant;

use super::create_store;
use crate::output::{print_error, print_output, print_success, OutputFormat};

#[derive(Debug, Serialize)]
struct PingReport {
    project: String,
    store_type: String,
    codec: CodecKind,
    healthy: bool,
    latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(config: &RepoConfig, output_format: OutputFormat) -> Result<()> {
    let store = create_store(config)?;

    let start = Instant::now();
    let result = store.health_check().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let report = PingReport {
        project: config.project.clone(),
        store_type: store.store_type().to_string(),
        codec: store.config().codec,
        healthy: result.is_ok(),
        latency_ms,
        error: result.as_ref().err().map(ToString::to_string),
    };

    match output_format {
        OutputFormat::Table => match &result {
            Ok(()) => print_success(&format!(
                "{} online store is healthy ({} ms)",
                report.store_type, latency_ms
            )),
            Err(e) => print_error(&format!("{} online store is unhealthy: {}", report.store_type, e)),
        },
        format => print_output(&report, format)?,
    }

    result?;
    Ok(())
}
