use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use kgweave::extraction::{ExtractionPipeline, ExtractionReport, LlmExtractor};
use kgweave::graph::ExportedGraph;
use kgweave::input::load_passages;
use kgweave::prompt::llm_integration::get_llm_config;

use crate::cli::{ExtractionArgs, LlmArgs};

/// Main entry point for the extract command
pub async fn run(
    input: &Path,
    output: &Path,
    extraction: &ExtractionArgs,
    llm: &LlmArgs,
) -> Result<()> {
    extract_and_export(input, output, extraction, llm).await?;
    Ok(())
}

/// Extract every passage, write the export and hand it back for further passes
pub async fn extract_and_export(
    input: &Path,
    output: &Path,
    extraction: &ExtractionArgs,
    llm: &LlmArgs,
) -> Result<ExportedGraph> {
    let passages = load_passages(input, extraction.limit)
        .with_context(|| format!("Cannot load passages from {}", input.display()))?;
    tracing::info!("Loaded {} passage(s) from {}", passages.len(), input.display());

    let config = get_llm_config(llm.llm_provider, llm.llm_model.as_deref())?;
    let pipeline = ExtractionPipeline::new(Arc::new(LlmExtractor::new(config)?))
        .with_concurrency(extraction.concurrency)
        .with_context(&extraction.context);

    let report = pipeline.run(passages).await;
    log_summary(&report);

    let exported = report.graph.export();
    exported
        .write_to(output)
        .with_context(|| format!("Cannot write graph to {}", output.display()))?;
    tracing::info!("Knowledge graph saved to {}", output.display());

    Ok(exported)
}

fn log_summary(report: &ExtractionReport) {
    tracing::info!(
        "Extracted {} relations from {} entries",
        report.total_relations,
        report.passages
    );
    tracing::info!(
        "Graph: {} nodes, {} edges",
        report.graph.node_count(),
        report.graph.edge_count()
    );
    if !report.failures.is_empty() {
        let failed: Vec<String> = report
            .failures
            .iter()
            .map(|f| (f.index + 1).to_string())
            .collect();
        tracing::warn!(
            "{} entr(ies) failed: {}",
            report.failures.len(),
            failed.join(", ")
        );
    }
    if let Some(average) = report.average_extraction_time() {
        tracing::info!("Average extraction time: {:.2}s", average.as_secs_f64());
    }
    tracing::info!(
        "Total extraction time: {:.2}s | wall-clock runtime: {:.2}s",
        report.total_extraction_time.as_secs_f64(),
        report.wall_clock.as_secs_f64()
    );
}
