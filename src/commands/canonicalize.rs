use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use kgweave::canonicalize::{Canonicalizer, LlmAliasClassifier};
use kgweave::graph::ExportedGraph;
use kgweave::prompt::llm_integration::get_llm_config;

use crate::cli::{CanonicalizationArgs, LlmArgs};

/// Main entry point for the canonicalize command
pub async fn run(
    graph_path: &Path,
    output: &Path,
    canonicalization: &CanonicalizationArgs,
    llm: &LlmArgs,
) -> Result<()> {
    let graph = ExportedGraph::read_from(graph_path)
        .with_context(|| format!("Cannot load graph from {}", graph_path.display()))?;
    canonicalize_and_export(&graph, output, canonicalization, llm).await
}

pub async fn canonicalize_and_export(
    graph: &ExportedGraph,
    output: &Path,
    canonicalization: &CanonicalizationArgs,
    llm: &LlmArgs,
) -> Result<()> {
    let config = get_llm_config(llm.llm_provider, llm.llm_model.as_deref())?;
    let canonicalizer = Canonicalizer::new(Arc::new(LlmAliasClassifier::new(config)?))
        .with_batch_size(canonicalization.batch_size)
        .with_concurrency(canonicalization.batch_concurrency);

    let result = canonicalizer.canonicalize(graph).await;

    result
        .alias_map
        .write_to(&canonicalization.alias_map)
        .with_context(|| {
            format!(
                "Cannot write alias map to {}",
                canonicalization.alias_map.display()
            )
        })?;
    tracing::info!(
        "Saved {} alias(es) to {}",
        result.alias_map.len(),
        canonicalization.alias_map.display()
    );

    result
        .graph
        .write_to(output)
        .with_context(|| format!("Cannot write graph to {}", output.display()))?;
    tracing::info!("Saved cleaned knowledge graph to {}", output.display());

    if result.stats.self_loops_dropped > 0 {
        tracing::info!(
            "Dropped {} link(s) that became self-loops",
            result.stats.self_loops_dropped
        );
    }
    if !result.failed_batches.is_empty() {
        tracing::warn!(
            "{} batch(es) failed and were left uncanonicalized",
            result.failed_batches.len()
        );
    }
    if !result.conflicts.is_empty() {
        tracing::warn!(
            "{} conflicting alias assignment(s) ignored",
            result.conflicts.len()
        );
    }

    Ok(())
}
