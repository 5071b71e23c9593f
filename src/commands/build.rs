use anyhow::Result;
use std::path::Path;
use std::time::Instant;

use crate::cli::{CanonicalizationArgs, ExtractionArgs, LlmArgs};
use crate::commands::{canonicalize, extract};

/// Two-phase run: the canonicalization pass only starts after the raw graph
/// has been fully exported.
pub async fn run(
    input: &Path,
    raw_output: &Path,
    output: &Path,
    extraction: &ExtractionArgs,
    canonicalization: &CanonicalizationArgs,
    llm: &LlmArgs,
) -> Result<()> {
    let start_time = Instant::now();

    tracing::info!("Phase 1: extracting relations");
    let exported = extract::extract_and_export(input, raw_output, extraction, llm).await?;

    tracing::info!("Phase 2: canonicalizing entity names");
    canonicalize::canonicalize_and_export(&exported, output, canonicalization, llm).await?;

    tracing::info!(
        "Build complete in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgweave::canonicalize::pass::DEFAULT_BATCH_SIZE;
    use kgweave::extraction::pipeline::DEFAULT_CONTEXT;
    use kgweave::graph::ExportedGraph;
    use kgweave::prompt::llm_integration::LlmProvider;
    use tempfile::tempdir;

    fn mock_llm() -> LlmArgs {
        LlmArgs {
            llm_provider: Some(LlmProvider::Mock),
            llm_model: None,
        }
    }

    fn extraction_args() -> ExtractionArgs {
        ExtractionArgs {
            concurrency: 4,
            context: DEFAULT_CONTEXT.to_string(),
            limit: None,
        }
    }

    fn canonicalization_args(alias_map: &Path) -> CanonicalizationArgs {
        CanonicalizationArgs {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_concurrency: 1,
            alias_map: alias_map.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_both_phases_write_every_artifact() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("passages.txt");
        std::fs::write(&input, "Water boils at 100 C.\n\nIce melts at 0 C.\n").unwrap();

        let raw = dir.path().join("out/raw.json");
        let cleaned = dir.path().join("out/cleaned.json");
        let alias_map = dir.path().join("out/aliases.json");

        let exported = extract::extract_and_export(&input, &raw, &extraction_args(), &mock_llm())
            .await
            .unwrap();
        canonicalize::canonicalize_and_export(
            &exported,
            &cleaned,
            &canonicalization_args(&alias_map),
            &mock_llm(),
        )
        .await
        .unwrap();

        assert!(raw.exists());
        assert!(cleaned.exists());
        assert!(alias_map.exists());
        assert_eq!(ExportedGraph::read_from(&raw).unwrap(), exported);
    }

    #[tokio::test]
    async fn test_unwritable_output_is_fatal() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("passages.txt");
        std::fs::write(&input, "Water boils at 100 C.\n").unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = extract::extract_and_export(
            &input,
            &blocker.join("raw.json"),
            &extraction_args(),
            &mock_llm(),
        )
        .await;
        assert!(result.is_err());

        let result = canonicalize::canonicalize_and_export(
            &ExportedGraph::default(),
            &blocker.join("cleaned.json"),
            &canonicalization_args(&dir.path().join("aliases.json")),
            &mock_llm(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_input_is_fatal() {
        let dir = tempdir().unwrap();
        let result = extract::extract_and_export(
            &dir.path().join("absent.txt"),
            &dir.path().join("raw.json"),
            &extraction_args(),
            &mock_llm(),
        )
        .await;
        assert!(result.is_err());
    }
}
