use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use kgweave::canonicalize::pass::DEFAULT_BATCH_SIZE;
use kgweave::extraction::pipeline::{DEFAULT_CONCURRENCY, DEFAULT_CONTEXT};
use kgweave::prompt::llm_integration::LlmProvider;

/// kgweave: builds a knowledge graph from text passages with an LLM
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Builds and canonicalizes knowledge graphs from text passages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract relations from passages and export the merged graph
    Extract {
        /// Passage file (.json array of strings, or one passage per line)
        input: PathBuf,

        /// Where to write the exported graph
        #[arg(long, short, default_value = "outputs/knowledge_graph.json")]
        output: PathBuf,

        #[command(flatten)]
        extraction: ExtractionArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Merge aliased entity names in an exported graph
    Canonicalize {
        /// Exported graph to rewrite
        graph: PathBuf,

        /// Where to write the rewritten graph
        #[arg(long, short, default_value = "outputs/cleaned_knowledge_graph.json")]
        output: PathBuf,

        #[command(flatten)]
        canonicalization: CanonicalizationArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Extract, export, then canonicalize in one run
    Build {
        /// Passage file (.json array of strings, or one passage per line)
        input: PathBuf,

        /// Where to write the raw exported graph
        #[arg(long, default_value = "outputs/knowledge_graph.json")]
        raw_output: PathBuf,

        /// Where to write the canonicalized graph
        #[arg(long, short, default_value = "outputs/cleaned_knowledge_graph.json")]
        output: PathBuf,

        #[command(flatten)]
        extraction: ExtractionArgs,

        #[command(flatten)]
        canonicalization: CanonicalizationArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },
}

#[derive(Args, Clone, Debug)]
pub struct ExtractionArgs {
    /// Maximum number of extraction calls in flight
    #[arg(long, short = 'k', default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Context hint passed with every passage
    #[arg(long, default_value = DEFAULT_CONTEXT)]
    pub context: String,

    /// Only process the first N passages
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Clone, Debug)]
pub struct CanonicalizationArgs {
    /// Names per classification call
    #[arg(long, short = 'b', default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Classification batches in flight (1 = sequential)
    #[arg(long, default_value_t = 1)]
    pub batch_concurrency: usize,

    /// Where to write the alias -> canonical map
    #[arg(long, default_value = "outputs/alias_to_canonical.json")]
    pub alias_map: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct LlmArgs {
    /// LLM provider; falls back to LLM_PROVIDER, then openrouter
    #[arg(long, value_enum)]
    pub llm_provider: Option<LlmProvider>,

    /// Model name for the provider
    #[arg(long)]
    pub llm_model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_defaults() {
        let cli = Cli::parse_from(["kgweave", "extract", "passages.txt"]);
        match cli.command {
            Commands::Extract {
                input,
                output,
                extraction,
                llm,
            } => {
                assert_eq!(input, PathBuf::from("passages.txt"));
                assert_eq!(output, PathBuf::from("outputs/knowledge_graph.json"));
                assert_eq!(extraction.concurrency, 100);
                assert_eq!(extraction.context, "Scientific passage");
                assert!(extraction.limit.is_none());
                assert!(llm.llm_provider.is_none());
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn test_build_flags() {
        let cli = Cli::parse_from([
            "kgweave",
            "build",
            "rows.json",
            "-k",
            "8",
            "--batch-size",
            "50",
            "--llm-provider",
            "ollama",
        ]);
        match cli.command {
            Commands::Build {
                extraction,
                canonicalization,
                llm,
                ..
            } => {
                assert_eq!(extraction.concurrency, 8);
                assert_eq!(canonicalization.batch_size, 50);
                assert_eq!(canonicalization.batch_concurrency, 1);
                assert_eq!(llm.llm_provider, Some(LlmProvider::Ollama));
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = Cli::try_parse_from([
            "kgweave",
            "extract",
            "passages.txt",
            "--llm-provider",
            "opnai",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_alias_parses() {
        let cli = Cli::parse_from([
            "kgweave",
            "canonicalize",
            "graph.json",
            "--llm-provider",
            "google",
        ]);
        match cli.command {
            Commands::Canonicalize { llm, .. } => {
                assert_eq!(llm.llm_provider, Some(LlmProvider::Gemini));
            }
            _ => panic!("expected canonicalize command"),
        }
    }
}
