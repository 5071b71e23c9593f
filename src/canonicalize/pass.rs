use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::{AliasClassifier, AliasConflict, AliasGroup, AliasMap};
use crate::error::ClassificationError;
use crate::graph::{ExportedGraph, ExportedLink, ExportedNode};

/// Default number of names sent to the classifier per call
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Node and link counts before and after a rewrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub nodes_before: usize,
    pub nodes_after: usize,
    pub links_before: usize,
    pub links_after: usize,
    pub self_loops_dropped: usize,
}

/// A classification batch that failed and was left uncanonicalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub index: usize,
    pub size: usize,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct AliasBuildReport {
    pub alias_map: AliasMap,
    pub batches: usize,
    pub failed_batches: Vec<BatchFailure>,
    pub conflicts: Vec<AliasConflict>,
}

#[derive(Debug)]
pub struct CanonicalizationResult {
    pub graph: ExportedGraph,
    pub alias_map: AliasMap,
    pub stats: RewriteStats,
    pub failed_batches: Vec<BatchFailure>,
    pub conflicts: Vec<AliasConflict>,
}

/// Rewrite a graph so every name is replaced by its canonical form.
///
/// Nodes become the sorted set of distinct canonical names. Links keep their
/// label and get both endpoints canonicalized; a link whose endpoints end up
/// equal is dropped.
pub fn apply_alias_map(graph: &ExportedGraph, alias_map: &AliasMap) -> (ExportedGraph, RewriteStats) {
    let unique: BTreeSet<&str> = graph
        .nodes
        .iter()
        .map(|node| alias_map.canonical(&node.id))
        .collect();
    let nodes: Vec<ExportedNode> = unique
        .into_iter()
        .map(|id| ExportedNode { id: id.to_string() })
        .collect();

    let mut self_loops_dropped = 0;
    let mut links = Vec::with_capacity(graph.links.len());
    for link in &graph.links {
        let source = alias_map.canonical(&link.source);
        let target = alias_map.canonical(&link.target);
        if source == target {
            self_loops_dropped += 1;
            continue;
        }
        links.push(ExportedLink {
            source: source.to_string(),
            target: target.to_string(),
            label: link.label.clone(),
        });
    }

    let stats = RewriteStats {
        nodes_before: graph.nodes.len(),
        nodes_after: nodes.len(),
        links_before: graph.links.len(),
        links_after: links.len(),
        self_loops_dropped,
    };

    (ExportedGraph { nodes, links }, stats)
}

/// Builds an alias map over all node names in batches, then rewrites the graph
pub struct Canonicalizer {
    classifier: Arc<dyn AliasClassifier>,
    batch_size: usize,
    concurrency: usize,
}

impl Canonicalizer {
    pub fn new(classifier: Arc<dyn AliasClassifier>) -> Self {
        Self {
            classifier,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: 1,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Number of batches classified at once; 1 runs them sequentially
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    /// Classify `names` in contiguous batches and fold the groups into one map.
    ///
    /// Batch results are folded in batch order after every batch has
    /// finished, so first-write-wins does not depend on completion order.
    pub async fn build_alias_map(&self, names: &[String]) -> AliasBuildReport {
        let batches: Vec<Vec<String>> = names
            .chunks(self.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        let batch_count = batches.len();

        tracing::info!(
            "Classifying {} name(s) in {} batch(es) of up to {}",
            names.len(),
            batch_count,
            self.batch_size
        );

        let permits = self.concurrency.min(batch_count.max(1));
        let semaphore = Arc::new(Semaphore::new(permits));
        let handles = batches.into_iter().enumerate().map(|(index, batch)| {
            let classifier = Arc::clone(&self.classifier);
            let semaphore = Arc::clone(&semaphore);
            tokio::spawn(async move {
                let size = batch.len();
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => classifier.classify(&batch).await,
                    Err(e) => Err(ClassificationError::Provider(e.to_string())),
                };
                (index, size, result)
            })
        });

        let mut outcomes: Vec<(usize, usize, Result<Vec<AliasGroup>, String>)> =
            Vec::with_capacity(batch_count);
        for (position, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok((index, size, result)) => {
                    outcomes.push((index, size, result.map_err(|e| e.to_string())))
                }
                Err(e) => outcomes.push((position, 0, Err(e.to_string()))),
            }
        }
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut report = AliasBuildReport {
            batches: batch_count,
            ..Default::default()
        };

        for (index, size, result) in outcomes {
            match result {
                Ok(groups) => {
                    tracing::info!(
                        "Batch {}/{}: {} alias group(s)",
                        index + 1,
                        batch_count,
                        groups.len()
                    );
                    for group in &groups {
                        for conflict in report.alias_map.record_group(group) {
                            tracing::warn!(
                                "Alias '{}' already maps to '{}', ignoring '{}'",
                                conflict.alias,
                                conflict.kept,
                                conflict.rejected
                            );
                            report.conflicts.push(conflict);
                        }
                    }
                }
                Err(message) => {
                    tracing::warn!(
                        "Failed to process batch {}/{}: {}",
                        index + 1,
                        batch_count,
                        message
                    );
                    report.failed_batches.push(BatchFailure {
                        index,
                        size,
                        message,
                    });
                }
            }
        }

        report
    }

    /// Build the alias map over the graph's node ids and rewrite the graph
    pub async fn canonicalize(&self, graph: &ExportedGraph) -> CanonicalizationResult {
        let report = self.build_alias_map(&graph.node_ids()).await;
        let (rewritten, stats) = apply_alias_map(graph, &report.alias_map);

        tracing::info!("Nodes: {} -> {}", stats.nodes_before, stats.nodes_after);
        tracing::info!("Links: {} -> {}", stats.links_before, stats.links_after);

        CanonicalizationResult {
            graph: rewritten,
            alias_map: report.alias_map,
            stats,
            failed_batches: report.failed_batches,
            conflicts: report.conflicts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns fixed groups for any batch containing a trigger name and
    /// fails for batches containing "boom".
    struct ScriptedClassifier {
        groups: HashMap<String, Vec<AliasGroup>>,
        seen_batches: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedClassifier {
        fn new(groups: Vec<(&str, AliasGroup)>) -> Self {
            let mut by_trigger: HashMap<String, Vec<AliasGroup>> = HashMap::new();
            for (trigger, group) in groups {
                by_trigger.entry(trigger.to_string()).or_default().push(group);
            }
            Self {
                groups: by_trigger,
                seen_batches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AliasClassifier for ScriptedClassifier {
        async fn classify(
            &self,
            names: &[String],
        ) -> Result<Vec<AliasGroup>, ClassificationError> {
            self.seen_batches.lock().unwrap().push(names.to_vec());
            if names.iter().any(|n| n == "boom") {
                return Err(ClassificationError::Provider("rate limited".to_string()));
            }
            Ok(names
                .iter()
                .filter_map(|n| self.groups.get(n))
                .flatten()
                .cloned()
                .collect())
        }
    }

    fn graph(nodes: &[&str], links: &[(&str, &str, &str)]) -> ExportedGraph {
        ExportedGraph {
            nodes: nodes
                .iter()
                .map(|id| ExportedNode { id: id.to_string() })
                .collect(),
            links: links
                .iter()
                .map(|(s, t, l)| ExportedLink {
                    source: s.to_string(),
                    target: t.to_string(),
                    label: l.to_string(),
                })
                .collect(),
        }
    }

    fn einstein_map() -> AliasMap {
        let mut map = AliasMap::new();
        map.record_group(&AliasGroup::new("Albert Einstein", &["A. Einstein"]));
        map
    }

    #[test]
    fn test_merge_retargets_links() {
        let input = graph(
            &["A. Einstein", "Albert Einstein", "Paris"],
            &[("A. Einstein", "Paris", "visited")],
        );
        let (output, stats) = apply_alias_map(&input, &einstein_map());

        assert_eq!(output.node_ids(), vec!["Albert Einstein", "Paris"]);
        assert_eq!(
            output.links,
            vec![ExportedLink {
                source: "Albert Einstein".to_string(),
                target: "Paris".to_string(),
                label: "visited".to_string(),
            }]
        );
        assert_eq!(stats.nodes_before, 3);
        assert_eq!(stats.nodes_after, 2);
        assert_eq!(stats.links_before, 1);
        assert_eq!(stats.links_after, 1);
    }

    #[test]
    fn test_induced_self_loop_is_dropped() {
        let input = graph(
            &["A. Einstein", "Albert Einstein"],
            &[("A. Einstein", "Albert Einstein", "same as")],
        );
        let (output, stats) = apply_alias_map(&input, &einstein_map());

        assert!(output.links.is_empty());
        assert_eq!(stats.links_before, 1);
        assert_eq!(stats.links_after, 0);
        assert_eq!(stats.self_loops_dropped, 1);
    }

    #[test]
    fn test_uncanonicalized_passthrough() {
        let input = graph(&["Paris", "Berlin"], &[("Berlin", "Paris", "east of")]);
        let (output, stats) = apply_alias_map(&input, &einstein_map());

        assert_eq!(output.node_ids(), vec!["Berlin", "Paris"]);
        assert_eq!(output.links, input.links);
        assert_eq!(stats.nodes_after, 2);
    }

    #[test]
    fn test_parallel_links_survive_rewrite() {
        let input = graph(
            &["A. Einstein", "Ulm"],
            &[("A. Einstein", "Ulm", "born in"), ("A. Einstein", "Ulm", "lived in")],
        );
        let (output, _) = apply_alias_map(&input, &einstein_map());
        assert_eq!(output.links.len(), 2);
        assert!(output.links.iter().all(|l| l.source == "Albert Einstein"));
    }

    #[tokio::test]
    async fn test_batches_are_contiguous_and_bounded() {
        let classifier = Arc::new(ScriptedClassifier::new(Vec::new()));
        let names: Vec<String> = (0..7).map(|i| format!("n{}", i)).collect();

        let report = Canonicalizer::new(classifier.clone())
            .with_batch_size(3)
            .build_alias_map(&names)
            .await;

        assert_eq!(report.batches, 3);
        let mut seen = classifier.seen_batches.lock().unwrap().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                vec!["n0", "n1", "n2"],
                vec!["n3", "n4", "n5"],
                vec!["n6"],
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_batch_stays_uncanonicalized() {
        let classifier = Arc::new(ScriptedClassifier::new(vec![
            ("A. Einstein", AliasGroup::new("Albert Einstein", &["A. Einstein"])),
            ("NaCl", AliasGroup::new("sodium chloride", &["NaCl"])),
        ]));
        let names: Vec<String> = ["A. Einstein", "Albert Einstein", "boom", "NaCl"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = Canonicalizer::new(classifier)
            .with_batch_size(2)
            .build_alias_map(&names)
            .await;

        assert_eq!(report.failed_batches.len(), 1);
        assert_eq!(report.failed_batches[0].index, 1);
        assert_eq!(report.failed_batches[0].size, 2);
        assert_eq!(report.alias_map.canonical("A. Einstein"), "Albert Einstein");
        assert_eq!(report.alias_map.canonical("NaCl"), "NaCl");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_conflicts_resolve_in_batch_order() {
        let classifier = Arc::new(ScriptedClassifier::new(vec![
            ("first", AliasGroup::new("Amazon River", &["Amazon"])),
            ("second", AliasGroup::new("Amazon.com", &["Amazon"])),
        ]));
        let names: Vec<String> = ["first", "second"].iter().map(|s| s.to_string()).collect();

        let report = Canonicalizer::new(classifier)
            .with_batch_size(1)
            .with_concurrency(2)
            .build_alias_map(&names)
            .await;

        assert_eq!(report.alias_map.canonical("Amazon"), "Amazon River");
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].rejected, "Amazon.com");
    }

    #[tokio::test]
    async fn test_huge_batch_concurrency_is_clamped() {
        let classifier = Arc::new(ScriptedClassifier::new(vec![(
            "A. Einstein",
            AliasGroup::new("Albert Einstein", &["A. Einstein"]),
        )]));
        let names: Vec<String> = ["A. Einstein", "Albert Einstein", "Paris"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = Canonicalizer::new(classifier)
            .with_batch_size(1)
            .with_concurrency(usize::MAX)
            .build_alias_map(&names)
            .await;

        assert_eq!(report.batches, 3);
        assert!(report.failed_batches.is_empty());
        assert_eq!(report.alias_map.canonical("A. Einstein"), "Albert Einstein");
    }

    #[tokio::test]
    async fn test_canonicalize_end_to_end() {
        let classifier = Arc::new(ScriptedClassifier::new(vec![(
            "A. Einstein",
            AliasGroup::new("Albert Einstein", &["A. Einstein"]),
        )]));
        let input = graph(
            &["A. Einstein", "Albert Einstein", "Paris"],
            &[
                ("A. Einstein", "Paris", "visited"),
                ("A. Einstein", "Albert Einstein", "same as"),
            ],
        );

        let result = Canonicalizer::new(classifier).canonicalize(&input).await;

        assert_eq!(result.graph.node_ids(), vec!["Albert Einstein", "Paris"]);
        assert_eq!(result.graph.links.len(), 1);
        assert_eq!(result.stats.links_before, 2);
        assert_eq!(result.stats.links_after, 1);
        assert_eq!(result.alias_map.len(), 1);
        assert!(result.failed_batches.is_empty());
    }

    #[tokio::test]
    async fn test_empty_graph() {
        let classifier = Arc::new(ScriptedClassifier::new(Vec::new()));
        let result = Canonicalizer::new(classifier.clone())
            .canonicalize(&ExportedGraph::default())
            .await;

        assert_eq!(result.stats, RewriteStats::default());
        assert!(classifier.seen_batches.lock().unwrap().is_empty());
    }
}
