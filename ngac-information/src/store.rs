//! Information store implementation
//!
//! This module provides the information store abstraction and an in-memory
//! implementation. The store keeps the most recent serialized policy graph
//! exactly as it was submitted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use ngac_graph::{GraphSnapshot, PolicyGraph};

use crate::error::{InformationError, InformationResult};

/// Description of the stored graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphMetadata {
    /// Identifier assigned when the graph was stored.
    pub id: Uuid,
    /// When the graph was stored.
    pub stored_at: DateTime<Utc>,
    /// Number of graphs stored so far, this one included.
    pub version: u64,
    /// Node count.
    pub node_count: usize,
    /// Assignment count.
    pub assignment_count: usize,
    /// Association count.
    pub association_count: usize,
    /// Length of the serialized form in bytes.
    pub size_bytes: usize,
}

/// Information store trait for policy graph storage.
#[async_trait]
pub trait InformationStore: Send + Sync {
    /// Validate and store a serialized graph, replacing the previous one.
    ///
    /// The input must be a JSON [`GraphSnapshot`] describing a valid graph.
    /// On failure the previously stored graph is kept.
    async fn store_graph(&self, serialized: &str) -> InformationResult<GraphMetadata>;

    /// Rebuild the stored graph.
    async fn retrieve_graph(&self) -> InformationResult<PolicyGraph>;

    /// The stored serialized form, byte-for-byte.
    async fn retrieve_graph_serialized(&self) -> InformationResult<String>;

    /// Describe the stored graph.
    async fn metadata(&self) -> InformationResult<GraphMetadata>;

    /// Serialize and store a graph.
    async fn store_policy_graph(&self, graph: &PolicyGraph) -> InformationResult<GraphMetadata> {
        let serialized = serde_json::to_string(&graph.snapshot())?;
        self.store_graph(&serialized).await
    }
}

/// Information store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InformationStoreConfig {
    /// Pretty-print graphs serialized by `store_policy_graph`.
    pub pretty: bool,
}

impl InformationStoreConfig {
    /// Set pretty-printing.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

#[derive(Debug, Clone)]
struct StoredGraph {
    metadata: GraphMetadata,
    serialized: String,
}

/// In-memory information store.
///
/// Clones share the same storage.
///
/// # Example
///
/// ```rust,no_run
/// use ngac_information::{InformationStore, MemoryInformationStore};
/// use ngac_graph::{Node, PolicyGraph};
///
/// async fn example() -> ngac_information::InformationResult<()> {
///     let store = MemoryInformationStore::new();
///
///     let mut graph = PolicyGraph::new();
///     graph.add_node(Node::policy_class(1, "pc"))?;
///     let metadata = store.store_policy_graph(&graph).await?;
///     assert_eq!(metadata.node_count, 1);
///
///     let restored = store.retrieve_graph().await?;
///     assert_eq!(restored.snapshot(), graph.snapshot());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryInformationStore {
    current: Arc<RwLock<Option<StoredGraph>>>,
    config: InformationStoreConfig,
}

impl MemoryInformationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given configuration.
    pub fn with_config(config: InformationStoreConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            config,
        }
    }

    /// Get the store configuration.
    pub fn config(&self) -> &InformationStoreConfig {
        &self.config
    }

    async fn stored(&self) -> InformationResult<StoredGraph> {
        self.current
            .read()
            .await
            .clone()
            .ok_or(InformationError::NothingStored)
    }
}

fn parse(serialized: &str) -> InformationResult<PolicyGraph> {
    let snapshot: GraphSnapshot = serde_json::from_str(serialized)?;
    Ok(PolicyGraph::from_snapshot(snapshot)?)
}

#[async_trait]
impl InformationStore for MemoryInformationStore {
    async fn store_graph(&self, serialized: &str) -> InformationResult<GraphMetadata> {
        let graph = match parse(serialized) {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected policy graph");
                return Err(e);
            }
        };

        let mut current = self.current.write().await;
        let version = current.as_ref().map_or(0, |stored| stored.metadata.version) + 1;
        let metadata = GraphMetadata {
            id: Uuid::now_v7(),
            stored_at: Utc::now(),
            version,
            node_count: graph.node_count(),
            assignment_count: graph.assignment_count(),
            association_count: graph.association_count(),
            size_bytes: serialized.len(),
        };

        tracing::info!(
            graph_id = %metadata.id,
            version = version,
            nodes = metadata.node_count,
            "Policy graph stored"
        );

        *current = Some(StoredGraph {
            metadata: metadata.clone(),
            serialized: serialized.to_string(),
        });

        Ok(metadata)
    }

    async fn retrieve_graph(&self) -> InformationResult<PolicyGraph> {
        let stored = self.stored().await?;
        tracing::debug!(graph_id = %stored.metadata.id, "Policy graph retrieved");
        parse(&stored.serialized)
    }

    async fn retrieve_graph_serialized(&self) -> InformationResult<String> {
        Ok(self.stored().await?.serialized)
    }

    async fn metadata(&self) -> InformationResult<GraphMetadata> {
        Ok(self.stored().await?.metadata)
    }

    async fn store_policy_graph(&self, graph: &PolicyGraph) -> InformationResult<GraphMetadata> {
        let snapshot = graph.snapshot();
        let serialized = if self.config.pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        self.store_graph(&serialized).await
    }
}
