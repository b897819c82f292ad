//! Shared policy store.
//!
//! [`PolicyStore`] is the owned, cloneable handle through which the decision
//! point, the enforcement point and administrators share one policy graph.
//! All mutations go through a single writer lock; evaluations hold a read
//! guard for their whole traversal, so they observe the graph either before
//! or after a mutation, never halfway through one.

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::error::GraphResult;
use crate::graph::{GraphSnapshot, PolicyGraph};
use crate::node::{Node, NodeId, NodePatch};
use crate::operations::OperationSet;
use crate::relations::{Assignment, Association};

/// Cloneable handle to a shared policy graph.
///
/// # Example
///
/// ```rust,no_run
/// use ngac_graph::{Node, OperationSet, PolicyStore};
///
/// async fn example() -> ngac_graph::GraphResult<()> {
///     let store = PolicyStore::new();
///     store.add_node(Node::user(1, "alice")).await?;
///     store.add_node(Node::user_attribute(2, "developers")).await?;
///     store.create_assignment(1, 2).await?;
///
///     let graph = store.read().await;
///     assert_eq!(graph.node_count(), 2);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    graph: Arc<RwLock<PolicyGraph>>,
}

impl PolicyStore {
    /// Create a store holding an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store around an existing graph.
    pub fn from_graph(graph: PolicyGraph) -> Self {
        Self {
            graph: Arc::new(RwLock::new(graph)),
        }
    }

    /// Acquire a shared read guard over the graph.
    ///
    /// Any number of readers may hold a guard at once; mutations wait until
    /// every guard is dropped.
    pub async fn read(&self) -> RwLockReadGuard<'_, PolicyGraph> {
        self.graph.read().await
    }

    /// Insert or replace a node.
    pub async fn add_node(&self, node: Node) -> GraphResult<Option<Node>> {
        self.graph.write().await.add_node(node)
    }

    /// Delete a node and its incident relations.
    pub async fn delete_node(&self, id: NodeId) -> GraphResult<Node> {
        self.graph.write().await.delete_node(id)
    }

    /// Clone a node out of the graph.
    pub async fn get_node(&self, id: NodeId) -> GraphResult<Node> {
        self.graph.read().await.get_node(id).cloned()
    }

    /// Merge a patch into a node, returning the updated node.
    pub async fn update_node(&self, id: NodeId, patch: &NodePatch) -> GraphResult<Node> {
        self.graph.write().await.update_node(id, patch).cloned()
    }

    /// Record a containment relation.
    pub async fn create_assignment(&self, member: NodeId, container: NodeId) -> GraphResult<Option<Assignment>> {
        self.graph.write().await.create_assignment(member, container)
    }

    /// Remove a containment relation.
    pub async fn delete_assignment(&self, member: NodeId, container: NodeId) -> GraphResult<Assignment> {
        self.graph.write().await.delete_assignment(member, container)
    }

    /// Record a grant relation.
    pub async fn create_association(
        &self,
        source: NodeId,
        destination: NodeId,
        operations: OperationSet,
    ) -> GraphResult<Option<Association>> {
        self.graph
            .write()
            .await
            .create_association(source, destination, operations)
    }

    /// Replace the operations of a grant relation.
    pub async fn update_association(
        &self,
        source: NodeId,
        destination: NodeId,
        operations: OperationSet,
    ) -> GraphResult<Association> {
        self.graph
            .write()
            .await
            .update_association(source, destination, operations)
    }

    /// Remove a grant relation.
    pub async fn delete_association(&self, source: NodeId, destination: NodeId) -> GraphResult<Association> {
        self.graph.write().await.delete_association(source, destination)
    }

    /// Apply several mutations under one write lock.
    ///
    /// `f` works on a copy of the graph. The copy replaces the shared graph
    /// only if `f` succeeds, so readers observe either none or all of its
    /// changes.
    pub async fn transaction<T, F>(&self, f: F) -> GraphResult<T>
    where
        F: FnOnce(&mut PolicyGraph) -> GraphResult<T>,
    {
        let mut graph = self.graph.write().await;
        let mut staged = graph.clone();
        match f(&mut staged) {
            Ok(value) => {
                *graph = staged;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Transaction rolled back");
                Err(e)
            }
        }
    }

    /// Copy the graph into its serializable form.
    pub async fn snapshot(&self) -> GraphSnapshot {
        self.graph.read().await.snapshot()
    }

    /// Replace the whole graph.
    pub async fn replace(&self, graph: PolicyGraph) {
        *self.graph.write().await = graph;
        tracing::debug!("Policy graph replaced");
    }
}
