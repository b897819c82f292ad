//! Policy decision point.
//!
//! Binds a [`DecisionEngine`] to a shared [`PolicyStore`]. Each evaluation
//! holds one read guard for its whole traversal.

use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;

use ngac_graph::{NodeId, PolicyStore};

use crate::config::EngineConfig;
use crate::engine::{Decision, DecisionEngine, Evaluation};
use crate::error::DecisionResult;

/// Decision point over a shared policy store.
#[derive(Debug, Clone)]
pub struct PolicyDecisionPoint {
    store: PolicyStore,
    engine: DecisionEngine,
}

impl PolicyDecisionPoint {
    /// Create a decision point with the default engine configuration.
    pub fn new(store: PolicyStore) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create a decision point with the given engine configuration.
    pub fn with_config(store: PolicyStore, config: EngineConfig) -> Self {
        Self {
            store,
            engine: DecisionEngine::with_config(config),
        }
    }

    /// The store this point decides against.
    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    /// The underlying engine.
    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Decide whether `user` may perform `action` on `resource`.
    pub async fn evaluate(&self, user: NodeId, resource: NodeId, action: &str) -> DecisionResult<Decision> {
        let graph = self.store.read().await;
        self.engine.evaluate(&*graph, user, resource, action)
    }

    /// Decide a request, giving up once `cancel` is set.
    pub async fn evaluate_cancellable(
        &self,
        user: NodeId,
        resource: NodeId,
        action: &str,
        cancel: &AtomicBool,
    ) -> DecisionResult<Decision> {
        let graph = self.store.read().await;
        self.engine
            .evaluate_cancellable(&*graph, user, resource, action, cancel)
    }

    /// Decide a request and report the destinations involved.
    pub async fn explain(&self, user: NodeId, resource: NodeId, action: &str) -> DecisionResult<Evaluation> {
        let graph = self.store.read().await;
        self.engine.explain(&*graph, user, resource, action)
    }

    /// List every object on which `user` is granted `operation`.
    pub async fn review_access(&self, user: NodeId, operation: &str) -> DecisionResult<BTreeSet<NodeId>> {
        let graph = self.store.read().await;
        self.engine.review_access(&*graph, user, operation)
    }
}
