//! Policy enforcement point.
//!
//! Forwards access requests to a [`PolicyDecisionPoint`] and renders the
//! outcome for the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ngac_decision::{Decision, PolicyDecisionPoint};
use ngac_graph::{NodeId, PolicyStore};

use crate::error::EnforcementResult;

/// Outcome of an authorized request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessResponse {
    /// The decision.
    pub decision: Decision,
    /// Human-readable rendering of the decision.
    pub message: String,
}

impl AccessResponse {
    /// Build a response for `decision` on `resource`.
    pub fn new(decision: Decision, resource: NodeId) -> Self {
        Self {
            decision,
            message: render_message(decision, resource),
        }
    }

    /// Whether access was granted.
    pub fn is_granted(&self) -> bool {
        self.decision.is_granted()
    }
}

/// Render a decision as `Access granted to <resource>` or
/// `Access denied to <resource>`.
pub fn render_message(decision: Decision, resource: NodeId) -> String {
    match decision {
        Decision::Grant => format!("Access granted to {}", resource),
        Decision::Deny => format!("Access denied to {}", resource),
    }
}

/// Enforcement point trait.
#[async_trait]
pub trait EnforcementPoint: Send + Sync {
    /// Request access and receive the rendered outcome.
    ///
    /// # Arguments
    ///
    /// * `user` - The requesting user
    /// * `resource` - The target resource
    /// * `action` - The requested operation
    ///
    /// # Returns
    ///
    /// The rendered decision; a denial is `Ok`.
    async fn request_access(&self, user: NodeId, resource: NodeId, action: &str) -> EnforcementResult<String>;
}

/// Enforcement point backed by a [`PolicyDecisionPoint`].
///
/// # Example
///
/// ```rust,no_run
/// use ngac_enforcement::{EnforcementPoint, PolicyEnforcementPoint};
/// use ngac_graph::PolicyStore;
///
/// async fn example(store: PolicyStore) {
///     let pep = PolicyEnforcementPoint::from_store(store);
///     match pep.request_access(1, 4, "read").await {
///         Ok(message) => println!("{}", message),
///         Err(e) => eprintln!("{} ({})", e, e.error_code()),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PolicyEnforcementPoint {
    pdp: PolicyDecisionPoint,
}

impl PolicyEnforcementPoint {
    /// Create an enforcement point over a decision point.
    pub fn new(pdp: PolicyDecisionPoint) -> Self {
        Self { pdp }
    }

    /// Create an enforcement point over a store with the default engine.
    pub fn from_store(store: PolicyStore) -> Self {
        Self::new(PolicyDecisionPoint::new(store))
    }

    /// The decision point requests are forwarded to.
    pub fn decision_point(&self) -> &PolicyDecisionPoint {
        &self.pdp
    }

    /// Decide a request and render the outcome.
    pub async fn authorize(&self, user: NodeId, resource: NodeId, action: &str) -> EnforcementResult<AccessResponse> {
        tracing::debug!(user = user, resource = resource, action = action, "Access requested");

        let decision = match self.pdp.evaluate(user, resource, action).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(user = user, resource = resource, error = %e, "Access request could not be evaluated");
                return Err(e.into());
            }
        };

        Ok(AccessResponse::new(decision, resource))
    }
}

#[async_trait]
impl EnforcementPoint for PolicyEnforcementPoint {
    async fn request_access(&self, user: NodeId, resource: NodeId, action: &str) -> EnforcementResult<String> {
        Ok(self.authorize(user, resource, action).await?.message)
    }
}
