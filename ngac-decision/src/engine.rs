//! # Decision Engine
//!
//! Decides whether a user may perform an action on a resource.
//!
//! An evaluation runs in four stages over a read-only view of the graph:
//!
//! 1. **Reachable associations**: ascend the containment hierarchy from the
//!    user and collect every association whose source was reached.
//! 2. **Destination operations**: group those associations by destination,
//!    unioning the operations of associations that share one.
//! 3. **Objects of interest**: for each destination, the terminal nodes
//!    (users and objects) that can reach it. Each destination keeps its own
//!    set; sets are never merged across destinations.
//! 4. **Consistency**: a destination that contains the resource only applies
//!    if every policy class it reaches is also reached by the resource. The
//!    operations of all applicable destinations are intersected, and the
//!    action is granted iff it survives the intersection.
//!
//! Every traversal keeps a visited set, so cyclic containment terminates.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use ngac_graph::{Association, GraphReader, Node, NodeId, NodeType, OperationSet};

use crate::config::EngineConfig;
use crate::error::{DecisionError, DecisionResult};

/// Outcome of an access request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The action is permitted.
    Grant,
    /// The action is not permitted.
    Deny,
}

impl Decision {
    /// Whether the decision permits the action.
    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Grant)
    }

    /// Get the lowercase name of the decision.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Grant => "grant",
            Decision::Deny => "deny",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operations a single destination grants to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationGrant {
    /// Destination of the grant.
    pub destination: NodeId,
    /// Union of operations granted on the destination.
    pub operations: OperationSet,
}

/// Full account of one evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evaluation {
    /// Requesting user.
    pub user: NodeId,
    /// Requested resource.
    pub resource: NodeId,
    /// Requested action.
    pub action: String,
    /// The decision.
    pub decision: Decision,
    /// Destinations containing the resource that passed the consistency check.
    pub applied: Vec<DestinationGrant>,
    /// Destinations containing the resource that failed the consistency check.
    pub rejected: Vec<DestinationGrant>,
    /// Intersection of the operations of every applied destination.
    pub effective_operations: OperationSet,
}

/// A destination with the objects that fall under it.
#[derive(Debug)]
struct DestinationScope {
    grant: DestinationGrant,
    objects: BTreeSet<NodeId>,
}

/// Stateless NGAC decision engine.
///
/// The engine owns no graph: every call takes a [`GraphReader`], so one engine
/// can serve any number of graphs and concurrent evaluations.
///
/// # Example
///
/// ```
/// use ngac_decision::{Decision, DecisionEngine};
/// use ngac_graph::{Node, OperationSet, PolicyGraph};
///
/// let mut graph = PolicyGraph::new();
/// graph.add_node(Node::user(1, "Alice")).unwrap();
/// graph.add_node(Node::user_attribute(2, "Developers")).unwrap();
/// graph.add_node(Node::object_attribute(3, "CodeRepo")).unwrap();
/// graph.add_node(Node::object(4, "SourceCode")).unwrap();
/// graph.add_node(Node::policy_class(5, "ProjectPC")).unwrap();
/// graph.create_assignment(1, 2).unwrap();
/// graph.create_assignment(3, 5).unwrap();
/// graph.create_assignment(4, 3).unwrap();
/// graph
///     .create_association(2, 3, OperationSet::from_strings(&["read", "write"]))
///     .unwrap();
///
/// let engine = DecisionEngine::new();
/// assert_eq!(engine.evaluate(&graph, 1, 4, "read").unwrap(), Decision::Grant);
/// assert_eq!(engine.evaluate(&graph, 1, 4, "delete").unwrap(), Decision::Deny);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decide whether `user` may perform `action` on `resource`.
    ///
    /// # Arguments
    ///
    /// * `graph` - The policy graph to evaluate against
    /// * `user` - The requesting user
    /// * `resource` - The target object (any node id)
    /// * `action` - The requested operation
    ///
    /// # Returns
    ///
    /// `Grant` or `Deny`. An unknown resource is simply denied; an unknown
    /// user is an error.
    pub fn evaluate<G>(&self, graph: &G, user: NodeId, resource: NodeId, action: &str) -> DecisionResult<Decision>
    where
        G: GraphReader + ?Sized,
    {
        self.run(graph, user, resource, action, None)
            .map(|evaluation| evaluation.decision)
    }

    /// Like [`evaluate`](Self::evaluate), but checks `cancel` between stages
    /// and between destinations, returning [`DecisionError::Cancelled`] once
    /// it is set.
    pub fn evaluate_cancellable<G>(
        &self,
        graph: &G,
        user: NodeId,
        resource: NodeId,
        action: &str,
        cancel: &AtomicBool,
    ) -> DecisionResult<Decision>
    where
        G: GraphReader + ?Sized,
    {
        self.run(graph, user, resource, action, Some(cancel))
            .map(|evaluation| evaluation.decision)
    }

    /// Evaluate a request and report which destinations decided it.
    pub fn explain<G>(&self, graph: &G, user: NodeId, resource: NodeId, action: &str) -> DecisionResult<Evaluation>
    where
        G: GraphReader + ?Sized,
    {
        self.run(graph, user, resource, action, None)
    }

    /// Every association reachable from `user` through containment,
    /// including associations sourced at the user itself.
    pub fn reachable_associations<G>(&self, graph: &G, user: NodeId) -> DecisionResult<Vec<Association>>
    where
        G: GraphReader + ?Sized,
    {
        Ok(collect_associations(graph, user)?.into_iter().cloned().collect())
    }

    /// List every object on which `user` is granted `operation`.
    ///
    /// Equivalent to evaluating `operation` against each object in the graph,
    /// but the user's reachable grants are resolved once.
    pub fn review_access<G>(&self, graph: &G, user: NodeId, operation: &str) -> DecisionResult<BTreeSet<NodeId>>
    where
        G: GraphReader + ?Sized,
    {
        let scopes = self.scopes(graph, user, None)?;
        let mut index = PolicyClassIndex::new(graph);

        let candidates: BTreeSet<NodeId> = scopes
            .iter()
            .flat_map(|scope| scope.objects.iter().copied())
            .filter(|id| graph.node(*id).map_or(false, |node| node.node_type == NodeType::Object))
            .collect();

        let granted: BTreeSet<NodeId> = candidates
            .into_iter()
            .filter(|object| {
                let (applied, _) = self.partition(&scopes, &mut index, *object);
                OperationSet::intersect_all(applied.iter().map(|grant| &grant.operations)).contains(operation)
            })
            .collect();

        if self.config.audit_decisions {
            info!(
                user = user,
                operation = operation,
                objects = granted.len(),
                "Access review"
            );
        }

        Ok(granted)
    }

    fn run<G>(
        &self,
        graph: &G,
        user: NodeId,
        resource: NodeId,
        action: &str,
        cancel: Option<&AtomicBool>,
    ) -> DecisionResult<Evaluation>
    where
        G: GraphReader + ?Sized,
    {
        let scopes = self.scopes(graph, user, cancel)?;
        check_cancelled(cancel)?;

        let mut index = PolicyClassIndex::new(graph);
        let (applied, rejected) = self.partition(&scopes, &mut index, resource);
        let effective_operations = OperationSet::intersect_all(applied.iter().map(|grant| &grant.operations));

        let decision = if effective_operations.contains(action) {
            Decision::Grant
        } else {
            Decision::Deny
        };

        debug!(
            resource = resource,
            applied = applied.len(),
            rejected = rejected.len(),
            effective = %effective_operations,
            "Consistency check complete"
        );

        if self.config.audit_decisions {
            info!(
                user = user,
                resource = resource,
                action = action,
                decision = %decision,
                "Access decision"
            );
        }

        Ok(Evaluation {
            user,
            resource,
            action: action.to_string(),
            decision,
            applied,
            rejected,
            effective_operations,
        })
    }

    /// Reachable associations, grouped by destination, with each
    /// destination's objects of interest.
    fn scopes<G>(&self, graph: &G, user: NodeId, cancel: Option<&AtomicBool>) -> DecisionResult<Vec<DestinationScope>>
    where
        G: GraphReader + ?Sized,
    {
        check_cancelled(cancel)?;
        let associations = collect_associations(graph, user)?;
        debug!(user = user, associations = associations.len(), "Collected reachable associations");

        check_cancelled(cancel)?;
        let mut destinations: BTreeMap<NodeId, OperationSet> = BTreeMap::new();
        for association in associations {
            destinations
                .entry(association.destination)
                .or_default()
                .merge(&association.operations);
        }
        debug!(destinations = destinations.len(), "Grouped operations by destination");

        let mut scopes = Vec::with_capacity(destinations.len());
        for (destination, operations) in destinations {
            check_cancelled(cancel)?;
            scopes.push(DestinationScope {
                objects: objects_under(graph, destination),
                grant: DestinationGrant { destination, operations },
            });
        }

        Ok(scopes)
    }

    /// Split the destinations containing `resource` into those consistent
    /// with it and those that are not.
    fn partition<G>(
        &self,
        scopes: &[DestinationScope],
        index: &mut PolicyClassIndex<'_, G>,
        resource: NodeId,
    ) -> (Vec<DestinationGrant>, Vec<DestinationGrant>)
    where
        G: GraphReader + ?Sized,
    {
        let mut applied = Vec::new();
        let mut rejected = Vec::new();

        for scope in scopes.iter().filter(|scope| scope.objects.contains(&resource)) {
            if index.is_consistent(scope.grant.destination, resource, self.config.require_policy_class) {
                applied.push(scope.grant.clone());
            } else {
                rejected.push(scope.grant.clone());
            }
        }

        (applied, rejected)
    }
}

fn check_cancelled(cancel: Option<&AtomicBool>) -> DecisionResult<()> {
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(DecisionError::Cancelled),
        _ => Ok(()),
    }
}

/// Breadth-first ascent from `user`, collecting every association sourced at
/// a visited node.
fn collect_associations<G>(graph: &G, user: NodeId) -> DecisionResult<Vec<&Association>>
where
    G: GraphReader + ?Sized,
{
    if graph.node(user).is_none() {
        return Err(DecisionError::UserNotFound { id: user });
    }

    let mut visited = HashSet::from([user]);
    let mut queue = VecDeque::from([user]);
    let mut associations = Vec::new();

    while let Some(current) = queue.pop_front() {
        associations.extend(graph.associations_from(current));
        for container in graph.containers_of(current) {
            if visited.insert(container) {
                queue.push_back(container);
            }
        }
    }

    Ok(associations)
}

/// Terminal nodes that reach `destination`, including the destination itself
/// when it is terminal.
fn objects_under<G>(graph: &G, destination: NodeId) -> BTreeSet<NodeId>
where
    G: GraphReader + ?Sized,
{
    let mut visited = HashSet::from([destination]);
    let mut queue = VecDeque::from([destination]);
    let mut objects = BTreeSet::new();

    while let Some(current) = queue.pop_front() {
        if graph.node(current).map_or(false, Node::is_terminal) {
            objects.insert(current);
        }
        for member in graph.members_of(current) {
            if visited.insert(member) {
                queue.push_back(member);
            }
        }
    }

    objects
}

/// Policy classes reachable from a node, memoized for one evaluation.
///
/// Every node an ascent resolves completely is memoized, not only the node
/// that was queried, so ascents that share ancestors walk them once. A node
/// inside a containment cycle is only complete once the ascent returns to the
/// first cycle member it entered; the others are resolved again on demand.
pub(crate) struct PolicyClassIndex<'g, G: GraphReader + ?Sized> {
    graph: &'g G,
    memo: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl<'g, G: GraphReader + ?Sized> PolicyClassIndex<'g, G> {
    pub(crate) fn new(graph: &'g G) -> Self {
        Self {
            graph,
            memo: HashMap::new(),
        }
    }

    /// Policy classes reachable from `node`, including `node` itself if it
    /// is one.
    pub(crate) fn policy_classes(&mut self, node: NodeId) -> &BTreeSet<NodeId> {
        if !self.memo.contains_key(&node) {
            let mut path = HashMap::new();
            self.resolve(node, &mut path);
        }
        self.memo.entry(node).or_default()
    }

    /// Whether every policy class reachable from `destination` is also
    /// reachable from `resource`.
    pub(crate) fn is_consistent(&mut self, destination: NodeId, resource: NodeId, require_policy_class: bool) -> bool {
        self.policy_classes(destination);
        self.policy_classes(resource);

        match (self.memo.get(&destination), self.memo.get(&resource)) {
            (Some(governing), Some(governed)) => {
                if require_policy_class && governing.is_empty() {
                    return false;
                }
                governing.is_subset(governed)
            }
            _ => false,
        }
    }

    /// Depth-first ascent from `node`.
    ///
    /// `path` maps the nodes of the current ascent to their depth. Returns the
    /// classes found and the shallowest path depth a cycle led back to
    /// (`usize::MAX` if none).
    fn resolve(&mut self, node: NodeId, path: &mut HashMap<NodeId, usize>) -> (BTreeSet<NodeId>, usize) {
        if let Some(classes) = self.memo.get(&node) {
            return (classes.clone(), usize::MAX);
        }
        if let Some(&depth) = path.get(&node) {
            return (BTreeSet::new(), depth);
        }

        let depth = path.len();
        path.insert(node, depth);

        let mut classes = BTreeSet::new();
        if self.graph.node(node).map_or(false, Node::is_policy_class) {
            classes.insert(node);
        }

        let mut low = usize::MAX;
        for container in self.graph.containers_of(node) {
            let (above, reached) = self.resolve(container, path);
            classes.extend(above);
            low = low.min(reached);
        }

        path.remove(&node);
        if low >= depth {
            self.memo.insert(node, classes.clone());
        }
        (classes, low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngac_graph::{Assignment, PolicyGraph};

    fn ops(names: &[&str]) -> OperationSet {
        OperationSet::from_strings(names)
    }

    fn quiet_engine() -> DecisionEngine {
        DecisionEngine::with_config(EngineConfig::default().with_audit_decisions(false))
    }

    /// Alice in Developers, granted read/write on CodeRepo which holds SourceCode.
    fn developer_graph() -> PolicyGraph {
        let mut graph = PolicyGraph::new();
        graph.add_node(Node::user(1, "Alice")).unwrap();
        graph.add_node(Node::user_attribute(2, "Developers")).unwrap();
        graph.add_node(Node::object_attribute(3, "CodeRepo")).unwrap();
        graph.add_node(Node::object(4, "SourceCode")).unwrap();
        graph.add_node(Node::policy_class(5, "ProjectPC")).unwrap();
        graph.create_assignment(1, 2).unwrap();
        graph.create_assignment(3, 5).unwrap();
        graph.create_assignment(4, 3).unwrap();
        graph.create_association(2, 3, ops(&["read", "write"])).unwrap();
        graph
    }

    /// Two policy classes, two grants, three objects.
    fn two_policy_graph() -> PolicyGraph {
        let mut graph = PolicyGraph::new();
        graph.add_node(Node::user(1, "u1")).unwrap();
        graph.add_node(Node::user_attribute(2, "ua1")).unwrap();
        graph.add_node(Node::user_attribute(3, "ua2")).unwrap();
        graph.add_node(Node::object(4, "o1")).unwrap();
        graph.add_node(Node::object(5, "o2")).unwrap();
        graph.add_node(Node::object(6, "o3")).unwrap();
        graph.add_node(Node::object_attribute(7, "oa1")).unwrap();
        graph.add_node(Node::object_attribute(8, "oa2")).unwrap();
        graph.add_node(Node::object_attribute(9, "oa3")).unwrap();
        graph.add_node(Node::object_attribute(10, "oa4")).unwrap();
        graph.add_node(Node::object_attribute(11, "oa5")).unwrap();
        graph.add_node(Node::policy_class(12, "pc1")).unwrap();
        graph.add_node(Node::policy_class(13, "pc2")).unwrap();

        for (member, container) in [
            (1, 2),
            (2, 3),
            (4, 7),
            (5, 8),
            (6, 9),
            (5, 11),
            (8, 7),
            (11, 10),
            (3, 12),
            (10, 12),
            (7, 13),
        ] {
            graph.create_assignment(member, container).unwrap();
        }
        graph.create_association(2, 7, ops(&["read"])).unwrap();
        graph.create_association(3, 10, ops(&["read"])).unwrap();
        graph
    }

    // ========================================================================
    // Decisions
    // ========================================================================

    #[test]
    fn test_single_policy_class_grant() {
        let graph = developer_graph();
        let engine = quiet_engine();

        assert_eq!(engine.evaluate(&graph, 1, 4, "read").unwrap(), Decision::Grant);
        assert_eq!(engine.evaluate(&graph, 1, 4, "write").unwrap(), Decision::Grant);
        assert_eq!(engine.evaluate(&graph, 1, 4, "delete").unwrap(), Decision::Deny);
    }

    #[test]
    fn test_no_association_denies() {
        let mut graph = PolicyGraph::new();
        graph.add_node(Node::user(1, "Bob")).unwrap();
        graph.add_node(Node::user_attribute(2, "Managers")).unwrap();
        graph.add_node(Node::object_attribute(3, "SecretDocs")).unwrap();
        graph.add_node(Node::object(4, "Document")).unwrap();
        graph.add_node(Node::policy_class(5, "SecurityPC")).unwrap();
        graph.create_assignment(1, 2).unwrap();
        graph.create_assignment(3, 5).unwrap();
        graph.create_assignment(4, 3).unwrap();

        let evaluation = quiet_engine().explain(&graph, 1, 4, "read").unwrap();
        assert_eq!(evaluation.decision, Decision::Deny);
        assert!(evaluation.applied.is_empty());
        assert!(evaluation.effective_operations.is_empty());
    }

    #[test]
    fn test_multiple_policy_classes() {
        let graph = two_policy_graph();
        let engine = quiet_engine();

        assert_eq!(engine.evaluate(&graph, 1, 4, "read").unwrap(), Decision::Grant);
        assert_eq!(engine.evaluate(&graph, 1, 5, "read").unwrap(), Decision::Grant);
        assert_eq!(engine.evaluate(&graph, 1, 6, "read").unwrap(), Decision::Deny);
    }

    #[test]
    fn test_explain_reports_applied_destinations() {
        let graph = two_policy_graph();
        let evaluation = quiet_engine().explain(&graph, 1, 5, "read").unwrap();

        let destinations: Vec<NodeId> = evaluation.applied.iter().map(|g| g.destination).collect();
        assert_eq!(destinations, vec![7, 10]);
        assert!(evaluation.rejected.is_empty());
        assert_eq!(evaluation.effective_operations, ops(&["read"]));
        assert_eq!(evaluation.action, "read");
    }

    #[test]
    fn test_unknown_user_is_error() {
        let graph = developer_graph();
        let err = quiet_engine().evaluate(&graph, 999, 4, "read").unwrap_err();
        assert_eq!(err, DecisionError::UserNotFound { id: 999 });
    }

    #[test]
    fn test_unknown_resource_is_denied() {
        let graph = developer_graph();
        assert_eq!(quiet_engine().evaluate(&graph, 1, 999, "read").unwrap(), Decision::Deny);
    }

    #[test]
    fn test_user_with_no_containers() {
        let mut graph = developer_graph();
        graph.add_node(Node::user(9, "loner")).unwrap();
        assert_eq!(quiet_engine().evaluate(&graph, 9, 4, "read").unwrap(), Decision::Deny);
    }

    #[test]
    fn test_association_sourced_at_user() {
        let mut graph = developer_graph();
        graph.add_node(Node::user(9, "direct")).unwrap();
        graph.create_association(9, 3, ops(&["read"])).unwrap();
        assert_eq!(quiet_engine().evaluate(&graph, 9, 4, "read").unwrap(), Decision::Grant);
    }

    #[test]
    fn test_association_to_terminal_object() {
        let mut graph = developer_graph();
        graph.add_node(Node::user_attribute(6, "Auditors")).unwrap();
        graph.create_assignment(1, 6).unwrap();
        graph.create_association(6, 4, ops(&["read", "audit"])).unwrap();

        let engine = quiet_engine();
        // Both CodeRepo and the object itself apply: only read survives.
        assert_eq!(engine.evaluate(&graph, 1, 4, "read").unwrap(), Decision::Grant);
        assert_eq!(engine.evaluate(&graph, 1, 4, "audit").unwrap(), Decision::Deny);
        assert_eq!(engine.evaluate(&graph, 1, 4, "write").unwrap(), Decision::Deny);
    }

    // ========================================================================
    // Combination semantics
    // ========================================================================

    #[test]
    fn test_operations_intersect_across_destinations() {
        let mut graph = developer_graph();
        graph.add_node(Node::object_attribute(6, "Restricted")).unwrap();
        graph.create_assignment(6, 5).unwrap();
        graph.create_assignment(4, 6).unwrap();
        graph.create_association(2, 6, ops(&["read"])).unwrap();

        let engine = quiet_engine();
        assert_eq!(engine.evaluate(&graph, 1, 4, "read").unwrap(), Decision::Grant);
        assert_eq!(engine.evaluate(&graph, 1, 4, "write").unwrap(), Decision::Deny);
    }

    #[test]
    fn test_operations_union_within_destination() {
        let mut graph = developer_graph();
        graph.add_node(Node::user_attribute(6, "Reviewers")).unwrap();
        graph.create_assignment(1, 6).unwrap();
        graph.create_association(6, 3, ops(&["comment"])).unwrap();

        let evaluation = quiet_engine().explain(&graph, 1, 4, "comment").unwrap();
        assert_eq!(evaluation.decision, Decision::Grant);
        assert_eq!(evaluation.applied.len(), 1);
        assert_eq!(evaluation.effective_operations, ops(&["comment", "read", "write"]));
    }

    #[test]
    fn test_unrelated_destination_does_not_restrict() {
        let mut graph = developer_graph();
        graph.add_node(Node::object_attribute(6, "Archive")).unwrap();
        graph.add_node(Node::object(7, "OldCode")).unwrap();
        graph.create_assignment(6, 5).unwrap();
        graph.create_assignment(7, 6).unwrap();
        graph.create_association(2, 6, ops(&["read"])).unwrap();

        let engine = quiet_engine();
        assert_eq!(engine.evaluate(&graph, 1, 4, "write").unwrap(), Decision::Grant);
        assert_eq!(engine.evaluate(&graph, 1, 7, "write").unwrap(), Decision::Deny);
        assert_eq!(engine.evaluate(&graph, 1, 7, "read").unwrap(), Decision::Grant);
    }

    #[test]
    fn test_policy_class_subset_rule() {
        let mut graph = PolicyGraph::new();
        graph.add_node(Node::object_attribute(1, "dest")).unwrap();
        graph.add_node(Node::object(2, "narrow")).unwrap();
        graph.add_node(Node::object(3, "wide")).unwrap();
        graph.add_node(Node::policy_class(10, "pc1")).unwrap();
        graph.add_node(Node::policy_class(11, "pc2")).unwrap();
        graph.create_assignment(1, 10).unwrap();
        graph.create_assignment(1, 11).unwrap();
        graph.create_assignment(2, 10).unwrap();
        graph.create_assignment(3, 10).unwrap();
        graph.create_assignment(3, 11).unwrap();
        graph.add_node(Node::policy_class(12, "pc3")).unwrap();
        graph.create_assignment(3, 12).unwrap();

        let mut index = PolicyClassIndex::new(&graph);
        assert_eq!(index.policy_classes(1), &BTreeSet::from([10, 11]));
        // Destination reaches pc2, resource does not.
        assert!(!index.is_consistent(1, 2, false));
        // Strict superset on the resource side is fine.
        assert!(index.is_consistent(1, 3, false));
        assert!(index.is_consistent(1, 3, true));
    }

    #[test]
    fn test_policy_class_ascent_memoizes_ancestors() {
        let graph = two_policy_graph();
        let mut index = PolicyClassIndex::new(&graph);

        assert_eq!(index.policy_classes(5), &BTreeSet::from([12, 13]));
        for ancestor in [8, 7, 11, 10, 12, 13] {
            assert!(index.memo.contains_key(&ancestor), "node {} not memoized", ancestor);
        }
        assert_eq!(index.memo[&11], BTreeSet::from([12]));
        assert_eq!(index.memo[&8], BTreeSet::from([13]));
        assert!(!index.memo.contains_key(&4));
        assert_eq!(index.policy_classes(4), &BTreeSet::from([13]));
    }

    #[test]
    fn test_policy_class_ascent_through_cycle() {
        let mut graph = PolicyGraph::new();
        graph.add_node(Node::object_attribute(1, "a")).unwrap();
        graph.add_node(Node::object_attribute(2, "b")).unwrap();
        graph.add_node(Node::object_attribute(3, "c")).unwrap();
        graph.add_node(Node::policy_class(10, "pc1")).unwrap();
        graph.add_node(Node::policy_class(11, "pc2")).unwrap();
        graph.create_assignment(1, 2).unwrap();
        graph.create_assignment(2, 3).unwrap();
        graph.create_assignment(3, 1).unwrap();
        graph.create_assignment(2, 10).unwrap();
        graph.create_assignment(3, 11).unwrap();

        let mut index = PolicyClassIndex::new(&graph);
        assert_eq!(index.policy_classes(1), &BTreeSet::from([10, 11]));
        // Cycle members past the entry point are left for a fresh ascent.
        assert!(!index.memo.contains_key(&2));
        assert_eq!(index.policy_classes(2), &BTreeSet::from([10, 11]));
        assert_eq!(index.policy_classes(3), &BTreeSet::from([10, 11]));
    }

    #[test]
    fn test_require_policy_class() {
        let mut graph = PolicyGraph::new();
        graph.add_node(Node::user(1, "u")).unwrap();
        graph.add_node(Node::user_attribute(2, "ua")).unwrap();
        graph.add_node(Node::object_attribute(3, "floating")).unwrap();
        graph.add_node(Node::object(4, "o")).unwrap();
        graph.create_assignment(1, 2).unwrap();
        graph.create_assignment(4, 3).unwrap();
        graph.create_association(2, 3, ops(&["read"])).unwrap();

        assert_eq!(quiet_engine().evaluate(&graph, 1, 4, "read").unwrap(), Decision::Grant);

        let strict = DecisionEngine::with_config(
            EngineConfig::default()
                .with_audit_decisions(false)
                .with_require_policy_class(true),
        );
        let evaluation = strict.explain(&graph, 1, 4, "read").unwrap();
        assert_eq!(evaluation.decision, Decision::Deny);
        assert_eq!(evaluation.rejected.len(), 1);
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    #[test]
    fn test_reachable_associations_grow_with_assignments() {
        let mut graph = two_policy_graph();
        graph.add_node(Node::user(20, "u2")).unwrap();
        let engine = quiet_engine();

        assert!(engine.reachable_associations(&graph, 20).unwrap().is_empty());

        graph.create_assignment(20, 3).unwrap();
        let before = engine.reachable_associations(&graph, 20).unwrap();
        assert_eq!(before.len(), 1);

        graph.create_assignment(20, 2).unwrap();
        let after = engine.reachable_associations(&graph, 20).unwrap();
        assert_eq!(after.len(), 2);
        assert!(before.iter().all(|a| after.contains(a)));
    }

    #[test]
    fn test_cyclic_containment_terminates() {
        let mut graph = developer_graph();
        graph.add_node(Node::user_attribute(6, "Loop")).unwrap();
        graph.create_assignment(2, 6).unwrap();
        graph.create_assignment(6, 2).unwrap();
        graph.add_node(Node::object_attribute(7, "Mirror")).unwrap();
        graph.create_assignment(3, 7).unwrap();
        graph.create_assignment(7, 3).unwrap();

        let engine = quiet_engine();
        assert_eq!(engine.evaluate(&graph, 1, 4, "read").unwrap(), Decision::Grant);
        assert_eq!(engine.review_access(&graph, 1, "read").unwrap(), BTreeSet::from([4]));
    }

    /// Reader that reports a container id with no node behind it.
    struct DanglingReader {
        inner: PolicyGraph,
    }

    impl GraphReader for DanglingReader {
        fn node(&self, id: NodeId) -> Option<&Node> {
            self.inner.node(id)
        }
        fn nodes(&self) -> Vec<&Node> {
            self.inner.nodes()
        }
        fn containers_of(&self, member: NodeId) -> Vec<NodeId> {
            let mut containers = self.inner.containers_of(member);
            containers.push(404);
            containers
        }
        fn members_of(&self, container: NodeId) -> Vec<NodeId> {
            self.inner.members_of(container)
        }
        fn associations_from(&self, source: NodeId) -> Vec<&Association> {
            self.inner.associations_from(source)
        }
        fn associations_to(&self, destination: NodeId) -> Vec<&Association> {
            self.inner.associations_to(destination)
        }
        fn all_assignments(&self) -> Vec<Assignment> {
            self.inner.all_assignments()
        }
        fn all_associations(&self) -> Vec<&Association> {
            self.inner.all_associations()
        }
    }

    #[test]
    fn test_dangling_ids_are_skipped() {
        let reader = DanglingReader {
            inner: developer_graph(),
        };
        assert_eq!(quiet_engine().evaluate(&reader, 1, 4, "read").unwrap(), Decision::Grant);
    }

    #[test]
    fn test_cancelled_evaluation() {
        let graph = developer_graph();
        let engine = quiet_engine();

        let cancel = AtomicBool::new(true);
        let err = engine.evaluate_cancellable(&graph, 1, 4, "read", &cancel).unwrap_err();
        assert_eq!(err, DecisionError::Cancelled);

        cancel.store(false, Ordering::Relaxed);
        assert_eq!(
            engine.evaluate_cancellable(&graph, 1, 4, "read", &cancel).unwrap(),
            Decision::Grant
        );
    }

    // ========================================================================
    // Access review
    // ========================================================================

    #[test]
    fn test_review_access() {
        let graph = two_policy_graph();
        let engine = quiet_engine();

        assert_eq!(engine.review_access(&graph, 1, "read").unwrap(), BTreeSet::from([4, 5]));
        assert!(engine.review_access(&graph, 1, "write").unwrap().is_empty());
        assert!(engine.review_access(&graph, 999, "read").is_err());
    }

    #[test]
    fn test_review_access_matches_evaluate() {
        let graph = two_policy_graph();
        let engine = quiet_engine();
        let reviewed = engine.review_access(&graph, 1, "read").unwrap();

        for object in graph.nodes().into_iter().filter(|n| n.node_type == NodeType::Object) {
            let granted = engine.evaluate(&graph, 1, object.id, "read").unwrap().is_granted();
            assert_eq!(granted, reviewed.contains(&object.id), "object {}", object.id);
        }
    }

    #[test]
    fn test_decision_display_and_serde() {
        assert_eq!(Decision::Grant.to_string(), "grant");
        assert_eq!(serde_json::to_string(&Decision::Deny).unwrap(), r#""deny""#);
        assert!(!Decision::Deny.is_granted());
    }
}
