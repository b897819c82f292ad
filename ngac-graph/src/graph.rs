//! # Policy Graph
//!
//! The in-memory policy graph: an arena of nodes keyed by id with
//! containment indexed in both directions and associations keyed by their
//! `(source, destination)` pair.
//!
//! Mutations validate their endpoints and never overwrite conflicting data:
//! creating an existing relation is a no-op (`Ok(None)`), node updates are
//! explicit merges, and deletions cascade to every incident relation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{GraphError, GraphResult};
use crate::node::{Node, NodeId, NodePatch};
use crate::operations::OperationSet;
use crate::relations::{Assignment, Association};

/// Read interface over a policy graph.
///
/// The decision engine depends on this trait only. Lookups of unknown ids
/// return `None` or empty collections rather than failing.
pub trait GraphReader {
    /// Look up a node.
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// All nodes, in id order.
    fn nodes(&self) -> Vec<&Node>;

    /// Direct containers of `member` (one level up).
    fn containers_of(&self, member: NodeId) -> Vec<NodeId>;

    /// Direct members of `container` (one level down).
    fn members_of(&self, container: NodeId) -> Vec<NodeId>;

    /// Associations whose source is `source`.
    fn associations_from(&self, source: NodeId) -> Vec<&Association>;

    /// Associations whose destination is `destination`.
    fn associations_to(&self, destination: NodeId) -> Vec<&Association>;

    /// Every assignment in the graph.
    fn all_assignments(&self) -> Vec<Assignment>;

    /// Every association in the graph.
    fn all_associations(&self) -> Vec<&Association>;
}

/// Serializable copy of a policy graph.
///
/// This is the transport and storage form of the graph: node identities and
/// types, every assignment, and every association with its operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphSnapshot {
    /// All nodes, ordered by id.
    pub nodes: Vec<Node>,

    /// All assignments, ordered by (member, container).
    #[serde(default)]
    pub assignments: Vec<Assignment>,

    /// All associations, ordered by (source, destination).
    #[serde(default)]
    pub associations: Vec<Association>,
}

/// In-memory policy graph.
///
/// # Example
///
/// ```
/// use ngac_graph::{GraphReader, Node, OperationSet, PolicyGraph};
///
/// let mut graph = PolicyGraph::new();
/// graph.add_node(Node::user(1, "alice")).unwrap();
/// graph.add_node(Node::user_attribute(2, "developers")).unwrap();
/// graph.add_node(Node::object_attribute(3, "repo")).unwrap();
///
/// assert!(graph.create_assignment(1, 2).unwrap().is_some());
/// assert!(graph.create_assignment(1, 2).unwrap().is_none()); // duplicate
///
/// graph
///     .create_association(2, 3, OperationSet::from_strings(&["read"]))
///     .unwrap();
/// assert_eq!(graph.containers_of(1), vec![2]);
/// assert_eq!(graph.associations_from(2).len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyGraph {
    /// Node arena.
    nodes: BTreeMap<NodeId, Node>,
    /// member -> containers
    containers: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// container -> members
    members: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// (source, destination) -> association
    associations: BTreeMap<(NodeId, NodeId), Association>,
    /// destination -> sources
    grantors: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl PolicyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Insert or replace a node keyed by its id.
    ///
    /// A node that takes part in any relation keeps its type: only its name
    /// and properties may be replaced.
    ///
    /// # Returns
    ///
    /// The node previously stored under the same id, if any.
    ///
    /// # Errors
    ///
    /// `InvalidRelation` if the replacement changes the type of a node that
    /// participates in relations. The stored node is left untouched.
    pub fn add_node(&mut self, node: Node) -> GraphResult<Option<Node>> {
        let id = node.id;

        if let Some(existing) = self.nodes.get(&id) {
            if existing.node_type != node.node_type && self.has_relations(id) {
                tracing::warn!(
                    node_id = id,
                    old_type = %existing.node_type,
                    new_type = %node.node_type,
                    "Rejected type change on a node that participates in relations"
                );
                return Err(GraphError::invalid_relation(format!(
                    "node {} participates in relations; its type cannot change from {} to {}",
                    id, existing.node_type, node.node_type
                )));
            }
        }

        let previous = self.nodes.insert(id, node);
        tracing::debug!(node_id = id, replaced = previous.is_some(), "Node added");
        Ok(previous)
    }

    /// Delete a node and every relation incident to it.
    ///
    /// # Errors
    ///
    /// `NotFound` if the node does not exist.
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let node = self
            .nodes
            .remove(&id)
            .ok_or_else(|| GraphError::node_not_found(id))?;

        let mut removed_relations = 0usize;

        if let Some(containers) = self.containers.remove(&id) {
            for container in containers {
                remove_from_index(&mut self.members, container, id);
                removed_relations += 1;
            }
        }
        if let Some(members) = self.members.remove(&id) {
            for member in members {
                remove_from_index(&mut self.containers, member, id);
                removed_relations += 1;
            }
        }

        let outgoing: Vec<(NodeId, NodeId)> = self
            .associations
            .range((id, NodeId::MIN)..=(id, NodeId::MAX))
            .map(|(key, _)| *key)
            .collect();
        for (source, destination) in outgoing {
            self.associations.remove(&(source, destination));
            remove_from_index(&mut self.grantors, destination, source);
            removed_relations += 1;
        }
        if let Some(sources) = self.grantors.remove(&id) {
            for source in sources {
                if self.associations.remove(&(source, id)).is_some() {
                    removed_relations += 1;
                }
            }
        }

        tracing::debug!(node_id = id, removed_relations, "Node deleted");
        Ok(node)
    }

    /// Look up a node, failing with `NotFound` if it is absent.
    pub fn get_node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.get(&id).ok_or_else(|| GraphError::node_not_found(id))
    }

    /// Check whether a node exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Merge a patch into an existing node.
    ///
    /// # Errors
    ///
    /// `NotFound` if the node does not exist.
    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch) -> GraphResult<&Node> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| GraphError::node_not_found(id))?;
        patch.apply_to(node);
        tracing::debug!(node_id = id, "Node updated");
        Ok(&*node)
    }

    /// All policy class nodes.
    pub fn policy_classes(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.is_policy_class()).collect()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.containers.values().map(BTreeSet::len).sum()
    }

    /// Number of associations.
    pub fn association_count(&self) -> usize {
        self.associations.len()
    }

    /// Check if the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn has_relations(&self, id: NodeId) -> bool {
        self.containers.contains_key(&id)
            || self.members.contains_key(&id)
            || self.grantors.contains_key(&id)
            || self
                .associations
                .range((id, NodeId::MIN)..=(id, NodeId::MAX))
                .next()
                .is_some()
    }

    fn require_endpoints(&self, from: NodeId, to: NodeId) -> GraphResult<()> {
        match (self.nodes.contains_key(&from), self.nodes.contains_key(&to)) {
            (true, true) => Ok(()),
            (false, true) => Err(GraphError::invalid_relation(format!("node {} does not exist", from))),
            (true, false) => Err(GraphError::invalid_relation(format!("node {} does not exist", to))),
            (false, false) => Err(GraphError::invalid_relation(format!(
                "nodes {} and {} do not exist",
                from, to
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Assignments
    // ------------------------------------------------------------------

    /// Record that `member` is contained in `container`.
    ///
    /// # Returns
    ///
    /// `Some(assignment)` when created, `None` if it already existed.
    ///
    /// # Errors
    ///
    /// `InvalidRelation` if either endpoint is unknown or the assignment would
    /// be a self-loop.
    pub fn create_assignment(
        &mut self,
        member: NodeId,
        container: NodeId,
    ) -> GraphResult<Option<Assignment>> {
        self.require_endpoints(member, container)?;
        if member == container {
            return Err(GraphError::invalid_relation(format!(
                "node {} cannot be assigned to itself",
                member
            )));
        }

        if !self.containers.entry(member).or_default().insert(container) {
            return Ok(None);
        }
        self.members.entry(container).or_default().insert(member);

        tracing::debug!(member, container, "Assignment created");
        Ok(Some(Assignment::new(member, container)))
    }

    /// Remove an assignment.
    ///
    /// # Errors
    ///
    /// `NotFound` if the assignment does not exist.
    pub fn delete_assignment(&mut self, member: NodeId, container: NodeId) -> GraphResult<Assignment> {
        let existed = self
            .containers
            .get(&member)
            .map_or(false, |set| set.contains(&container));
        if !existed {
            return Err(GraphError::NotFound {
                what: format!("assignment {} -> {}", member, container),
            });
        }

        remove_from_index(&mut self.containers, member, container);
        remove_from_index(&mut self.members, container, member);

        tracing::debug!(member, container, "Assignment deleted");
        Ok(Assignment::new(member, container))
    }

    /// Check whether `member` is directly contained in `container`.
    pub fn has_assignment(&self, member: NodeId, container: NodeId) -> bool {
        self.containers
            .get(&member)
            .map_or(false, |set| set.contains(&container))
    }

    // ------------------------------------------------------------------
    // Associations
    // ------------------------------------------------------------------

    /// Grant `operations` from `source` on `destination`.
    ///
    /// # Returns
    ///
    /// `Some(association)` when created, `None` if an association with the
    /// same endpoints and an equal operation set already exists.
    ///
    /// # Errors
    ///
    /// `InvalidRelation` if either endpoint is unknown, `operations` is empty,
    /// or the pair already carries a different operation set (use
    /// [`PolicyGraph::update_association`] to replace it).
    pub fn create_association(
        &mut self,
        source: NodeId,
        destination: NodeId,
        operations: OperationSet,
    ) -> GraphResult<Option<Association>> {
        self.require_endpoints(source, destination)?;
        if operations.is_empty() {
            return Err(GraphError::invalid_relation(format!(
                "association {} -> {} has no operations",
                source, destination
            )));
        }

        if let Some(existing) = self.associations.get(&(source, destination)) {
            if existing.operations == operations {
                return Ok(None);
            }
            return Err(GraphError::invalid_relation(format!(
                "association {} -> {} already grants {}; use update_association to change it",
                source, destination, existing.operations
            )));
        }

        let association = Association::new(source, destination, operations);
        self.associations
            .insert((source, destination), association.clone());
        self.grantors.entry(destination).or_default().insert(source);

        tracing::debug!(
            source,
            destination,
            operations = %association.operations,
            "Association created"
        );
        Ok(Some(association))
    }

    /// Replace the operations of an existing association.
    ///
    /// # Errors
    ///
    /// `NotFound` if no association joins the pair, `InvalidRelation` if
    /// `operations` is empty.
    pub fn update_association(
        &mut self,
        source: NodeId,
        destination: NodeId,
        operations: OperationSet,
    ) -> GraphResult<Association> {
        if operations.is_empty() {
            return Err(GraphError::invalid_relation(format!(
                "association {} -> {} has no operations",
                source, destination
            )));
        }
        let association = self
            .associations
            .get_mut(&(source, destination))
            .ok_or_else(|| GraphError::NotFound {
                what: format!("association {} -> {}", source, destination),
            })?;
        association.operations = operations;

        tracing::debug!(
            source,
            destination,
            operations = %association.operations,
            "Association updated"
        );
        Ok(association.clone())
    }

    /// Remove an association.
    ///
    /// # Errors
    ///
    /// `NotFound` if no association joins the pair.
    pub fn delete_association(&mut self, source: NodeId, destination: NodeId) -> GraphResult<Association> {
        let association = self
            .associations
            .remove(&(source, destination))
            .ok_or_else(|| GraphError::NotFound {
                what: format!("association {} -> {}", source, destination),
            })?;
        remove_from_index(&mut self.grantors, destination, source);

        tracing::debug!(source, destination, "Association deleted");
        Ok(association)
    }

    /// Look up the association joining a pair.
    pub fn association(&self, source: NodeId, destination: NodeId) -> Option<&Association> {
        self.associations.get(&(source, destination))
    }

    // ------------------------------------------------------------------
    // Views and snapshots
    // ------------------------------------------------------------------

    /// Build the subgraph governed by one policy class.
    ///
    /// The view holds the policy class, every node whose ascent reaches it,
    /// and the assignments and associations whose endpoints both lie in that
    /// set.
    ///
    /// # Errors
    ///
    /// `NotFound` if `policy_class` is absent, `InvalidRelation` if it is not
    /// a policy class node.
    pub fn policy_class_view(&self, policy_class: NodeId) -> GraphResult<PolicyGraph> {
        let root = self.get_node(policy_class)?;
        if !root.is_policy_class() {
            return Err(GraphError::invalid_relation(format!(
                "node {} is a {}, not a policy class",
                policy_class, root.node_type
            )));
        }

        let mut included = BTreeSet::from([policy_class]);
        let mut queue = VecDeque::from([policy_class]);
        while let Some(current) = queue.pop_front() {
            for member in self.members_of(current) {
                if included.insert(member) {
                    queue.push_back(member);
                }
            }
        }

        let mut view = PolicyGraph::new();
        for id in &included {
            if let Some(node) = self.nodes.get(id) {
                view.add_node(node.clone())?;
            }
        }
        for assignment in self.all_assignments() {
            if included.contains(&assignment.member) && included.contains(&assignment.container) {
                view.create_assignment(assignment.member, assignment.container)?;
            }
        }
        for association in self.associations.values() {
            if included.contains(&association.source) && included.contains(&association.destination) {
                view.create_association(
                    association.source,
                    association.destination,
                    association.operations.clone(),
                )?;
            }
        }
        Ok(view)
    }

    /// Copy the graph into its serializable form.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().cloned().collect(),
            assignments: self.all_assignments(),
            associations: self.associations.values().cloned().collect(),
        }
    }

    /// Rebuild a graph from a snapshot.
    ///
    /// Relations are replayed through the regular mutation operations, so a
    /// snapshot referencing unknown nodes or carrying empty grants is rejected.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> GraphResult<Self> {
        let mut graph = PolicyGraph::new();
        for node in snapshot.nodes {
            graph.add_node(node)?;
        }
        for assignment in snapshot.assignments {
            graph.create_assignment(assignment.member, assignment.container)?;
        }
        for association in snapshot.associations {
            graph.create_association(association.source, association.destination, association.operations)?;
        }
        Ok(graph)
    }
}

impl GraphReader for PolicyGraph {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn nodes(&self) -> Vec<&Node> {
        self.nodes.values().collect()
    }

    fn containers_of(&self, member: NodeId) -> Vec<NodeId> {
        self.containers
            .get(&member)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn members_of(&self, container: NodeId) -> Vec<NodeId> {
        self.members
            .get(&container)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn associations_from(&self, source: NodeId) -> Vec<&Association> {
        self.associations
            .range((source, NodeId::MIN)..=(source, NodeId::MAX))
            .map(|(_, association)| association)
            .collect()
    }

    fn associations_to(&self, destination: NodeId) -> Vec<&Association> {
        self.grantors
            .get(&destination)
            .into_iter()
            .flatten()
            .filter_map(|source| self.associations.get(&(*source, destination)))
            .collect()
    }

    fn all_assignments(&self) -> Vec<Assignment> {
        self.containers
            .iter()
            .flat_map(|(member, containers)| {
                containers
                    .iter()
                    .map(move |container| Assignment::new(*member, *container))
            })
            .collect()
    }

    fn all_associations(&self) -> Vec<&Association> {
        self.associations.values().collect()
    }
}

impl TryFrom<GraphSnapshot> for PolicyGraph {
    type Error = GraphError;

    fn try_from(snapshot: GraphSnapshot) -> GraphResult<Self> {
        PolicyGraph::from_snapshot(snapshot)
    }
}

/// Remove `value` from the set stored under `key`, dropping the entry once
/// it is empty.
fn remove_from_index(index: &mut BTreeMap<NodeId, BTreeSet<NodeId>>, key: NodeId, value: NodeId) {
    if let Some(set) = index.get_mut(&key) {
        set.remove(&value);
        if set.is_empty() {
            index.remove(&key);
        }
    }
}
