//! # Nodes
//!
//! Policy elements of the NGAC graph. Every node has a stable numeric id,
//! a display name, a closed [`NodeType`] and an optional property bag.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a node in the policy graph.
pub type NodeId = u64;

/// The kind of policy element a node represents.
///
/// - **User**: a subject requesting access
/// - **UserAttribute**: a group of users (role, department, clearance, ...)
/// - **Object**: a protected resource
/// - **ObjectAttribute**: a group of objects
/// - **PolicyClass**: the root of an independent policy hierarchy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    /// A subject that requests access.
    User,

    /// A container of users and other user attributes.
    UserAttribute,

    /// A protected resource.
    Object,

    /// A container of objects and other object attributes.
    ObjectAttribute,

    /// Root of an independent containment hierarchy.
    PolicyClass,
}

impl NodeType {
    /// Get the wire name of the node type.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::User => "user",
            NodeType::UserAttribute => "userAttribute",
            NodeType::Object => "object",
            NodeType::ObjectAttribute => "objectAttribute",
            NodeType::PolicyClass => "policyClass",
        }
    }

    /// Parse a node type from its wire name.
    ///
    /// Accepts the camelCase wire names as well as snake_case and the
    /// usual NGAC abbreviations (`u`, `ua`, `o`, `oa`, `pc`).
    ///
    /// # Example
    ///
    /// ```
    /// use ngac_graph::NodeType;
    ///
    /// assert_eq!(NodeType::parse("userAttribute"), Some(NodeType::UserAttribute));
    /// assert_eq!(NodeType::parse("pc"), Some(NodeType::PolicyClass));
    /// assert_eq!(NodeType::parse("group"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" | "u" => Some(NodeType::User),
            "userattribute" | "user_attribute" | "ua" => Some(NodeType::UserAttribute),
            "object" | "o" => Some(NodeType::Object),
            "objectattribute" | "object_attribute" | "oa" => Some(NodeType::ObjectAttribute),
            "policyclass" | "policy_class" | "pc" => Some(NodeType::PolicyClass),
            _ => None,
        }
    }

    /// Get all node types.
    pub fn all() -> Vec<Self> {
        vec![
            NodeType::User,
            NodeType::UserAttribute,
            NodeType::Object,
            NodeType::ObjectAttribute,
            NodeType::PolicyClass,
        ]
    }

    /// Whether nodes of this type are concrete entities (users and objects)
    /// rather than containers.
    pub fn is_terminal(&self) -> bool {
        match self {
            NodeType::User | NodeType::Object => true,
            NodeType::UserAttribute | NodeType::ObjectAttribute | NodeType::PolicyClass => false,
        }
    }

    /// Whether this is the policy class type.
    pub fn is_policy_class(&self) -> bool {
        match self {
            NodeType::PolicyClass => true,
            NodeType::User
            | NodeType::UserAttribute
            | NodeType::Object
            | NodeType::ObjectAttribute => false,
        }
    }

    /// Whether this is a user or object attribute.
    pub fn is_attribute(&self) -> bool {
        match self {
            NodeType::UserAttribute | NodeType::ObjectAttribute => true,
            NodeType::User | NodeType::Object | NodeType::PolicyClass => false,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the policy graph.
///
/// Two nodes are equal when their id, name and type agree. Properties are
/// metadata and do not take part in equality or hashing.
///
/// # Example
///
/// ```
/// use ngac_graph::{Node, NodeType};
///
/// let node = Node::new(1, "Alice", NodeType::User).with_property("dept", "eng");
/// assert_eq!(node.property("dept"), Some("eng"));
/// assert_eq!(node, Node::new(1, "Alice", NodeType::User));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier.
    pub id: NodeId,

    /// Display name.
    pub name: String,

    /// Kind of policy element.
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Free-form metadata, ignored by the decision algorithm.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Node {
    /// Create a node without properties.
    pub fn new(id: NodeId, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id,
            name: name.into(),
            node_type,
            properties: BTreeMap::new(),
        }
    }

    /// Shorthand for a [`NodeType::User`] node.
    pub fn user(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeType::User)
    }

    /// Shorthand for a [`NodeType::UserAttribute`] node.
    pub fn user_attribute(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeType::UserAttribute)
    }

    /// Shorthand for a [`NodeType::Object`] node.
    pub fn object(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeType::Object)
    }

    /// Shorthand for a [`NodeType::ObjectAttribute`] node.
    pub fn object_attribute(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeType::ObjectAttribute)
    }

    /// Shorthand for a [`NodeType::PolicyClass`] node.
    pub fn policy_class(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeType::PolicyClass)
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a property value.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Check whether a property is present.
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Insert or replace a property, returning the previous value.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.properties.insert(key.into(), value.into())
    }

    /// Replace the value of an existing property.
    ///
    /// # Returns
    ///
    /// `true` if the property existed and was updated, `false` if it is absent
    /// (in which case nothing is inserted).
    pub fn update_property(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.properties.get_mut(key) {
            Some(existing) => {
                *existing = value.into();
                true
            }
            None => false,
        }
    }

    /// Remove a property, returning its value if it was present.
    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    /// Whether this node is a concrete user or object.
    pub fn is_terminal(&self) -> bool {
        self.node_type.is_terminal()
    }

    /// Whether this node is a policy class.
    pub fn is_policy_class(&self) -> bool {
        self.node_type.is_policy_class()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name && self.node_type == other.node_type
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
        self.node_type.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} ({})", self.name, self.id, self.node_type)
    }
}

/// A partial update applied by `update_node`.
///
/// Fields left at their defaults leave the node untouched. Removals are
/// applied before insertions, so a key present in both ends up set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodePatch {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Properties to insert or replace.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_properties: BTreeMap<String, String>,

    /// Property keys to remove.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_properties: Vec<String>,
}

impl NodePatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the node.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set a property.
    pub fn set_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_properties.insert(key.into(), value.into());
        self
    }

    /// Remove a property.
    pub fn remove_property(mut self, key: impl Into<String>) -> Self {
        self.remove_properties.push(key.into());
        self
    }

    /// Whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.set_properties.is_empty() && self.remove_properties.is_empty()
    }

    /// Merge this patch into a node.
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(ref name) = self.name {
            node.name = name.clone();
        }
        for key in &self.remove_properties {
            node.properties.remove(key);
        }
        for (key, value) in &self.set_properties {
            node.properties.insert(key.clone(), value.clone());
        }
    }
}
