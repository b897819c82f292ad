//! # NGAC Policy Graph
//!
//! This crate holds the policy state of a Next-Generation Access Control
//! deployment: the policy elements and the relations between them.
//!
//! ## Overview
//!
//! The ngac-graph crate handles:
//! - **Nodes**: users, user attributes, objects, object attributes and policy classes
//! - **Assignments**: containment edges (member → container)
//! - **Associations**: operation-labelled grants (source attribute → destination)
//! - **Policy Graph**: an id-keyed arena with cascading deletion
//! - **Policy Store**: a shared handle with one writer lock and many readers
//!
//! ## Architecture
//!
//! ```text
//! user ──▶ userAttribute ──▶ policyClass
//!               │                 ▲
//!               │ {read, write}   │
//!               ▼                 │
//! object ──▶ objectAttribute ─────┘
//!
//! ──▶ assignment (member → container)
//! │▼  association (grant)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use ngac_graph::{GraphReader, Node, OperationSet, PolicyGraph};
//!
//! let mut graph = PolicyGraph::new();
//! graph.add_node(Node::user(1, "Alice")).unwrap();
//! graph.add_node(Node::user_attribute(2, "Developers")).unwrap();
//! graph.add_node(Node::object_attribute(3, "CodeRepo")).unwrap();
//! graph.add_node(Node::object(4, "SourceCode")).unwrap();
//! graph.add_node(Node::policy_class(5, "ProjectPC")).unwrap();
//!
//! graph.create_assignment(1, 2).unwrap();
//! graph.create_assignment(3, 5).unwrap();
//! graph.create_assignment(4, 3).unwrap();
//! graph
//!     .create_association(2, 3, OperationSet::from_strings(&["read", "write"]))
//!     .unwrap();
//!
//! assert_eq!(graph.members_of(3), vec![4]);
//! assert_eq!(graph.associations_to(3).len(), 1);
//! ```

pub mod error;
pub mod graph;
pub mod node;
pub mod operations;
pub mod relations;
pub mod store;

// Re-export main types for convenience
pub use error::{GraphError, GraphResult};
pub use graph::{GraphReader, GraphSnapshot, PolicyGraph};
pub use node::{Node, NodeId, NodePatch, NodeType};
pub use operations::OperationSet;
pub use relations::{Assignment, Association};
pub use store::PolicyStore;
