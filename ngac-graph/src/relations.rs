//! # Relations
//!
//! The two edge kinds of the policy graph. Endpoints are node ids, never
//! references, so relations stay valid however the node arena is reorganised.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::node::NodeId;
use crate::operations::OperationSet;

/// Containment edge: `member` is contained in `container`.
///
/// Users are members of user attributes, objects of object attributes, and
/// attributes of other attributes or policy classes. Following assignments
/// from member to container is an ascent through the hierarchy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Assignment {
    /// The contained node.
    pub member: NodeId,
    /// The containing node.
    pub container: NodeId,
}

impl Assignment {
    /// Create an assignment.
    pub fn new(member: NodeId, container: NodeId) -> Self {
        Self { member, container }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.member, self.container)
    }
}

/// Grant edge: members of `source` may perform `operations` on everything
/// contained in `destination`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Association {
    /// Granting attribute, conventionally a user attribute.
    pub source: NodeId,
    /// Governed attribute or object.
    pub destination: NodeId,
    /// Granted operations; never empty.
    pub operations: OperationSet,
}

impl Association {
    /// Create an association.
    pub fn new(source: NodeId, destination: NodeId, operations: OperationSet) -> Self {
        Self {
            source,
            destination,
            operations,
        }
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -{}-> {}", self.source, self.operations, self.destination)
    }
}
