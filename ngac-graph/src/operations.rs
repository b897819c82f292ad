//! # Operations
//!
//! Sets of operation names carried by associations. Operations are opaque
//! strings such as `read` or `write`; the set is ordered so that two sets
//! holding the same names compare equal regardless of insertion order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A set of operation names granted by an association.
///
/// # Example
///
/// ```
/// use ngac_graph::OperationSet;
///
/// let mut set = OperationSet::new();
/// set.add("read");
/// set.add("write");
///
/// assert!(set.contains("read"));
/// assert_eq!(set, OperationSet::from_strings(&["write", "read"]));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OperationSet {
    operations: BTreeSet<String>,
}

impl OperationSet {
    /// Create a new empty operation set.
    pub fn new() -> Self {
        Self {
            operations: BTreeSet::new(),
        }
    }

    /// Create from a list of operation names.
    pub fn from_strings(operations: &[&str]) -> Self {
        operations.iter().map(|op| op.to_string()).collect()
    }

    /// Add an operation.
    ///
    /// # Returns
    ///
    /// `true` if the operation was not already present
    pub fn add(&mut self, operation: impl Into<String>) -> bool {
        self.operations.insert(operation.into())
    }

    /// Remove an operation.
    ///
    /// # Returns
    ///
    /// `true` if the operation was present
    pub fn remove(&mut self, operation: &str) -> bool {
        self.operations.remove(operation)
    }

    /// Check if the set contains an operation.
    pub fn contains(&self, operation: &str) -> bool {
        self.operations.contains(operation)
    }

    /// Merge another set into this one (union).
    pub fn merge(&mut self, other: &OperationSet) {
        for op in &other.operations {
            self.operations.insert(op.clone());
        }
    }

    /// Operations present in both sets.
    pub fn intersection(&self, other: &OperationSet) -> OperationSet {
        Self {
            operations: self.operations.intersection(&other.operations).cloned().collect(),
        }
    }

    /// Intersect every set in `sets`.
    ///
    /// An empty input yields an empty set: with no applicable grant there is
    /// nothing to agree on.
    ///
    /// # Example
    ///
    /// ```
    /// use ngac_graph::OperationSet;
    ///
    /// let sets = vec![
    ///     OperationSet::from_strings(&["read", "write"]),
    ///     OperationSet::from_strings(&["read", "execute"]),
    /// ];
    /// assert_eq!(OperationSet::intersect_all(&sets), OperationSet::from_strings(&["read"]));
    /// let none: Vec<OperationSet> = Vec::new();
    /// assert!(OperationSet::intersect_all(&none).is_empty());
    /// ```
    pub fn intersect_all<'a, I>(sets: I) -> OperationSet
    where
        I: IntoIterator<Item = &'a OperationSet>,
    {
        let mut iter = sets.into_iter();
        let mut result = match iter.next() {
            Some(first) => first.clone(),
            None => return OperationSet::new(),
        };
        for set in iter {
            result = result.intersection(set);
            if result.is_empty() {
                break;
            }
        }
        result
    }

    /// Check if this set contains every operation of another set.
    pub fn contains_all(&self, other: &OperationSet) -> bool {
        other.operations.is_subset(&self.operations)
    }

    /// Iterate over the operations in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(String::as_str)
    }

    /// Get the count of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for OperationSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = OperationSet::new();
        for op in iter {
            set.add(op);
        }
        set
    }
}

impl fmt::Display for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, op) in self.operations.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", op)?;
        }
        write!(f, "}}")
    }
}
