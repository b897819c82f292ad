//! # NGAC Enforcement Point
//!
//! The entry point callers use to ask for access.
//!
//! ## Overview
//!
//! The ngac-enforcement crate handles:
//! - **Request forwarding**: every request goes to a [`PolicyDecisionPoint`]
//! - **Rendering**: `Access granted to <resource>` / `Access denied to <resource>`
//! - **Error separation**: a denial is a response, a failed evaluation is an error
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ngac_enforcement::{EnforcementPoint, PolicyEnforcementPoint};
//! use ngac_graph::{Node, OperationSet, PolicyStore};
//!
//! async fn example() {
//!     let store = PolicyStore::new();
//!     store.add_node(Node::user(1, "Alice")).await.unwrap();
//!     store.add_node(Node::object(4, "SourceCode")).await.unwrap();
//!     store
//!         .create_association(1, 4, OperationSet::from_strings(&["read"]))
//!         .await
//!         .unwrap();
//!
//!     let pep = PolicyEnforcementPoint::from_store(store);
//!     let message = pep.request_access(1, 4, "read").await.unwrap();
//!     assert_eq!(message, "Access granted to 4");
//! }
//! ```
//!
//! [`PolicyDecisionPoint`]: ngac_decision::PolicyDecisionPoint

pub mod error;
pub mod point;

// Re-export main types for convenience
pub use error::{EnforcementError, EnforcementResult};
pub use point::{render_message, AccessResponse, EnforcementPoint, PolicyEnforcementPoint};
