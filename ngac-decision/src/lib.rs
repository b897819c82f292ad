//! # NGAC Decision Engine
//!
//! Evaluates access requests against an NGAC policy graph.
//!
//! ## Overview
//!
//! The ngac-decision crate handles:
//! - **Evaluation**: `(user, resource, action)` to `Grant` or `Deny`
//! - **Multi-policy combination**: grants from every applicable destination
//!   are intersected, and a destination only applies to resources governed by
//!   all of its policy classes
//! - **Explanation**: which destinations applied and which were rejected
//! - **Access review**: every object a user may perform an operation on
//! - **Decision Point**: an engine bound to a shared [`PolicyStore`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ngac_decision::{Decision, PolicyDecisionPoint};
//! use ngac_graph::PolicyStore;
//!
//! async fn example(store: PolicyStore) {
//!     let pdp = PolicyDecisionPoint::new(store);
//!     match pdp.evaluate(1, 4, "read").await {
//!         Ok(Decision::Grant) => println!("granted"),
//!         Ok(Decision::Deny) => println!("denied"),
//!         Err(e) => eprintln!("evaluation failed: {}", e),
//!     }
//! }
//! ```
//!
//! ## Configuration
//!
//! | Variable | Default | Effect |
//! |----------|---------|--------|
//! | `NGAC_AUDIT_DECISIONS` | `true` | Log every decision at `info` |
//! | `NGAC_REQUIRE_POLICY_CLASS` | `false` | Reject grants on destinations outside any policy class |
//!
//! [`PolicyStore`]: ngac_graph::PolicyStore

pub mod config;
pub mod engine;
pub mod error;
pub mod point;

// Re-export main types for convenience
pub use config::{ConfigError, EngineConfig};
pub use engine::{Decision, DecisionEngine, DestinationGrant, Evaluation};
pub use error::{DecisionError, DecisionResult};
pub use point::PolicyDecisionPoint;
