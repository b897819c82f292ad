//! # NGAC Information Store
//!
//! Storage for serialized policy graphs, the policy information point of an
//! NGAC deployment.
//!
//! ## Overview
//!
//! The ngac-information crate handles:
//! - **Serialized form**: JSON of [`GraphSnapshot`](ngac_graph::GraphSnapshot)
//! - **Validation**: a graph is only accepted if it rebuilds cleanly
//! - **Retrieval**: as a rebuilt [`PolicyGraph`](ngac_graph::PolicyGraph) or
//!   as the exact text that was stored
//! - **Metadata**: a `Uuid` v7 id, a UTC timestamp, a version counter and counts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ngac_graph::PolicyStore;
//! use ngac_information::{InformationStore, MemoryInformationStore};
//!
//! async fn load(info: &MemoryInformationStore, store: &PolicyStore) {
//!     let graph = info.retrieve_graph().await.unwrap();
//!     store.replace(graph).await;
//! }
//! ```

pub mod error;
pub mod store;

// Re-export main types for convenience
pub use error::{InformationError, InformationResult};
pub use store::{GraphMetadata, InformationStore, InformationStoreConfig, MemoryInformationStore};
