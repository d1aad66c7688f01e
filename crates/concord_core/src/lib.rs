//! Provide the canonical naming rules and vocabulary shared by the Concord collaboration engine.
//!
//! This crate is intentionally small and dependency-free. It holds the deterministic rules that both the engine and
//! anything reporting on its results must agree on:
//! - which routine names qualify as initiators or verifiers, and how permutation keys are derived,
//! - how a collaborator implementation is identified for discovery,
//! - how isolated namespaces are named,
//! - the user-facing messages and assertion groups recorded by the engine.
//!
//! ## Notes
//!
//! - This is a “vocabulary” crate: **no IO**, no global state, and no engine types.

pub mod messages;
pub mod naming;
pub mod roles;

pub use roles::{INITIATOR_PREFIX, VERIFIER_NAME, is_verifier_name, permutation_key};
