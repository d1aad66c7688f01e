#![forbid(unsafe_code)]
//! Concord: multi-party collaboration testing.
//!
//! A collaboration scenario is exercised jointly by several participants, each contributed by a different module.
//! One participant leads the run; the others are discovered, pair their initiators and verifiers with everyone
//! else's, and report every assertion to the leader's result sink.
//!
//! This crate provides the engine ([`engine`]), a small catalog of built-in scenarios ([`demos`]) and the `concord`
//! command-line tool ([`cli`]).
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Participant code**: a panic inside an initiator or verifier is a fatal termination. The engine does not catch
//!   it; the completion marker of the interrupted initiator stays in the sink as evidence.

pub mod cli;
pub mod demos;
pub mod engine;
pub mod version;

pub use engine::{
    Capabilities, CollaboratorRegistry, Coordinator, EngineConfig, MemorySink, ModuleListing, ResultChannel, RunError,
    RunSummary,
};
