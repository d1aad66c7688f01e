//! Multi-party collaboration test engine.
//!
//! Several participants ("collaborators"), each contributed by a different module, jointly exercise one scenario.
//! Each participant may expose initiators, which produce a state, and a verifier, which checks a state. A run pairs
//! every initiator of every participant with every participant's verifier, inside an isolated environment, and
//! funnels every assertion into the leader's [`ResultSink`].
//!
//! ## Layout
//! - [`coordinator`]: the leader and its run loop
//! - [`registry`] / [`dispatch`]: collaborator discovery and role classification
//! - [`channel`] / [`sink`]: assertion routing and recording
//! - [`isolation`] / [`fixture`]: the environment a run executes in
//! - [`reporting`]: scoped panic reporting while a run is active

pub mod channel;
pub mod collaborator;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod fixture;
pub mod hooks;
pub mod isolation;
pub mod observer;
pub mod registry;
pub mod reporting;
pub mod sink;
pub mod summary;

pub use channel::{ResultChannel, SharedSink};
pub use collaborator::{Capabilities, Collaborator, Seat};
pub use config::EngineConfig;
pub use coordinator::{Coordinator, Leadership};
pub use dispatch::{InitiatorDescriptor, PairingPlan, VerifierDescriptor};
pub use error::{
    EnvironmentError, ParticipantError, ParticipantResult, RunError, RunResult, SetupError, StructuralError,
};
pub use fixture::{CleanSlate, Fixture};
pub use hooks::{ExtensionPoints, NoExtensions};
pub use isolation::{ActiveNamespace, EnvironmentContext, EnvironmentIsolator, FsProvisioner, Namespace, Provisioner};
pub use observer::{RunObserver, SilentObserver};
pub use registry::{CollaboratorRegistry, ModuleEntry, ModuleListing};
pub use sink::{Assertion, AssertionStatus, CallerInfo, MemorySink, Record, RecordKind, ResultSink};
pub use summary::{InitiatorOutcome, InitiatorReport, RunSummary};
