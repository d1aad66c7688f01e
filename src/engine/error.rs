//! Error taxonomy of a collaboration run.
//!
//! Two classes of errors exist and they never mix:
//! - **fatal** errors ([`StructuralError`], [`EnvironmentError`], wrapped in [`RunError`]) abort `run()` and reach the
//!   caller,
//! - **recoverable** errors ([`SetupError`], [`ParticipantError`]) are caught inside the run and recorded as failed
//!   assertions; they never escape `run()`.

use std::path::PathBuf;

use concord_core::messages::ONLY_LEADER_MAY_RUN_MSG;
use miette::Diagnostic;
use thiserror::Error;

/// Programmer/usage faults that make a run meaningless.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("{} (reporting to `{leader}`)", ONLY_LEADER_MAY_RUN_MSG)]
    #[diagnostic(
        code(concord::structural::not_leader),
        help("start the run from the leader, or from a participant that has not joined another run")
    )]
    NotLeader { leader: String },

    #[error("No initiators found for test {scenario}; cannot run the test.")]
    #[diagnostic(
        code(concord::structural::no_initiators),
        help("register at least one routine whose name starts with `initiate`")
    )]
    NoInitiators { scenario: String },
}

/// Failure to acquire an isolated environment.
#[derive(Debug, Error, Diagnostic)]
pub enum EnvironmentError {
    #[error("failed to provision isolated file namespace {}", path.display())]
    #[diagnostic(code(concord::environment::provision))]
    Provision {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no unused isolated namespace name found after {attempts} attempts")]
    #[diagnostic(code(concord::environment::name_exhausted))]
    NameExhausted { attempts: usize },

    #[error("the isolated environment is already held by another run")]
    #[diagnostic(code(concord::environment::in_use))]
    InUse,
}

/// Fatal errors returned by a collaboration run.
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Environment(#[from] EnvironmentError),
}

/// The leader's per-iteration setup did not succeed.
#[derive(Debug, Error)]
#[error("setup failed: {message}")]
pub struct SetupError {
    pub message: String,
    #[source]
    pub source: Option<std::io::Error>,
}

impl SetupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// An error raised by an initiator or verifier routine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParticipantError {
    pub message: String,
}

impl ParticipantError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Convert any error into a participant error, keeping its source chain in the message.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { message }
    }
}

impl From<std::io::Error> for ParticipantError {
    fn from(err: std::io::Error) -> Self {
        Self::from_error(&err)
    }
}

impl From<serde_json::Error> for ParticipantError {
    fn from(err: serde_json::Error) -> Self {
        Self::from_error(&err)
    }
}

/// Result type for fatal run errors.
pub type RunResult<T> = Result<T, RunError>;

/// Result type of initiator and verifier routines.
pub type ParticipantResult<T> = Result<T, ParticipantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_leader_message_names_leader() {
        let err = StructuralError::NotLeader {
            leader: "node".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with(ONLY_LEADER_MAY_RUN_MSG));
        assert!(msg.contains("`node`"));
    }

    #[test]
    fn test_no_initiators_message_names_scenario() {
        let err = RunError::from(StructuralError::NoInitiators {
            scenario: "NodeAccess".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "No initiators found for test NodeAccess; cannot run the test."
        );
    }

    #[test]
    fn test_participant_error_keeps_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing fixture");
        let err = SetupError::io("cannot prepare", io);
        let converted = ParticipantError::from_error(&err);
        assert_eq!(converted.message, "setup failed: cannot prepare: missing fixture");
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = RunError::from(StructuralError::NoInitiators {
            scenario: "S".to_string(),
        });
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("concord::structural::no_initiators"));
    }
}
