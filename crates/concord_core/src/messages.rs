//! Canonical user-facing messages and assertion groups recorded by the engine.
//!
//! Result consumers match on these strings (a leftover completion marker is recognised by its group), so they live
//! here instead of being repeated at each call site.

/// Group of completion-marker records.
pub const COMPLETION_GROUP: &str = "Completion check";

/// Message stored in a completion marker; visible only if the initiator never finished.
pub const INITIATOR_INCOMPLETE_MSG: &str = "The initiator did not complete due to a fatal error.";

/// Failure recorded when the leader's per-iteration setup does not succeed.
pub const NOT_SET_UP_MSG: &str = "The test cannot be executed because it has not been set up properly.";

/// Default group for assertions raised without an explicit group.
pub const DEFAULT_GROUP: &str = "Other";

/// Group of assertions converted from participant errors.
pub const EXCEPTION_GROUP: &str = "Exception";

/// Group of the setup failure assertion.
pub const SETUP_GROUP: &str = "Setup";

/// Message of the structural error raised when a non-leader is asked to run.
pub const ONLY_LEADER_MAY_RUN_MSG: &str =
    "Can only run the test if we are the leader, or a leader has yet to be designated.";
