//! Result sink contract and the in-memory sink.
//!
//! The engine only ever *writes* results: assertions, and completion markers that are inserted before an initiator
//! runs and deleted once it returns. A marker still present after a run is the evidence that a participant died
//! mid-initiator; noticing it is the sink consumer's job, not the engine's.

use std::cell::RefCell;
use std::fmt;
use std::panic::Location;
use std::rc::Rc;

use concord_core::messages::COMPLETION_GROUP;
use serde::Serialize;
use uuid::Uuid;

/// Outcome class of a recorded assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionStatus {
    Pass,
    Fail,
    Exception,
    Debug,
}

impl AssertionStatus {
    /// Whether this status counts against the run.
    pub fn is_failure(self) -> bool {
        matches!(self, AssertionStatus::Fail | AssertionStatus::Exception)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssertionStatus::Pass => "pass",
            AssertionStatus::Fail => "fail",
            AssertionStatus::Exception => "exception",
            AssertionStatus::Debug => "debug",
        }
    }
}

impl From<bool> for AssertionStatus {
    fn from(ok: bool) -> Self {
        if ok { AssertionStatus::Pass } else { AssertionStatus::Fail }
    }
}

impl fmt::Display for AssertionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an assertion (or a marker) originates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerInfo {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl CallerInfo {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    /// Caller info for a Rust source location.
    pub fn from_location(location: &Location<'_>, function: impl Into<String>) -> Self {
        Self::new(location.file(), location.line(), function)
    }
}

/// A single recorded assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assertion {
    pub status: AssertionStatus,
    pub message: String,
    pub group: String,
    pub caller: Option<CallerInfo>,
}

/// A sentinel record inserted before an initiator executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionMarker {
    pub run_id: Uuid,
    pub scenario: String,
    pub succeeded: bool,
    pub message: String,
    pub caller: CallerInfo,
}

/// Identifier of a record in a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordId(pub u64);

/// Identifier returned for an inserted completion marker.
pub type MarkerId = RecordId;

/// Destination of every assertion and completion marker of a run.
///
/// Implementations are owned by the leader; participants reach them only through the run's
/// [`ResultChannel`](super::channel::ResultChannel).
pub trait ResultSink {
    /// Insert a completion marker and return its id.
    fn insert_completion_marker(&mut self, marker: CompletionMarker) -> MarkerId;

    /// Delete a previously inserted completion marker.
    fn delete_completion_marker(&mut self, id: MarkerId);

    /// Record one assertion.
    fn record_assertion(&mut self, assertion: Assertion);
}

/// How a record entered the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Assertion,
    CompletionMarker,
}

/// One entry of a [`MemorySink`] log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub kind: RecordKind,
    /// Set for completion markers only.
    pub run_id: Option<Uuid>,
    pub assertion: Assertion,
}

impl Record {
    /// Only records inserted through [`ResultSink::insert_completion_marker`] qualify; the group is not consulted.
    pub fn is_completion_marker(&self) -> bool {
        self.kind == RecordKind::CompletionMarker
    }
}

#[derive(Debug, Default)]
struct ResultLog {
    next_id: u64,
    records: Vec<Record>,
    markers_inserted: usize,
    markers_deleted: usize,
}

impl ResultLog {
    fn push(&mut self, kind: RecordKind, run_id: Option<Uuid>, assertion: Assertion) -> RecordId {
        self.next_id += 1;
        let id = RecordId(self.next_id);
        self.records.push(Record {
            id,
            kind,
            run_id,
            assertion,
        });
        id
    }
}

/// In-memory sink keeping records in insertion order.
///
/// Cloning yields another handle to the same log, so a caller can hand one clone to the leader and keep another to
/// inspect the results.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    log: Rc<RefCell<ResultLog>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, markers included, in insertion order.
    pub fn records(&self) -> Vec<Record> {
        self.log.borrow().records.clone()
    }

    /// Recorded assertions, excluding completion markers.
    pub fn assertions(&self) -> Vec<Assertion> {
        self.log
            .borrow()
            .records
            .iter()
            .filter(|r| !r.is_completion_marker())
            .map(|r| r.assertion.clone())
            .collect()
    }

    /// Completion markers that were never deleted.
    pub fn leftover_markers(&self) -> Vec<Record> {
        self.log
            .borrow()
            .records
            .iter()
            .filter(|r| r.is_completion_marker())
            .cloned()
            .collect()
    }

    /// Number of assertions (markers excluded) with the given status.
    pub fn count(&self, status: AssertionStatus) -> usize {
        self.log
            .borrow()
            .records
            .iter()
            .filter(|r| !r.is_completion_marker() && r.assertion.status == status)
            .count()
    }

    /// Total completion markers ever inserted.
    pub fn markers_inserted(&self) -> usize {
        self.log.borrow().markers_inserted
    }

    /// Total completion markers deleted.
    pub fn markers_deleted(&self) -> usize {
        self.log.borrow().markers_deleted
    }

    /// Whether any failure, exception or leftover marker was recorded.
    pub fn has_failures(&self) -> bool {
        self.log.borrow().records.iter().any(|r| r.assertion.status.is_failure())
    }
}

impl ResultSink for MemorySink {
    fn insert_completion_marker(&mut self, marker: CompletionMarker) -> MarkerId {
        let mut log = self.log.borrow_mut();
        log.markers_inserted += 1;
        let assertion = Assertion {
            status: AssertionStatus::from(marker.succeeded),
            message: marker.message,
            group: COMPLETION_GROUP.to_string(),
            caller: Some(marker.caller),
        };
        log.push(RecordKind::CompletionMarker, Some(marker.run_id), assertion)
    }

    fn delete_completion_marker(&mut self, id: MarkerId) {
        let mut log = self.log.borrow_mut();
        let before = log.records.len();
        log.records.retain(|r| r.id != id);
        if log.records.len() < before {
            log.markers_deleted += 1;
        } else {
            tracing::warn!(record = id.0, "completion marker already deleted");
        }
    }

    fn record_assertion(&mut self, assertion: Assertion) {
        self.log.borrow_mut().push(RecordKind::Assertion, None, assertion);
    }
}
