//! Rendering of runs for the terminal and for machines.
//!
//! Progress is streamed to stderr by [`ConsoleReporter`] while the run executes. The result log and the summary line
//! are rendered afterwards from the sink's records, as plain strings so they can be snapshot-tested.

use std::io::IsTerminal;
use std::time::Duration;

use serde::Serialize;

use crate::demos::{Demo, ModuleRoles};
use crate::engine::{AssertionStatus, InitiatorDescriptor, InitiatorOutcome, Record, RunObserver, RunSummary};

/// Continuation indent of multi-line log entries.
const INDENT: &str = "          ";

/// Whether stdout should receive ANSI colors.
pub fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    color: bool,
}

impl Palette {
    fn paint(self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn green(self, text: &str) -> String {
        self.paint("32", text)
    }

    fn red(self, text: &str) -> String {
        self.paint("31", text)
    }

    fn yellow(self, text: &str) -> String {
        self.paint("33", text)
    }

    fn bold(self, text: &str) -> String {
        self.paint("1", text)
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Streams run progress to stderr (pytest-style).
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    pub color: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose, color: false }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

impl RunObserver for ConsoleReporter {
    fn on_collaborators(&mut self, scenario: &str, modules: &[String]) {
        let palette = Palette { color: self.color };
        eprintln!("{}", palette.bold(&format!("=========== {scenario} ===========")));
        eprintln!("collaborators: {}", modules.join(", "));
    }

    fn on_initiator_start(&mut self, initiator: &InitiatorDescriptor) {
        if self.verbose {
            eprint!("{}::{} ... ", initiator.module, initiator.name);
        }
    }

    fn on_initiator_complete(&mut self, _initiator: &InitiatorDescriptor, outcome: &InitiatorOutcome) {
        let palette = Palette { color: self.color };
        if self.verbose {
            eprintln!("{}", outcome_label(outcome, palette));
        } else {
            eprint!("{}", outcome_mark(outcome, palette));
        }
    }

    fn on_run_complete(&mut self, _summary: &RunSummary) {
        if !self.verbose {
            eprintln!();
        }
    }
}

fn outcome_label(outcome: &InitiatorOutcome, palette: Palette) -> String {
    match outcome {
        InitiatorOutcome::Completed { verifier_failures: 0 } => palette.green("COMPLETED"),
        InitiatorOutcome::Completed { verifier_failures } => {
            palette.red(&format!("COMPLETED ({verifier_failures} verifier error(s))"))
        }
        InitiatorOutcome::InitiatorFailed => palette.red("INITIATOR FAILED"),
        InitiatorOutcome::SetupFailed => palette.yellow("NOT SET UP"),
    }
}

fn outcome_mark(outcome: &InitiatorOutcome, palette: Palette) -> String {
    match outcome {
        InitiatorOutcome::Completed { verifier_failures: 0 } => palette.green("."),
        InitiatorOutcome::Completed { .. } => palette.red("E"),
        InitiatorOutcome::InitiatorFailed => palette.red("F"),
        InitiatorOutcome::SetupFailed => palette.yellow("S"),
    }
}

// ============================================================================
// Result log
// ============================================================================

/// Counts of a result log by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCounts {
    pub passed: usize,
    pub failed: usize,
    pub exceptions: usize,
    pub debug: usize,
    /// Completion markers left behind by a crashed initiator.
    pub crashed: usize,
}

impl LogCounts {
    pub fn from_records(records: &[Record]) -> Self {
        let mut counts = Self::default();
        for record in records {
            if record.is_completion_marker() {
                counts.crashed += 1;
                continue;
            }
            match record.assertion.status {
                AssertionStatus::Pass => counts.passed += 1,
                AssertionStatus::Fail => counts.failed += 1,
                AssertionStatus::Exception => counts.exceptions += 1,
                AssertionStatus::Debug => counts.debug += 1,
            }
        }
        counts
    }
}

/// Render the result log. Passing and debug entries are only shown when `verbose`.
pub fn render_log(records: &[Record], verbose: bool, color: bool) -> String {
    let palette = Palette { color };
    let mut lines = Vec::new();

    for record in records {
        let assertion = &record.assertion;
        let label = if record.is_completion_marker() {
            palette.red("CRASH    ")
        } else {
            match assertion.status {
                AssertionStatus::Pass if verbose => palette.green("PASS     "),
                AssertionStatus::Debug if verbose => palette.yellow("DEBUG    "),
                AssertionStatus::Pass | AssertionStatus::Debug => continue,
                AssertionStatus::Fail => palette.red("FAIL     "),
                AssertionStatus::Exception => palette.red("EXCEPTION"),
            }
        };

        let mut message = assertion.message.lines();
        let first = message.next().unwrap_or_default();
        lines.push(format!("{label} [{}] {first}", assertion.group));
        lines.extend(message.map(|line| format!("{INDENT}{line}")));
        if let Some(caller) = &assertion.caller {
            lines.push(format!("{INDENT}at {} ({}:{})", caller.function, caller.file, caller.line));
        }
    }

    lines.join("\n")
}

/// Render the closing summary line.
pub fn render_summary(counts: &LogCounts, elapsed: Duration, color: bool) -> String {
    let palette = Palette { color };
    let mut parts = Vec::new();
    if counts.passed > 0 {
        parts.push(palette.green(&format!("{} passed", counts.passed)));
    }
    if counts.failed > 0 {
        parts.push(palette.red(&format!("{} failed", counts.failed)));
    }
    if counts.exceptions > 0 {
        parts.push(palette.red(&format!("{} exceptions", counts.exceptions)));
    }
    if counts.crashed > 0 {
        parts.push(palette.red(&format!("{} crashed", counts.crashed)));
    }
    if parts.is_empty() {
        parts.push("no assertions".to_string());
    }

    format!("====== {} in {:.2}s ======", parts.join(", "), elapsed.as_secs_f64())
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonLine<'a> {
    Record(&'a Record),
    Summary(&'a RunSummary),
}

/// Encode every record, then the summary, as one JSON object per line.
pub fn json_lines(records: &[Record], summary: &RunSummary) -> Result<Vec<String>, serde_json::Error> {
    records
        .iter()
        .map(JsonLine::Record)
        .chain(std::iter::once(JsonLine::Summary(summary)))
        .map(|line| serde_json::to_string(&line))
        .collect()
}

// ============================================================================
// Catalog
// ============================================================================

/// One scenario of `concord list`.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub leader: String,
    pub description: String,
    pub modules: Vec<ModuleRoles>,
}

impl From<&Demo> for CatalogEntry {
    fn from(demo: &Demo) -> Self {
        Self {
            name: demo.name.to_string(),
            leader: demo.leader.to_string(),
            description: demo.description.to_string(),
            modules: demo.roles(),
        }
    }
}

pub fn render_catalog(entries: &[CatalogEntry]) -> String {
    let mut lines = Vec::new();
    for entry in entries {
        lines.push(format!("{} (leader: {})", entry.name, entry.leader));
        lines.push(format!("    {}", entry.description));
        for module in &entry.modules {
            let mut roles = Vec::new();
            if !module.initiators.is_empty() {
                roles.push(format!("initiators: {}", module.initiators.join(", ")));
            }
            if module.verifier {
                roles.push("verify".to_string());
            }
            let roles = if roles.is_empty() { "-".to_string() } else { roles.join("; ") };
            let note = if module.enabled { "" } else { " (disabled)" };
            lines.push(format!("    {:<10} {roles}{note}", module.module));
        }
    }
    lines.join("\n")
}
