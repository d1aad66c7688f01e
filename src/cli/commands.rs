//! Command implementations for the CLI.
//!
//! Each command returns `CliResult<ExitCode>`; printing happens here, exiting does not.

use std::time::Instant;

use super::report::{self, CatalogEntry, ConsoleReporter, LogCounts};
use super::{CliError, CliResult, ExitCode, RunOptions};
use crate::demos::{self, DemoRun};
use crate::engine::{MemorySink, RunObserver, SilentObserver};

/// List the built-in scenarios with the roles of their modules.
pub fn list(json: bool) -> CliResult<ExitCode> {
    let entries: Vec<CatalogEntry> = demos::catalog().iter().map(CatalogEntry::from).collect();

    if json {
        let encoded = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::failure(format!("Error encoding scenario catalog: {e}")))?;
        println!("{encoded}");
    } else {
        println!("{}", report::render_catalog(&entries));
    }
    Ok(ExitCode::SUCCESS)
}

/// Run a built-in scenario and print its result log.
///
/// ## Returns
/// - `ExitCode::SUCCESS` when no failure, exception or leftover completion marker was recorded
/// - `ExitCode::FAILURE` otherwise
///
/// A fatal run error is returned as a `CliError` with `ExitCode::FATAL`, rendered as a diagnostic.
pub fn run_scenario(options: &RunOptions) -> CliResult<ExitCode> {
    let demo = demos::find(&options.scenario).ok_or_else(|| {
        CliError::failure(format!(
            "Unknown scenario '{}'\nRun `concord list` to see the available scenarios",
            options.scenario
        ))
    })?;

    let color = report::use_color();
    let observer: Box<dyn RunObserver> = if options.json {
        Box::new(SilentObserver)
    } else {
        Box::new(ConsoleReporter::new(options.verbose).with_color(color))
    };
    let sink = MemorySink::new();

    let started = Instant::now();
    let summary = demo
        .launch(DemoRun {
            config: options.config(),
            sink: sink.clone(),
            observer,
        })
        .map_err(|e| CliError::fatal(format!("{:?}", miette::Report::new(e))))?;
    let elapsed = started.elapsed();

    let records = sink.records();
    if options.json {
        let lines = report::json_lines(&records, &summary)
            .map_err(|e| CliError::failure(format!("Error encoding result log: {e}")))?;
        for line in lines {
            println!("{line}");
        }
    } else {
        let log = report::render_log(&records, options.verbose, color);
        if !log.is_empty() {
            println!("{log}");
        }
        println!("{}", report::render_summary(&LogCounts::from_records(&records), elapsed, color));
    }

    for marker in sink.leftover_markers() {
        tracing::warn!(
            record = marker.id.0,
            message = %marker.assertion.message,
            "completion marker left behind; an initiator did not finish"
        );
    }

    if sink.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
