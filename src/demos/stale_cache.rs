//! A render cache that `page` edits never invalidate.
//!
//! The `cache` leader contributes only a verifier; every initiator comes from `page`. Rendering serves the cached
//! copy when one exists, so an edit after the first render leaves a stale entry behind, which the `cache` verifier
//! reports. Disabling `page` leaves the scenario without initiators.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{DemoRun, ModuleRoles, describe};
use crate::engine::{
    Capabilities, CollaboratorRegistry, Coordinator, ModuleListing, ParticipantResult, ResultChannel, RunResult,
    RunSummary,
};

pub const SCENARIO: &str = "StaleCache";
pub const LEADER: &str = "cache";

/// A page as its author last saved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: String,
    pub body: String,
}

fn content_path(ch: &ResultChannel, page: &str) -> PathBuf {
    ch.namespace().file_dir.join("content").join(format!("{page}.txt"))
}

fn cache_path(ch: &ResultChannel, page: &str) -> PathBuf {
    ch.namespace().file_dir.join("cache").join(format!("{page}.html"))
}

fn write(path: &Path, body: &str) -> ParticipantResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)?;
    Ok(())
}

fn read_optional(path: &Path) -> ParticipantResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(body) => Ok(Some(body)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Serve `page` from the cache, filling the cache from the content on a miss.
pub fn render(ch: &ResultChannel, page: &str) -> ParticipantResult<String> {
    let cached = cache_path(ch, page);
    if let Some(body) = read_optional(&cached)? {
        return Ok(body);
    }
    let body = fs::read_to_string(content_path(ch, page))?;
    write(&cached, &body)?;
    ch.notice(format!("cached {page}"));
    Ok(body)
}

fn cache(_: &ResultChannel) -> Capabilities<Page> {
    Capabilities::new().verifier(|ch, key, page: &Page| {
        let cached = read_optional(&cache_path(ch, &page.path))?;
        ch.assert_eq(
            cached.as_deref(),
            Some(page.body.as_str()),
            format!("{key}: cached copy of {} is current", page.path),
        );
        Ok(())
    })
}

fn page(_: &ResultChannel) -> Capabilities<Page> {
    Capabilities::new()
        .initiator("initiateRender", |ch| {
            write(&content_path(ch, "front"), "Welcome")?;
            let body = render(ch, "front")?;
            Ok(Page {
                path: "front".to_string(),
                body,
            })
        })
        .initiator("initiateEdit", |ch| {
            let content = content_path(ch, "front");
            write(&content, "Welcome")?;
            render(ch, "front")?;
            write(&content, "Welcome back")?;
            Ok(Page {
                path: "front".to_string(),
                body: "Welcome back".to_string(),
            })
        })
        .verifier(|ch, key, page| {
            let stored = fs::read_to_string(content_path(ch, &page.path))?;
            ch.assert_eq(stored.as_str(), page.body.as_str(), format!("{key}: content of {} is saved", page.path));
            Ok(())
        })
}

pub fn listing() -> ModuleListing {
    ModuleListing::new()
        .enabled("cache", "modules/cache")
        .enabled("page", "modules/page")
}

pub fn registry() -> CollaboratorRegistry<Page> {
    let mut registry = CollaboratorRegistry::new(listing());
    registry.register("page", SCENARIO, page);
    registry
}

/// The `cache` leader of the scenario.
pub fn coordinator(run: DemoRun) -> Coordinator<Page> {
    Coordinator::new(SCENARIO, LEADER, run.sink, cache)
        .with_config(run.config)
        .with_registry(Rc::new(registry()))
        .with_observer(run.observer)
}

pub fn launch(run: DemoRun) -> RunResult<RunSummary> {
    coordinator(run).run()
}

pub fn roles() -> Vec<ModuleRoles> {
    describe(SCENARIO, LEADER, &cache, &registry())
}
