//! Articles kept on disk by `node`, revised by `revision`, indexed for `search`.
//!
//! Every module checks every produced article from its own angle: `node` reloads it, `revision` counts its history,
//! `search` checks the index lists it exactly when it is published. `forum` also provides the scenario but is
//! disabled in the listing, so it never joins.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{DemoRun, ModuleRoles, describe};
use crate::engine::{
    Capabilities, CollaboratorRegistry, Coordinator, ModuleListing, ParticipantResult, ResultChannel, RunResult,
    RunSummary,
};

pub const SCENARIO: &str = "ContentLifecycle";
pub const LEADER: &str = "node";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: u32,
    pub title: String,
    pub published: bool,
    pub revisions: u32,
}

impl Article {
    fn new(id: u32, title: &str, published: bool) -> Self {
        Self {
            id,
            title: title.to_string(),
            published,
            revisions: 0,
        }
    }
}

fn article_path(ch: &ResultChannel, id: u32) -> PathBuf {
    ch.namespace().file_dir.join("articles").join(format!("{id}.json"))
}

fn revisions_dir(ch: &ResultChannel, id: u32) -> PathBuf {
    ch.namespace().file_dir.join("revisions").join(id.to_string())
}

fn index_path(ch: &ResultChannel) -> PathBuf {
    ch.namespace().file_dir.join("search-index.json")
}

/// Store `article` and keep the search index in step with its published flag.
pub fn save(ch: &ResultChannel, article: &Article) -> ParticipantResult<()> {
    let path = article_path(ch, article.id);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_vec_pretty(article)?)?;

    let mut index = read_index(ch)?;
    index.retain(|id| *id != article.id);
    if article.published {
        index.push(article.id);
        index.sort_unstable();
    }
    fs::write(index_path(ch), serde_json::to_vec(&index)?)?;
    Ok(())
}

pub fn load(ch: &ResultChannel, id: u32) -> ParticipantResult<Article> {
    let bytes = fs::read(article_path(ch, id))?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn read_index(ch: &ResultChannel) -> ParticipantResult<Vec<u32>> {
    match fs::read(index_path(ch)) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn node(_: &ResultChannel) -> Capabilities<Article> {
    Capabilities::new()
        .initiator("initiateDraft", |ch| {
            let article = Article::new(1, "Draft", false);
            save(ch, &article)?;
            Ok(article)
        })
        .initiator("initiatePublished", |ch| {
            let article = Article::new(2, "Published", true);
            save(ch, &article)?;
            Ok(article)
        })
        .verifier(|ch, key, article| {
            let stored = load(ch, article.id)?;
            ch.assert_eq(&stored, article, format!("{key}: stored article matches"));
            Ok(())
        })
}

fn revision(_: &ResultChannel) -> Capabilities<Article> {
    Capabilities::new()
        .initiator("initiateRevised", |ch| {
            let mut article = Article::new(3, "Revised", true);
            let history = revisions_dir(ch, article.id);
            fs::create_dir_all(&history)?;
            for n in 1..=2 {
                article.revisions = n;
                article.title = format!("Revised ({n})");
                save(ch, &article)?;
                fs::write(history.join(format!("{n}.json")), serde_json::to_vec(&article)?)?;
            }
            ch.notice(format!("article {} revised {} times", article.id, article.revisions));
            Ok(article)
        })
        .verifier(|ch, key, article| {
            let count = match fs::read_dir(revisions_dir(ch, article.id)) {
                Ok(entries) => entries.count(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
                Err(e) => return Err(e.into()),
            };
            ch.assert_eq(count, article.revisions as usize, format!("{key}: revision history is complete"));
            Ok(())
        })
}

fn search(_: &ResultChannel) -> Capabilities<Article> {
    Capabilities::new().verifier(|ch, key, article: &Article| {
        let listed = read_index(ch)?.contains(&article.id);
        ch.assert_eq(listed, article.published, format!("{key}: search index lists published articles only"));
        Ok(())
    })
}

fn forum(_: &ResultChannel) -> Capabilities<Article> {
    Capabilities::new().initiator("initiateTopic", |ch| {
        let article = Article::new(4, "Topic", true);
        save(ch, &article)?;
        Ok(article)
    })
}

pub fn listing() -> ModuleListing {
    ModuleListing::new()
        .enabled("node", "modules/node")
        .disabled("forum", "modules/forum")
        .enabled("revision", "modules/revision")
        .enabled("search", "modules/search")
}

pub fn registry() -> CollaboratorRegistry<Article> {
    let mut registry = CollaboratorRegistry::new(listing());
    registry
        .register("revision", SCENARIO, revision)
        .register("search", SCENARIO, search)
        .register("forum", SCENARIO, forum);
    registry
}

/// The `node` leader of the scenario.
pub fn coordinator(run: DemoRun) -> Coordinator<Article> {
    Coordinator::new(SCENARIO, LEADER, run.sink, node)
        .with_config(run.config)
        .with_registry(Rc::new(registry()))
        .with_observer(run.observer)
}

pub fn launch(run: DemoRun) -> RunResult<RunSummary> {
    coordinator(run).run()
}

pub fn roles() -> Vec<ModuleRoles> {
    describe(SCENARIO, LEADER, &node, &registry())
}
