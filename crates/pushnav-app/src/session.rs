//! Session files: a scripted sequence of navigations replayed against the
//! in-memory document, transport and history.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use pushnav_core::url::normalize;
use pushnav_core::{
    Body, DomAdapter, LinkDescriptor, MemoryDom, MemoryHistory, NavConfig, NavEngine, Outcome,
    QueuedHttp,
};

fn default_origin() -> String {
    "http://localhost".to_string()
}

fn default_start() -> String {
    "/".to_string()
}

/// A server-side page the replay transport can answer with.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub path: String,
    pub body: String,
}

/// A fillable region of the document.
#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    pub id: String,
    #[serde(default = "default_region_tag")]
    pub tag: String,
}

fn default_region_tag() -> String {
    "div".to_string()
}

/// Parsed session file.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub config: NavConfig,
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default, rename = "page")]
    pub pages: Vec<Page>,
    #[serde(default, rename = "region")]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl Session {
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("invalid session file")
    }

    /// Absolute URL the session starts at.
    pub fn start_url(&self) -> Result<String> {
        let origin = format!("{}/", self.origin.trim_end_matches('/'));
        normalize(&self.start, &origin).with_context(|| format!("bad start path {}", self.start))
    }
}

/// One scripted user or network event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Record the page at this path as the server-rendered start page.
    Init { path: String, target: Option<String> },
    Click {
        href: String,
        target: Option<String>,
        action: Option<String>,
    },
    /// Answer the oldest outstanding request, or the one for `href`.
    Deliver(Option<String>),
    /// Fail the outstanding request for `href`.
    Fail(String),
    Back,
    Forward,
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty step");
        };
        let mut arg = || words.next().map(str::to_string);
        let step = match verb {
            "init" => Step::Init {
                path: arg().context("init: missing page path")?,
                target: arg(),
            },
            "click" => Step::Click {
                href: arg().context("click: missing href")?,
                target: arg(),
                action: arg(),
            },
            "deliver" => Step::Deliver(arg()),
            "fail" => Step::Fail(arg().context("fail: missing href")?),
            "back" => Step::Back,
            "forward" => Step::Forward,
            other => bail!("unknown step '{other}'"),
        };
        Ok(step)
    }
}

pub type ReplayEngine = NavEngine<MemoryDom, QueuedHttp, MemoryHistory>;

/// Drives an engine through a session's steps.
pub struct Replay {
    pub engine: ReplayEngine,
    /// Absolute URL → response body.
    pages: HashMap<String, String>,
}

impl Replay {
    pub fn new(session: &Session) -> Result<Self> {
        let start = session.start_url()?;

        let mut dom = MemoryDom::new();
        let root = dom.document_root();
        for region in &session.regions {
            dom.append(root, &region.tag, &[("id", region.id.as_str())]);
        }

        let mut pages = HashMap::new();
        for page in &session.pages {
            let url = normalize(&page.path, &start)
                .with_context(|| format!("bad page path {}", page.path))?;
            pages.insert(url, page.body.clone());
        }

        let engine = NavEngine::new(
            session.config.clone(),
            dom,
            QueuedHttp::new(),
            MemoryHistory::new(&start),
        );
        Ok(Self { engine, pages })
    }

    /// Run one step, returning what the engine did with it.
    pub fn step(&mut self, step: &Step) -> Result<Outcome> {
        let outcome = match step {
            Step::Init { path, target } => {
                let url = self.engine.normalize(path)?;
                let body = self
                    .pages
                    .get(&url)
                    .with_context(|| format!("no page for {url}"))?;
                self.engine
                    .init(Body::from(body.as_str()), target.as_deref(), None, false)?
            },
            Step::Click {
                href,
                target,
                action,
            } => {
                let link = LinkDescriptor {
                    href: href.clone(),
                    target: target.clone(),
                    action: action.clone(),
                    ..LinkDescriptor::default()
                };
                self.engine.click(&link)?
            },
            Step::Deliver(href) => {
                let url = match href {
                    Some(href) => {
                        let url = self.engine.normalize(href)?;
                        self.engine
                            .http_mut()
                            .take_request(&url)
                            .with_context(|| format!("no request outstanding for {url}"))?
                    },
                    None => self
                        .engine
                        .http_mut()
                        .next_request()
                        .context("no request outstanding")?,
                };
                match self.pages.get(&url) {
                    Some(body) => self.engine.fetch_resolved(&url, body),
                    None => self.engine.fetch_failed(&url, "404 not found"),
                }
            },
            Step::Fail(href) => {
                let url = self.engine.normalize(href)?;
                let url = self
                    .engine
                    .http_mut()
                    .take_request(&url)
                    .with_context(|| format!("no request outstanding for {url}"))?;
                self.engine.fetch_failed(&url, "connection reset")
            },
            Step::Back => {
                let state = self
                    .engine
                    .history_mut()
                    .back()
                    .map(|e| e.state.clone())
                    .context("history is at its start")?;
                self.engine.pop(state.as_ref())
            },
            Step::Forward => {
                let state = self
                    .engine
                    .history_mut()
                    .forward()
                    .map(|e| e.state.clone())
                    .context("history is at its end")?;
                self.engine.pop(state.as_ref())
            },
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = r#"
origin = "https://app.test"
start = "/"
steps = ["init / page", "click /about page", "deliver", "back"]

[config]
cache_capacity = 4

[[page]]
path = "/"
body = "<p>home</p>"

[[page]]
path = "/about"
body = "<p>about</p>"

[[region]]
id = "page"
tag = "main"
"#;

    #[test]
    fn parse_steps() {
        assert_eq!(
            "init / page".parse::<Step>().unwrap(),
            Step::Init {
                path: "/".to_string(),
                target: Some("page".to_string())
            }
        );
        assert_eq!(
            "click /a side fade".parse::<Step>().unwrap(),
            Step::Click {
                href: "/a".to_string(),
                target: Some("side".to_string()),
                action: Some("fade".to_string()),
            }
        );
        assert_eq!("deliver".parse::<Step>().unwrap(), Step::Deliver(None));
        assert_eq!(
            "deliver /a".parse::<Step>().unwrap(),
            Step::Deliver(Some("/a".to_string()))
        );
        assert_eq!("back".parse::<Step>().unwrap(), Step::Back);
    }

    #[test]
    fn reject_bad_steps() {
        assert!("".parse::<Step>().is_err());
        assert!("click".parse::<Step>().is_err());
        assert!("teleport /a".parse::<Step>().is_err());
    }

    #[test]
    fn parse_session() {
        let session = Session::from_toml(SESSION).unwrap();
        assert_eq!(session.pages.len(), 2);
        assert_eq!(session.regions[0].tag, "main");
        assert_eq!(session.config.cache_capacity, 4);
        assert_eq!(session.start_url().unwrap(), "https://app.test/");
    }

    #[test]
    fn defaults_when_sparse() {
        let session = Session::from_toml("").unwrap();
        assert_eq!(session.start_url().unwrap(), "http://localhost/");
        assert!(session.steps.is_empty());
        assert_eq!(session.config, NavConfig::default());
    }

    #[test]
    fn replay_session() {
        let session = Session::from_toml(SESSION).unwrap();
        let mut replay = Replay::new(&session).unwrap();
        let outcomes: Vec<Outcome> = session
            .steps
            .iter()
            .map(|s| replay.step(&s.parse().unwrap()).unwrap())
            .collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::Recorded,
                Outcome::Fetching,
                Outcome::Instated,
                Outcome::Instated
            ]
        );
        let engine = &replay.engine;
        assert_eq!(engine.dom().content_of("page"), Some("<p>home</p>"));
        assert_eq!(engine.history().len(), 2);
        assert_eq!(engine.cache().size(), 2);
    }

    #[test]
    fn unknown_page_fails_fetch() {
        let session = Session::from_toml(SESSION).unwrap();
        let mut replay = Replay::new(&session).unwrap();
        replay.step(&"click /missing page".parse().unwrap()).unwrap();
        let out = replay.step(&Step::Deliver(None)).unwrap();
        assert_eq!(out, Outcome::Discarded);
        assert_eq!(replay.engine.take_diagnostics().len(), 1);
    }

    #[test]
    fn fail_needs_an_outstanding_request() {
        let session = Session::from_toml(SESSION).unwrap();
        let mut replay = Replay::new(&session).unwrap();
        assert!(replay.step(&Step::Fail("/about".to_string())).is_err());
        assert!(replay.engine.take_diagnostics().is_empty());

        replay.step(&"click /about page".parse().unwrap()).unwrap();
        let out = replay.step(&Step::Fail("/about".to_string())).unwrap();
        assert_eq!(out, Outcome::Discarded);
        assert_eq!(replay.engine.http().outstanding(), 0);
        assert!(replay.engine.pending().is_empty());
    }

    #[test]
    fn back_at_start_is_an_error() {
        let session = Session::from_toml(SESSION).unwrap();
        let mut replay = Replay::new(&session).unwrap();
        assert!(replay.step(&Step::Back).is_err());
    }
}
