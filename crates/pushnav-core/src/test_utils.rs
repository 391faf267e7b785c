//! Shared fixtures for engine tests.
//!
//! Provides a small page layout in a [`MemoryDom`], a [`NestedLinkDom`]
//! whose filled regions grow links, and an action log for asserting which
//! actions ran.

use std::cell::RefCell;
use std::rc::Rc;

use crate::action::ActionRegistry;
use crate::config::{NavConfig, ResponseFormat};
use crate::dom::{DomAdapter, MemoryDom, NodeId};
use crate::engine::NavEngine;
use crate::history::MemoryHistory;
use crate::http::QueuedHttp;
use crate::state::NavState;

pub const ORIGIN: &str = "https://app.test";

/// Absolute URL for `path` on the test origin.
pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

/// Element handles of the fixture page.
#[allow(dead_code)]
pub struct Page {
    pub nav: NodeId,
    pub about_link: NodeId,
    pub about_label: NodeId,
    pub plain_link: NodeId,
    pub external_link: NodeId,
    pub main: NodeId,
    pub sidebar: NodeId,
}

/// A page with a nav bar of links and two fillable regions, `page` and
/// `side`.
pub fn page_dom() -> (MemoryDom, Page) {
    let mut dom = MemoryDom::new();
    let root = dom.document_root();
    let nav = dom.append(root, "nav", &[]);
    let about_link = dom.append(
        nav,
        "a",
        &[
            ("href", "/about"),
            ("class", "pushnav"),
            ("data-target", "page"),
        ],
    );
    let about_label = dom.append(about_link, "span", &[]);
    let plain_link = dom.append(nav, "a", &[("href", "/plain")]);
    let external_link = dom.append(
        nav,
        "a",
        &[("href", "https://other.test/"), ("class", "pushnav-external")],
    );
    let main = dom.append(root, "main", &[("id", "page")]);
    let sidebar = dom.append(root, "aside", &[("id", "side")]);
    (
        dom,
        Page {
            nav,
            about_link,
            about_label,
            plain_link,
            external_link,
            main,
            sidebar,
        },
    )
}

/// JSON responses with the body under `"body"`.
pub fn json_config() -> NavConfig {
    NavConfig {
        response_format: ResponseFormat::Json,
        response_body_key: Some("body".to_string()),
        ..NavConfig::default()
    }
}

pub type TestEngine = NavEngine<MemoryDom, QueuedHttp, MemoryHistory>;

/// An engine on the fixture page, located at the origin root.
pub fn engine(config: NavConfig) -> (TestEngine, Page) {
    let (dom, page) = page_dom();
    let history = MemoryHistory::new(&url("/"));
    (NavEngine::new(config, dom, QueuedHttp::new(), history), page)
}

/// `(action id, url)` pairs in invocation order.
#[derive(Clone, Default)]
pub struct ActionLog(Rc<RefCell<Vec<(String, String)>>>);

impl ActionLog {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.0.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// A registry whose actions append to the returned log.
pub fn recording_actions(ids: &[&str]) -> (ActionRegistry, ActionLog) {
    let log = ActionLog::default();
    let mut reg = ActionRegistry::new();
    for id in ids {
        let sink = Rc::clone(&log.0);
        let name = id.to_string();
        reg.register(
            id,
            Box::new(move |s: &NavState| sink.borrow_mut().push((name.clone(), s.url.clone()))),
        );
    }
    (reg, log)
}

/// A [`MemoryDom`] whose filled regions each gain one intercepted link,
/// standing in for markup that carries links of its own.
#[derive(Default)]
pub struct NestedLinkDom {
    pub inner: MemoryDom,
    /// Links created by `set_content`, in creation order.
    pub inserted: Vec<NodeId>,
}

impl DomAdapter for NestedLinkDom {
    fn document_root(&self) -> NodeId {
        self.inner.document_root()
    }

    fn find_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.inner.find_by_class(root, class)
    }

    fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.inner.find_by_id(id)
    }

    fn attach_listener(&mut self, element: NodeId, event: &str) {
        self.inner.attach_listener(element, event);
    }

    fn set_attribute(&mut self, elements: &[NodeId], name: &str, value: &str) {
        self.inner.set_attribute(elements, name, value);
    }

    fn resolve_ancestor(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.inner.resolve_ancestor(node, tag)
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<String> {
        self.inner.attribute(element, name)
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.inner.has_class(element, class)
    }

    fn set_content(&mut self, element: NodeId, markup: &str) {
        self.inner.set_content(element, markup);
        let link = self
            .inner
            .append(element, "a", &[("href", "/nested"), ("class", "pushnav")]);
        self.inserted.push(link);
    }
}
