//! The reconciliation engine.
//!
//! Every navigation (link activation, history pop, initial page) runs
//! through [`NavEngine`]. It decides whether a cached body can be instated
//! synchronously or a fetch must be awaited, keeps the history stack in
//! step with what is displayed, and completes fetches that resolve in any
//! order.
//!
//! ```text
//!  click ──► normalize ──► cache hit? ──yes──► schedule ──► instate
//!                              │no
//!                              ▼
//!                        pending.begin ──► http.get
//!                                            ┆ (later)
//!  fetch_resolved ──► transform ──► pending.resolve ──► cache.put
//!                                                  └──► schedule ──► instate
//! ```
//!
//! Instates are applied in the order their navigations were decided, not
//! the order fetches complete: a resolved fetch waits behind any earlier
//! navigation that is still fetching. A history pop supersedes everything
//! decided before it and never waits on an unanswered fetch.

use std::collections::VecDeque;

use serde_json::Value;

use pushnav_types::error::{NavError, Result};

use crate::action::{ActionRegistry, ActionResolver};
use crate::cache::ResponseCache;
use crate::config::NavConfig;
use crate::dom::{DomAdapter, NodeId};
use crate::history::{HistoryRecord, HistoryStack, MinimalRecord};
use crate::http::HttpClient;
use crate::pending::PendingTable;
use crate::state::{Body, LinkDescriptor, NavState};
use crate::transform::{CustomTransform, ResponseTransform, extract_body};
use crate::url;

// -----------------------------------------------------------------------
// Outcome
// -----------------------------------------------------------------------

/// What an entry point did with a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The state is now displayed.
    Instated,
    /// Ready, but waiting behind an earlier navigation that is still
    /// fetching.
    Deferred,
    /// Waiting on a fetch, either newly issued or one a history pop left
    /// outstanding.
    Fetching,
    /// A fetch for the URL is already outstanding; nothing was issued.
    Suppressed,
    /// The response or navigation was dropped; see the diagnostics.
    Discarded,
    /// History and cache were written without instating (initial page).
    Recorded,
    /// A superseded fetch resolved; its body was cached but not instated.
    Cached,
}

/// Links found by [`NavEngine::bind_links`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkScan {
    /// Intercepted links that received a click listener.
    pub inbound: usize,
    /// Links marked to open in a new browsing context.
    pub outbound: usize,
}

/// Event bound on inbound links.
pub const CLICK_EVENT: &str = "click";

/// A decided navigation awaiting its turn to be instated.
#[derive(Debug)]
enum Slot {
    /// Fetch outstanding for this URL.
    Waiting(String),
    Ready { state: NavState, record: bool },
}

// -----------------------------------------------------------------------
// NavEngine
// -----------------------------------------------------------------------

/// Navigation-state reconciliation engine.
///
/// Owns the response cache, the pending table and the collaborators. One
/// instance per document; instances share nothing.
pub struct NavEngine<D, H, S> {
    config: NavConfig,
    transform: ResponseTransform,
    cache: ResponseCache,
    pending: PendingTable,
    /// Decided navigations in decision order.
    queue: VecDeque<Slot>,
    dom: D,
    http: H,
    history: S,
    actions: Box<dyn ActionResolver>,
    /// Surfaced, non-fatal errors not yet collected.
    diagnostics: Vec<NavError>,
    /// Set by the first [`NavEngine::init`].
    initialized: bool,
}

impl<D: DomAdapter, H: HttpClient, S: HistoryStack> NavEngine<D, H, S> {
    /// Create an engine with an empty cache and no registered actions.
    pub fn new(config: NavConfig, dom: D, http: H, history: S) -> Self {
        let cache = ResponseCache::new(config.cache_policy());
        let transform = ResponseTransform::from(config.response_format);
        Self {
            config,
            transform,
            cache,
            pending: PendingTable::new(),
            queue: VecDeque::new(),
            dom,
            http,
            history,
            actions: Box::new(ActionRegistry::new()),
            diagnostics: Vec::new(),
            initialized: false,
        }
    }

    /// Replace the action resolver.
    pub fn set_actions(&mut self, actions: Box<dyn ActionResolver>) {
        self.actions = actions;
    }

    /// Replace the configured response format with a custom transform.
    pub fn set_transform(&mut self, transform: CustomTransform) {
        self.transform = ResponseTransform::Custom(transform);
    }

    // ---------------------------------------------------------------
    // Entry points
    // ---------------------------------------------------------------

    /// Record the server-rendered page the application started on.
    ///
    /// Replaces the current history entry, caches `body`, and binds the
    /// document's links. The state is only instated (target filled,
    /// action run) when `invoke_now` is set.
    ///
    /// May run once per engine; later calls fail with
    /// [`NavError::History`] and change nothing.
    pub fn init(
        &mut self,
        body: Body,
        target: Option<&str>,
        action: Option<&str>,
        invoke_now: bool,
    ) -> Result<Outcome> {
        if self.initialized {
            return Err(NavError::History(
                "initial state already recorded".to_string(),
            ));
        }
        let location = self.history.location().to_string();
        let url = self.normalize(&location)?;
        self.initialized = true;
        let state = NavState::new(url.clone())
            .with_target(target.map(str::to_string))
            .with_action(action.map(str::to_string))
            .with_body(body.clone());

        if let Err(e) = self.history.replace(&HistoryRecord::encode(&state)) {
            self.report(e);
        }
        self.cache.put(url, body);

        let root = self.dom.document_root();
        self.bind_links(root);

        if invoke_now {
            self.instate(&state, false);
            Ok(Outcome::Instated)
        } else {
            Ok(Outcome::Recorded)
        }
    }

    /// Handle activation of a link.
    ///
    /// Fails with [`NavError::Normalization`] when the href is not an
    /// internal URL; the caller then lets the browser navigate normally.
    pub fn click(&mut self, link: &LinkDescriptor) -> Result<Outcome> {
        let url = self.normalize(&link.href)?;
        let state = NavState::new(url.clone())
            .with_target(link.target.clone())
            .with_action(link.action.clone());
        let record = !link.no_history;

        if let Some(body) = self.cache.get(&url) {
            log::debug!("cache hit {url}");
            let state = state.with_body(body.clone());
            return Ok(self.schedule(state, record));
        }

        log::debug!("cache miss {url}");
        Ok(self.begin_fetch(url, state, record, !link.no_cache))
    }

    /// Handle a DOM event on `node`: find the enclosing intercepted link,
    /// read its descriptor, and [`click`](Self::click) it.
    pub fn activate(&mut self, node: NodeId) -> Result<Outcome> {
        let link = self
            .dom
            .resolve_ancestor(node, "a")
            .filter(|&a| self.dom.has_class(a, &self.config.link_class))
            .and_then(|a| self.describe_link(a))
            .ok_or_else(|| {
                NavError::Normalization("activation outside an intercepted link".to_string())
            })?;
        self.click(&link)
    }

    /// Complete the fetch for `url` with the raw response text.
    pub fn fetch_resolved(&mut self, url: &str, raw: &str) -> Outcome {
        let url = self.normalize(url).unwrap_or_else(|_| url.to_string());

        let body = match self.transform.decode(raw).and_then(|decoded| {
            extract_body(decoded, self.config.response_body_key.as_deref())
        }) {
            Ok(body) => body,
            Err(e) => {
                self.report(e);
                self.abandon(&url);
                return Outcome::Discarded;
            },
        };

        let transition = match self.pending.resolve(&url, body) {
            Ok(t) => t,
            Err(e) => {
                self.report(e);
                return Outcome::Discarded;
            },
        };

        if transition.cache
            && let Some(body) = &transition.state.body
        {
            self.cache.put(url.clone(), body.clone());
        }
        if !transition.display {
            log::debug!("superseded fetch {url} resolved");
            return Outcome::Cached;
        }

        let slot = self
            .queue
            .iter()
            .position(|s| matches!(s, Slot::Waiting(u) if *u == url));
        match slot {
            Some(i) => {
                self.queue[i] = Slot::Ready {
                    state: transition.state,
                    record: transition.record_history,
                };
                self.flush();
                if i == 0 {
                    Outcome::Instated
                } else {
                    Outcome::Deferred
                }
            },
            None => self.schedule(transition.state, transition.record_history),
        }
    }

    /// Report a failed fetch for `url`.
    ///
    /// The pending entry is dropped without touching history or the
    /// cache, so a later navigation to the same URL fetches again.
    pub fn fetch_failed(&mut self, url: &str, reason: &str) -> Outcome {
        let url = self.normalize(url).unwrap_or_else(|_| url.to_string());
        self.report(NavError::Transport(format!("{url}: {reason}")));
        self.abandon(&url);
        Outcome::Discarded
    }

    /// Drop the outstanding navigation to `url`, if any.
    ///
    /// A response that arrives afterwards is reported as
    /// [`NavError::NoSuchPending`].
    pub fn cancel(&mut self, url: &str) -> bool {
        let url = self.normalize(url).unwrap_or_else(|_| url.to_string());
        self.abandon(&url)
    }

    /// Handle a history pop carrying the entry's state slot.
    ///
    /// Never fails: a missing or malformed state falls back to fetching
    /// the current location.
    ///
    /// The pop supersedes every navigation decided before it: queued ones
    /// are dropped and outstanding fetches only fill the cache, so the pop
    /// never waits on them.
    pub fn pop(&mut self, state: Option<&Value>) -> Outcome {
        let record = MinimalRecord::from_state(state);

        let superseded = self.pending.supersede() + self.queue.len();
        self.queue.clear();
        if superseded > 0 {
            log::debug!("pop superseded {superseded} navigation(s)");
        }

        if let Some(href) = record.url.as_deref() {
            match self.normalize(href) {
                Ok(url) => {
                    let nav = NavState::new(url.clone())
                        .with_target(record.target_id.clone())
                        .with_action(record.action.clone());
                    if let Some(body) = self.cache.get(&url) {
                        log::debug!("pop cache hit {url}");
                        let nav = nav.with_body(body.clone());
                        return self.schedule(nav, false);
                    }
                    if record.has_metadata() {
                        return self.begin_fetch(url, nav, false, true);
                    }
                },
                Err(e) => log::debug!("pop state unusable: {e}"),
            }
        }

        let location = self.history.location().to_string();
        match self.normalize(&location) {
            Ok(url) => {
                log::debug!("pop fallback to location {url}");
                self.begin_fetch(url.clone(), NavState::new(url), false, true)
            },
            Err(e) => {
                self.report(e);
                Outcome::Discarded
            },
        }
    }

    /// Bind the links below `root`: inbound links get a click listener,
    /// outbound links are set to open in a new browsing context.
    pub fn bind_links(&mut self, root: NodeId) -> LinkScan {
        let inbound = self.dom.find_by_class(root, &self.config.link_class);
        for &link in &inbound {
            self.dom.attach_listener(link, CLICK_EVENT);
        }
        let outbound = self.dom.find_by_class(root, &self.config.outbound_class);
        if !outbound.is_empty() {
            self.dom.set_attribute(&outbound, "target", "_blank");
        }
        LinkScan {
            inbound: inbound.len(),
            outbound: outbound.len(),
        }
    }

    /// Read the navigation metadata of a link element.
    pub fn describe_link(&self, link: NodeId) -> Option<LinkDescriptor> {
        let href = self.dom.attribute(link, "href")?;
        Some(LinkDescriptor {
            href,
            target: self.dom.attribute(link, &self.config.target_attribute),
            action: self.dom.attribute(link, &self.config.action_attribute),
            no_history: self.dom.has_class(link, &self.config.no_history_class),
            no_cache: self.dom.has_class(link, &self.config.no_cache_class),
        })
    }

    /// Normalize `href` against the current location.
    pub fn normalize(&self, href: &str) -> Result<String> {
        url::normalize(href, self.history.location())
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn http_mut(&mut self) -> &mut H {
        &mut self.http
    }

    pub fn history(&self) -> &S {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut S {
        &mut self.history
    }

    /// Navigations decided but not yet instated.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Collect the errors surfaced since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<NavError> {
        std::mem::take(&mut self.diagnostics)
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    /// Start a fetch unless one is already outstanding for `url`.
    ///
    /// A superseded fetch for `url` is taken over instead of reissued.
    fn begin_fetch(&mut self, url: String, state: NavState, record: bool, cache: bool) -> Outcome {
        if self.pending.adopt(&url, &state, record, cache) {
            log::debug!("rejoining outstanding fetch {url}");
            self.queue.push_back(Slot::Waiting(url));
            return Outcome::Fetching;
        }
        match self.pending.begin(&url, state, record, cache) {
            Ok(()) => {
                self.queue.push_back(Slot::Waiting(url.clone()));
                self.http.get(&url);
                Outcome::Fetching
            },
            Err(e) => {
                log::debug!("{e}");
                Outcome::Suppressed
            },
        }
    }

    /// Instate now if nothing decided earlier is outstanding, otherwise
    /// queue behind it.
    fn schedule(&mut self, state: NavState, record: bool) -> Outcome {
        if self.queue.is_empty() {
            self.instate(&state, record);
            Outcome::Instated
        } else {
            log::debug!("deferring {} behind {} navigation(s)", state.url, self.queue.len());
            self.queue.push_back(Slot::Ready { state, record });
            Outcome::Deferred
        }
    }

    /// Instate every ready navigation at the head of the queue.
    fn flush(&mut self) {
        while matches!(self.queue.front(), Some(Slot::Ready { .. })) {
            if let Some(Slot::Ready { state, record }) = self.queue.pop_front() {
                self.instate(&state, record);
            }
        }
    }

    /// Forget the outstanding navigation to `url`, letting later ones
    /// proceed.
    fn abandon(&mut self, url: &str) -> bool {
        let existed = self.pending.cancel(url).is_some();
        self.queue
            .retain(|s| !matches!(s, Slot::Waiting(u) if u == url));
        self.flush();
        existed
    }

    /// Make `state` the displayed state.
    fn instate(&mut self, state: &NavState, record: bool) {
        if record && let Err(e) = self.history.push(&HistoryRecord::encode(state)) {
            self.report(e);
        }

        let target = state
            .target
            .clone()
            .or_else(|| self.config.default_target.clone());
        let mut filled = None;
        if let Some(id) = target
            && let Some(element) = self.dom.find_by_id(&id)
            && let Some(body) = &state.body
        {
            self.dom.set_content(element, &body.as_markup());
            filled = Some(element);
        }

        let action = state
            .action
            .clone()
            .or_else(|| self.config.default_action.clone());
        if let Some(id) = action {
            let invoked = self.actions.resolve(&id).map(|a| a.invoke(state));
            if let Err(e) = invoked {
                self.report(e);
            }
        }

        log::info!("instated {} (record: {record})", state.url);

        // Inserted content may carry links of its own.
        if let Some(element) = filled {
            self.bind_links(element);
        }
    }

    fn report(&mut self, e: NavError) {
        log::warn!("{e}");
        self.diagnostics.push(e);
    }
}

impl<D, H, S> std::fmt::Debug for NavEngine<D, H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavEngine")
            .field("cache", &self.cache)
            .field("pending", &self.pending)
            .field("queue", &self.queue)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
