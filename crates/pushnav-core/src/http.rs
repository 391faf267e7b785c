//! HTTP collaborator seam.
//!
//! Fetches are fire-and-forget from the engine's point of view. The
//! transport reports back by calling
//! [`NavEngine::fetch_resolved`](crate::engine::NavEngine::fetch_resolved)
//! or [`NavEngine::fetch_failed`](crate::engine::NavEngine::fetch_failed)
//! with the same URL, at any later time and in any order.

use std::collections::VecDeque;

/// Issues GET requests on behalf of the engine.
pub trait HttpClient {
    /// Start fetching `url`. Must not call back into the engine
    /// synchronously.
    fn get(&mut self, url: &str);
}

/// A transport that only queues requests.
///
/// A driver loop drains the queue, performs or simulates the fetch, and
/// feeds the result back to the engine.
#[derive(Debug, Default)]
pub struct QueuedHttp {
    queue: VecDeque<String>,
    issued: usize,
}

impl QueuedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest outstanding request.
    pub fn next_request(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Take the outstanding request for `url`, wherever it sits in the
    /// queue. Lets a driver resolve fetches out of order.
    pub fn take_request(&mut self, url: &str) -> Option<String> {
        let pos = self.queue.iter().position(|u| u == url)?;
        self.queue.remove(pos)
    }

    /// Outstanding requests, oldest first.
    pub fn requests(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    pub fn outstanding(&self) -> usize {
        self.queue.len()
    }

    /// Requests issued over the client's lifetime.
    pub fn issued(&self) -> usize {
        self.issued
    }
}

impl HttpClient for QueuedHttp {
    fn get(&mut self, url: &str) {
        log::debug!("GET {url}");
        self.issued += 1;
        self.queue.push_back(url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_queue_in_order() {
        let mut http = QueuedHttp::new();
        http.get("https://app.test/a");
        http.get("https://app.test/b");
        assert_eq!(http.outstanding(), 2);
        assert_eq!(http.next_request().as_deref(), Some("https://app.test/a"));
        assert_eq!(http.next_request().as_deref(), Some("https://app.test/b"));
        assert!(http.next_request().is_none());
        assert_eq!(http.issued(), 2);
    }

    #[test]
    fn take_request_out_of_order() {
        let mut http = QueuedHttp::new();
        http.get("https://app.test/a");
        http.get("https://app.test/b");
        assert_eq!(
            http.take_request("https://app.test/b").as_deref(),
            Some("https://app.test/b")
        );
        assert!(http.take_request("https://app.test/b").is_none());
        assert_eq!(http.requests().collect::<Vec<_>>(), vec!["https://app.test/a"]);
    }
}
