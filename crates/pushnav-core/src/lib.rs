//! Navigation-state reconciliation for single-page applications.
//!
//! Intercepted link activations are turned into [`NavState`]s, served from
//! a bounded [`ResponseCache`] or fetched through an [`HttpClient`], written
//! into a target region of the document via a [`DomAdapter`], and recorded
//! on a [`HistoryStack`] so the back and forward buttons replay them. The
//! [`NavEngine`] ties these together; the in-memory implementations
//! ([`MemoryDom`], [`QueuedHttp`], [`MemoryHistory`]) drive it headless.

pub mod action;
pub mod cache;
pub mod config;
pub mod dom;
pub mod engine;
pub mod history;
pub mod http;
pub mod pending;
pub mod state;
pub mod transform;
pub mod url;

#[cfg(test)]
pub(crate) mod test_utils;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use action::{ActionRegistry, ActionResolver, NavAction};
pub use cache::{CachePolicy, ResponseCache};
pub use config::{NavConfig, ResponseFormat};
pub use dom::{DomAdapter, MemoryDom, NodeId};
pub use engine::{LinkScan, NavEngine, Outcome};
pub use history::{HistoryEntry, HistoryRecord, HistoryStack, MemoryHistory, MinimalRecord};
pub use http::{HttpClient, QueuedHttp};
pub use pending::{PendingTable, PendingTransition};
pub use pushnav_types::error;
pub use state::{Body, LinkDescriptor, NavState};
pub use transform::CustomTransform;
