//! Navigation state: the value correlating a URL with its response body,
//! target region and reinstatement action.

use std::borrow::Cow;

/// A response body held by the cache and written into target regions.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Markup to be inserted verbatim.
    Markup(String),
    /// A decoded structured value (JSON responses).
    Data(serde_json::Value),
}

impl Body {
    /// Render the body as markup for insertion into a region.
    ///
    /// String values are inserted as-is; any other structured value is
    /// inserted as its JSON text.
    pub fn as_markup(&self) -> Cow<'_, str> {
        match self {
            Body::Markup(s) => Cow::Borrowed(s),
            Body::Data(serde_json::Value::String(s)) => Cow::Borrowed(s),
            Body::Data(v) => Cow::Owned(v.to_string()),
        }
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Markup(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Markup(s)
    }
}

impl From<serde_json::Value> for Body {
    fn from(v: serde_json::Value) -> Self {
        Body::Data(v)
    }
}

/// One navigation under consideration.
#[derive(Debug, Clone, PartialEq)]
pub struct NavState {
    /// Normalized absolute URL; the key for every lookup.
    pub url: String,
    /// Id of the region that receives the body.
    pub target: Option<String>,
    /// Identifier of the reinstatement action.
    pub action: Option<String>,
    /// `None` while the fetch is outstanding.
    pub body: Option<Body>,
}

impl NavState {
    /// A body-less state for `url` with no target or action.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target: None,
            action: None,
            body: None,
        }
    }

    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    pub fn with_action(mut self, action: Option<String>) -> Self {
        self.action = action;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Whether the body has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.body.is_some()
    }
}

/// Everything the engine needs to know about an activated link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDescriptor {
    /// Raw `href` attribute, not yet normalized.
    pub href: String,
    pub target: Option<String>,
    pub action: Option<String>,
    /// The link carries the "skip history" marker.
    pub no_history: bool,
    /// The link carries the "skip cache" marker.
    pub no_cache: bool,
}

impl LinkDescriptor {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    pub fn target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    pub fn no_history(mut self) -> Self {
        self.no_history = true;
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }
}
