//! URL parsing, resolution and normalization (simplified RFC 3986).
//!
//! Every URL that reaches the response cache or the pending table goes
//! through [`normalize`] first, so `/x`, `./x` and `https://origin/x#top`
//! all produce the same key.

use std::fmt;

use pushnav_types::error::{NavError, Result};

/// A parsed absolute URL in normal form.
///
/// The fragment is dropped during parsing: it never selects a different
/// response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    /// Lowercased scheme (e.g. `"https"`).
    pub scheme: String,
    /// Lowercased host.
    pub host: String,
    /// Explicit port, `None` when absent or equal to the scheme default.
    pub port: Option<u16>,
    /// Path starting with `/`, dot segments removed.
    pub path: String,
    /// Query string without the leading `?`.
    pub query: Option<String>,
}

impl Url {
    /// Parse an absolute `scheme://host[:port]/path?query#fragment` URL.
    ///
    /// Protocol-relative and relative references need a base; use
    /// [`Url::resolve`] for those.
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        let idx = url.find("://")?;
        let scheme = &url[..idx];
        if !is_scheme(scheme) {
            return None;
        }
        Self::parse_authority_and_path(scheme, &url[idx + 3..])
    }

    /// Parse `host[:port]/path?query#fragment` after the scheme has been
    /// stripped.
    fn parse_authority_and_path(scheme: &str, rest: &str) -> Option<Url> {
        let (rest, _fragment) = split_once_or(rest, '#');
        let (rest, query) = split_once_or(rest, '?');

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };

        // A bracketed IPv6 host holds colons of its own; the port colon
        // can only follow the closing bracket.
        let port_colon = match authority.rfind(']') {
            Some(end) => authority[end..].find(':').map(|i| end + i),
            None => authority.rfind(':'),
        };
        let (host, port) = match port_colon {
            Some(i) => {
                let maybe_port = &authority[i + 1..];
                if maybe_port.is_empty() {
                    (&authority[..i], None)
                } else {
                    (&authority[..i], Some(maybe_port.parse::<u16>().ok()?))
                }
            },
            None => (authority, None),
        };
        if host.is_empty() {
            return None;
        }

        let scheme = scheme.to_ascii_lowercase();
        let port = port.filter(|p| Some(*p) != default_port(&scheme));

        Some(Url {
            scheme,
            host: host.to_ascii_lowercase(),
            port,
            path: resolve_path("/", path),
            query: query.map(str::to_string),
        })
    }

    /// Resolve a reference against this URL.
    ///
    /// Handles absolute URLs, protocol-relative (`//host/path`), absolute
    /// paths (`/path`), relative paths (`path`, `../path`), query-only
    /// (`?q=x`) and fragment-only (`#frag`) references. Returns `None` for
    /// references with a non-hierarchical scheme such as `mailto:`.
    pub fn resolve(&self, relative: &str) -> Option<Url> {
        let relative = relative.trim();
        if relative.is_empty() || relative.starts_with('#') {
            return Some(self.clone());
        }

        if relative.starts_with("//") {
            return Url::parse(&format!("{}:{}", self.scheme, relative));
        }

        if scheme_prefix(relative).is_some() {
            return Url::parse(relative);
        }

        if let Some(query) = relative.strip_prefix('?') {
            let (query, _fragment) = split_once_or(query, '#');
            let mut resolved = self.clone();
            resolved.query = Some(query.to_string());
            return Some(resolved);
        }

        let (rest, _fragment) = split_once_or(relative, '#');
        let (rel_path, query) = split_once_or(rest, '?');
        let path = if rel_path.starts_with('/') {
            resolve_path("/", rel_path)
        } else {
            resolve_path(self.directory(), rel_path)
        };
        Some(Url {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
            path,
            query: query.map(str::to_string),
        })
    }

    /// Directory portion of the path (up to and including the last `/`).
    pub fn directory(&self) -> &str {
        match self.path.rfind('/') {
            Some(i) => &self.path[..=i],
            None => "/",
        }
    }

    /// The origin (`scheme://host[:port]`).
    pub fn origin(&self) -> String {
        let mut s = format!("{}://{}", self.scheme, self.host);
        if let Some(port) = self.port {
            s.push_str(&format!(":{port}"));
        }
        s
    }

    /// Whether the scheme can be fetched by the HTTP collaborator.
    pub fn is_http(&self) -> bool {
        self.scheme == "http" || self.scheme == "https"
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin(), self.path)?;
        if let Some(ref q) = self.query {
            write!(f, "?{q}")?;
        }
        Ok(())
    }
}

/// Normalize `href` against the document location `base`.
///
/// The result is the cache and pending-table key for the navigation.
/// Hrefs that are malformed, use a non-HTTP scheme, or leave the base's
/// origin fail with [`NavError::Normalization`]; the browser keeps its
/// default handling of such links.
pub fn normalize(href: &str, base: &str) -> Result<String> {
    let base_url = Url::parse(base)
        .ok_or_else(|| NavError::Normalization(format!("bad base location: {base}")))?;
    let resolved = base_url
        .resolve(href)
        .ok_or_else(|| NavError::Normalization(href.to_string()))?;
    if !resolved.is_http() {
        return Err(NavError::Normalization(format!(
            "unsupported scheme {}: {href}",
            resolved.scheme
        )));
    }
    if resolved.origin() != base_url.origin() {
        return Err(NavError::Normalization(format!("cross-origin: {href}")));
    }
    Ok(resolved.to_string())
}

// -------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Scheme of `s` when it starts with `scheme:` before any path, query or
/// fragment delimiter.
fn scheme_prefix(s: &str) -> Option<&str> {
    let end = s.find([':', '/', '?', '#'])?;
    if s.as_bytes()[end] != b':' {
        return None;
    }
    let scheme = &s[..end];
    is_scheme(scheme).then_some(scheme)
}

/// Split at the first `delim`, returning the tail without the delimiter.
fn split_once_or(s: &str, delim: char) -> (&str, Option<&str>) {
    match s.split_once(delim) {
        Some((head, tail)) => (head, Some(tail)),
        None => (s, None),
    }
}

/// Resolve a path against a base directory, handling `..` and `.`
/// segments. A trailing `/` on the input is preserved.
fn resolve_path(base_dir: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();

    for seg in relative.split('/') {
        match seg {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            s => segments.push(s),
        }
    }

    let trailing = !segments.is_empty()
        && (relative.ends_with('/') || relative.ends_with("/.") || relative.ends_with("/.."));
    let mut path = format!("/{}", segments.join("/"));
    if trailing {
        path.push('/');
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://app.test/docs/guide/intro.html";

    #[test]
    fn parse_full_url() {
        let url = Url::parse("https://app.test/page.html?x=1#top").unwrap();
        assert_eq!(url.scheme, "https");
        assert_eq!(url.host, "app.test");
        assert_eq!(url.port, None);
        assert_eq!(url.path, "/page.html");
        assert_eq!(url.query.as_deref(), Some("x=1"));
    }

    #[test]
    fn parse_lowercases_and_drops_default_port() {
        let url = Url::parse("HTTPS://App.Test:443/A").unwrap();
        assert_eq!(url.to_string(), "https://app.test/A");
    }

    #[test]
    fn parse_keeps_explicit_port() {
        let url = Url::parse("http://localhost:8080").unwrap();
        assert_eq!(url.port, Some(8080));
        assert_eq!(url.to_string(), "http://localhost:8080/");
    }

    #[test]
    fn parse_bracketed_ipv6_host() {
        let url = Url::parse("http://[::1]/a").unwrap();
        assert_eq!(url.host, "[::1]");
        assert_eq!(url.port, None);

        let url = Url::parse("http://[::1]:8080").unwrap();
        assert_eq!(url.host, "[::1]");
        assert_eq!(url.port, Some(8080));
    }

    #[test]
    fn normalize_on_ipv6_origin() {
        assert_eq!(normalize("/a", "http://[::1]/").unwrap(), "http://[::1]/a");
        assert_eq!(
            normalize("b", "http://[::1]:8080/x/").unwrap(),
            "http://[::1]:8080/x/b"
        );
    }

    #[test]
    fn parse_rejects_missing_host_and_bad_port() {
        assert!(Url::parse("https:///path").is_none());
        assert!(Url::parse("https://host:notaport/").is_none());
        assert!(Url::parse("/relative").is_none());
    }

    #[test]
    fn resolve_absolute_path() {
        let base = Url::parse(BASE).unwrap();
        assert_eq!(
            base.resolve("/about").unwrap().to_string(),
            "https://app.test/about"
        );
    }

    #[test]
    fn resolve_relative_path_with_dots() {
        let base = Url::parse(BASE).unwrap();
        assert_eq!(
            base.resolve("../api/./index.html").unwrap().to_string(),
            "https://app.test/docs/api/index.html"
        );
    }

    #[test]
    fn resolve_query_only() {
        let base = Url::parse(BASE).unwrap();
        assert_eq!(
            base.resolve("?page=2").unwrap().to_string(),
            "https://app.test/docs/guide/intro.html?page=2"
        );
    }

    #[test]
    fn resolve_protocol_relative() {
        let base = Url::parse(BASE).unwrap();
        assert_eq!(
            base.resolve("//cdn.test/x").unwrap().to_string(),
            "https://cdn.test/x"
        );
    }

    #[test]
    fn relative_and_absolute_forms_normalize_identically() {
        let a = normalize("/x", "https://app.test/").unwrap();
        let b = normalize("https://app.test/x", "https://app.test/").unwrap();
        let c = normalize("x#section", "https://app.test/").unwrap();
        let d = normalize("HTTPS://APP.TEST:443/y/../x", "https://app.test/").unwrap();
        assert_eq!(a, "https://app.test/x");
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
    }

    #[test]
    fn normalize_rejects_non_http_schemes() {
        for href in ["mailto:someone@app.test", "javascript:void(0)", "ftp://app.test/x"] {
            let err = normalize(href, "https://app.test/").unwrap_err();
            assert!(matches!(err, NavError::Normalization(_)), "{href}");
        }
    }

    #[test]
    fn normalize_rejects_cross_origin() {
        let err = normalize("https://elsewhere.test/x", "https://app.test/").unwrap_err();
        assert!(err.aborts_gesture());
    }

    #[test]
    fn normalize_rejects_malformed_base() {
        assert!(normalize("/x", "not a url").is_err());
    }

    #[test]
    fn trailing_slash_is_preserved() {
        assert_eq!(
            normalize("/blog/", "https://app.test/").unwrap(),
            "https://app.test/blog/"
        );
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn arb_path() -> impl Strategy<Value = String> {
            proptest::collection::vec("[a-z]{1,6}|\\.|\\.\\.", 0..6)
                .prop_map(|segs| format!("/{}", segs.join("/")))
        }

        proptest! {
            #[test]
            fn normalization_is_idempotent(path in arb_path()) {
                let once = normalize(&path, "https://app.test/").unwrap();
                let twice = normalize(&once, "https://app.test/").unwrap();
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn normalized_urls_carry_the_origin(path in arb_path()) {
                let url = normalize(&path, "https://app.test/base/").unwrap();
                prop_assert!(url.starts_with("https://app.test/"));
                prop_assert!(!url.contains("/./"));
                prop_assert!(!url.contains("/../"));
            }
        }
    }
}
