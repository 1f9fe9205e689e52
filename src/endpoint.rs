//! Endpoint parser: turns `path?query` into an endpoint descriptor.
//!
//! Special patterns are tried in a fixed order before the registry scan, so
//! `posts/by-slug/x` is never read as resource `posts` with id `by-slug/x`.

use crate::config::{normalize_route, ResourceRegistry};
use axum::http::Method;
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Verb::Get),
            Method::POST => Some(Verb::Post),
            Method::PUT => Some(Verb::Put),
            Method::PATCH => Some(Verb::Patch),
            Method::DELETE => Some(Verb::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            other => Err(format!("unsupported verb: {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndpointKind {
    List,
    Single { id: String },
    BySlug { slug: String },
    Count,
    Settings,
    Upload,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Registry route of the resource, for resource-scoped kinds.
    pub resource: Option<String>,
    pub kind: EndpointKind,
    pub params: BTreeMap<String, String>,
}

type Matched = (Option<String>, EndpointKind);
type Matcher = fn(&str, &ResourceRegistry) -> Option<Matched>;

/// Checked in order; the first hit decides the kind.
const MATCHERS: &[(&str, Matcher)] = &[
    ("by-slug", match_by_slug),
    ("unread-count", match_unread_count),
    ("upload", match_upload),
    ("settings", match_settings),
    ("registry", match_registry),
];

const BY_SLUG: &str = "/by-slug/";

/// Percent-decode a slug or id segment. `+` is kept literally, as in any path.
fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
const UNREAD_COUNT: &str = "/unread-count";

fn match_by_slug(path: &str, registry: &ResourceRegistry) -> Option<Matched> {
    let (route, slug) = path.split_once(BY_SLUG)?;
    let entry = registry.entry(route)?;
    if slug.is_empty() {
        return None;
    }
    Some((
        Some(entry.route.clone()),
        EndpointKind::BySlug { slug: decode_segment(slug) },
    ))
}

fn match_unread_count(path: &str, registry: &ResourceRegistry) -> Option<Matched> {
    let route = path.strip_suffix(UNREAD_COUNT)?;
    let entry = registry.entry(route)?;
    Some((Some(entry.route.clone()), EndpointKind::Count))
}

fn match_upload(path: &str, _registry: &ResourceRegistry) -> Option<Matched> {
    (path == "upload").then_some((None, EndpointKind::Upload))
}

fn match_settings(path: &str, _registry: &ResourceRegistry) -> Option<Matched> {
    (path == "settings").then_some((None, EndpointKind::Settings))
}

fn match_registry(path: &str, registry: &ResourceRegistry) -> Option<Matched> {
    let (entry, rest) = registry.match_path(path)?;
    let kind = match rest {
        None => EndpointKind::List,
        Some(id) => EndpointKind::Single { id: decode_segment(id) },
    };
    Some((Some(entry.route.clone()), kind))
}

/// Decode a query string into a parameter map. Later duplicates win; values are not coerced.
pub fn parse_query(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Parse `path[?query]` against the registry. Pure; never fails, unmatched paths are `Unknown`.
pub fn parse_endpoint(target: &str, registry: &ResourceRegistry) -> EndpointDescriptor {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let params = parse_query(query);
    let path = normalize_route(path);

    let (resource, kind) = MATCHERS
        .iter()
        .find_map(|(_, matcher)| matcher(path, registry))
        .unwrap_or((None, EndpointKind::Unknown));

    EndpointDescriptor {
        resource,
        kind,
        params,
    }
}
