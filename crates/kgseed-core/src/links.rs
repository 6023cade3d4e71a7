//! Deterministic URI conversions between the encyclopedia and linked-data views
//! of an entity. None of these touch the network.

use std::borrow::Cow;

/// Host of the linked-data mirror of the encyclopedia.
pub const LINKED_DATA_BASE: &str = "http://dbpedia.org";

/// Percent-decode an article URL so equal articles compare equal regardless of
/// how the producing service escaped them.
pub fn normalize_article_uri(raw: &str) -> String {
    match urlencoding::decode(raw.trim()) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.trim().to_string(),
    }
}

/// Linked-data resource for an encyclopedia article:
/// `https://en.wikipedia.org/wiki/Madrid` → `http://dbpedia.org/resource/Madrid`.
///
/// Only a path segment that is exactly `wiki` is substituted.
pub fn linked_data_uri(article_uri: &str) -> String {
    let path = uri_path(article_uri);
    let mapped: Vec<&str> = path
        .split('/')
        .map(|segment| if segment == "wiki" { "resource" } else { segment })
        .collect();
    let mapped = mapped.join("/");
    if mapped.starts_with('/') {
        format!("{LINKED_DATA_BASE}{mapped}")
    } else {
        format!("{LINKED_DATA_BASE}/{mapped}")
    }
}

/// Last non-empty path segment, percent-decoded, ignoring scheme, host, query
/// and fragment. Case is preserved.
pub fn trailing_segment(uri: &str) -> Option<Cow<'_, str>> {
    let segment = uri_path(uri)
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())?;
    Some(urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment)))
}

fn uri_path(uri: &str) -> &str {
    let without_suffix = uri
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    match without_suffix.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
        None => without_suffix,
    }
}
