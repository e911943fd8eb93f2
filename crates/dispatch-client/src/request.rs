use std::collections::{BTreeMap, HashSet};

use reqwest::{header::HeaderMap, Body, Method};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::Connection;

/// Query parameters for a single request, keyed by name. Keys are kept
/// sorted so the resulting query string is stable.
pub type Params = BTreeMap<String, String>;

/// Names of the query parameters a dispatcher will forward. Anything not in
/// here is dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowedParams(HashSet<String>);

impl AllowedParams {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowedParams {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Everything needed to configure a single HTTP call, other than its target.
#[derive(Debug)]
pub struct RequestInit {
    pub method: Method,
    pub body: Option<Body>,
    pub headers: HeaderMap,
}

/// Starts from the connection's base headers and sets every header in
/// `request_headers` on top of them, replacing any existing value for the
/// same name.
pub fn request_init<C: Connection + ?Sized>(
    connection: &C,
    method: Method,
    body: Option<Body>,
    request_headers: Option<&HeaderMap>,
) -> RequestInit {
    let mut headers = connection.headers();
    if let Some(request_headers) = request_headers {
        for name in request_headers.keys() {
            if let Some(value) = request_headers.get(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
    }
    RequestInit {
        method,
        body,
        headers,
    }
}

/// Builds the request target for `base_path` + `path_suffix`, appending a
/// query string made of the entries in `params` whose names are in
/// `allowed`.
///
/// With no allowed set at all, every parameter is dropped.
pub fn request_target<C: Connection + ?Sized>(
    connection: &C,
    base_path: &str,
    path_suffix: &str,
    allowed: Option<&AllowedParams>,
    params: Option<&Params>,
) -> String {
    let params = match params {
        Some(params) if !params.is_empty() => params,
        _ => return connection.request(base_path, path_suffix),
    };
    let query = query_string(allowed, params);
    if query.is_empty() {
        connection.request(base_path, path_suffix)
    } else {
        connection.request(base_path, &format!("{path_suffix}?{query}"))
    }
}

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` gets percent-encoded.
/// Spaces become `%20`, never `+`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encodes the allowed subset of `params` as `name=value` pairs joined by
/// `&`, in key order. Returns an empty string if nothing is allowed through.
pub fn query_string(allowed: Option<&AllowedParams>, params: &Params) -> String {
    let mut query = String::new();
    for (name, value) in params {
        if !allowed.map_or(false, |allowed| allowed.contains(name)) {
            tracing::trace!("Dropping disallowed query parameter `{name}`");
            continue;
        }
        if !query.is_empty() {
            query.push('&');
        }
        query.extend(utf8_percent_encode(name, QUERY_COMPONENT));
        query.push('=');
        query.extend(utf8_percent_encode(value, QUERY_COMPONENT));
    }
    query
}
