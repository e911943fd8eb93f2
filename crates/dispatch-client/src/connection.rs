use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use url::Url;

use crate::{Credentials, DispatchError};

/// Source of the endpoint and default headers for outgoing requests.
///
/// Dispatchers never construct or hold on to a connection. They borrow one
/// for the duration of a single dispatch.
pub trait Connection {
    /// Base headers for a request. Every call returns a fresh map that the
    /// caller owns and may modify.
    fn headers(&self) -> HeaderMap;

    /// Builds the request target for the given base path and path suffix.
    /// The suffix may already carry a query string.
    fn request(&self, base_path: &str, path_suffix: &str) -> String;
}

/// A [`Connection`] to a single HTTP endpoint, with optional credentials and
/// a set of headers sent with every request.
#[derive(Clone, Debug)]
pub struct HttpConnection {
    endpoint: Arc<Url>,
    authorization: Option<HeaderValue>,
    default_headers: HeaderMap,
}

impl HttpConnection {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            authorization: None,
            default_headers: HeaderMap::new(),
        }
    }

    /// Sets the credentials every request is authenticated with. They are
    /// rendered here, so credentials that can't go in a header are rejected
    /// up front instead of being left off requests.
    pub fn credentials(
        mut self,
        credentials: Option<Credentials>,
    ) -> Result<Self, DispatchError> {
        self.authorization = credentials
            .as_ref()
            .map(Credentials::authorization)
            .transpose()?;
        Ok(self)
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_endpoint(&self, endpoint: Url) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            authorization: self.authorization.clone(),
            default_headers: self.default_headers.clone(),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Connection for HttpConnection {
    fn headers(&self) -> HeaderMap {
        let mut headers = self.default_headers.clone();
        if let Some(auth) = &self.authorization {
            headers.insert(AUTHORIZATION, auth.clone());
        }
        headers
    }

    fn request(&self, base_path: &str, path_suffix: &str) -> String {
        let endpoint = self.endpoint.as_str();
        format!(
            "{}{base_path}{path_suffix}",
            endpoint.strip_suffix('/').unwrap_or(endpoint)
        )
    }
}
