use std::future::Future;
use std::sync::Arc;

use once_cell::sync::Lazy;
use reqwest::{header::HeaderMap, Body, Client, ClientBuilder, Method, Response};

use crate::request::{request_init, request_target, AllowedParams, Params, RequestInit};
use crate::{fetch, Connection, DispatchError};

/// Static configuration for a [`Dispatcher`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatcherOptions {
    /// Path prepended to every request's path suffix. Defaults to `""`.
    pub base_path: String,
    /// Query parameters the dispatcher will forward. `None`, the default,
    /// forwards none of them.
    pub allowed_query_params: Option<Vec<String>>,
}

impl DispatcherOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn allowed_query_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_query_params = Some(params.into_iter().map(Into::into).collect());
        self
    }
}

/// Options for a single dispatch.
pub struct Dispatch<'a, C: ?Sized> {
    pub connection: &'a C,
    /// Defaults to `GET`.
    pub method: Method,
    pub body: Option<Body>,
    pub request_headers: Option<&'a HeaderMap>,
    pub params: Option<&'a Params>,
    /// Defaults to `""`.
    pub path_suffix: &'a str,
}

impl<'a, C: Connection + ?Sized> Dispatch<'a, C> {
    pub fn new(connection: &'a C) -> Self {
        Self {
            connection,
            method: Method::GET,
            body: None,
            request_headers: None,
            params: None,
            path_suffix: "",
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn request_headers(mut self, headers: &'a HeaderMap) -> Self {
        self.request_headers = Some(headers);
        self
    }

    pub fn params(mut self, params: &'a Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn path_suffix(mut self, path_suffix: &'a str) -> Self {
        self.path_suffix = path_suffix;
        self
    }
}

/// Dispatches requests under a fixed base path, forwarding only the query
/// parameters it was configured to allow.
///
/// Cloning a dispatcher is cheap: the allowed set and the HTTP client are
/// shared.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    base_path: Arc<str>,
    allowed: Option<Arc<AllowedParams>>,
    client: Client,
}

impl Dispatcher {
    pub fn new(options: DispatcherOptions) -> Self {
        Self {
            base_path: options.base_path.into(),
            allowed: options
                .allowed_query_params
                .map(|params| Arc::new(params.into_iter().collect())),
            client: ClientBuilder::new()
                .user_agent(concat!("rest-dispatch/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("Failed to build HTTP client."),
        }
    }

    pub fn with_client(&self, client: Client) -> Self {
        Self {
            base_path: self.base_path.clone(),
            allowed: self.allowed.clone(),
            client,
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn allowed_params(&self) -> Option<&AllowedParams> {
        self.allowed.as_deref()
    }

    /// Assembles the target and init for `call` without sending anything.
    pub fn prepare<C: Connection + ?Sized>(&self, call: Dispatch<'_, C>) -> (String, RequestInit) {
        let target = request_target(
            call.connection,
            &self.base_path,
            call.path_suffix,
            self.allowed_params(),
            call.params,
        );
        let init = request_init(call.connection, call.method, call.body, call.request_headers);
        (target, init)
    }

    /// Sends the request described by `call`.
    ///
    /// Target and headers are assembled before this returns; the request goes
    /// out when the returned future is first polled. It resolves to the raw
    /// response; status codes are not inspected and nothing is retried.
    pub fn dispatch<C: Connection + ?Sized>(
        &self,
        call: Dispatch<'_, C>,
    ) -> impl Future<Output = Result<Response, DispatchError>> + Send + 'static {
        let (target, init) = self.prepare(call);
        tracing::debug!("{} {}", init.method, target);
        fetch(&self.client, target, init)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherOptions::default())
    }
}

static GENERIC_DISPATCHER: Lazy<Dispatcher> = Lazy::new(Dispatcher::default);

/// A dispatcher with no base path and no allowed query parameters.
pub fn generic_dispatcher() -> &'static Dispatcher {
    &GENERIC_DISPATCHER
}

/// Dispatches `call` through [`generic_dispatcher`].
pub fn dispatch_generic<C: Connection + ?Sized>(
    call: Dispatch<'_, C>,
) -> impl Future<Output = Result<Response, DispatchError>> + Send + 'static {
    generic_dispatcher().dispatch(call)
}
