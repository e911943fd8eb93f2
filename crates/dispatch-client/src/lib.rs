//! Helpers for building and dispatching HTTP requests against a REST API.
//!
//! A [`Connection`] supplies the endpoint and the default headers. A
//! [`Dispatcher`] is configured once with a base path and the set of query
//! parameters it is willing to forward, and can then be used to dispatch any
//! number of requests through any connection.

mod connection;
mod credentials;
mod dispatcher;
mod error;
mod fetch;
mod request;

pub use connection::{Connection, HttpConnection};
pub use credentials::Credentials;
pub use dispatcher::{
    dispatch_generic, generic_dispatcher, Dispatch, Dispatcher, DispatcherOptions,
};
pub use error::DispatchError;
pub use fetch::fetch;
pub use request::{
    query_string, request_init, request_target, AllowedParams, Params, RequestInit,
};
pub use reqwest::{
    header::{self, HeaderMap},
    Body, Method, Response,
};
