use std::future::Future;

use reqwest::{Client, Response};

use crate::{DispatchError, RequestInit};

/// Issues a single HTTP call for `target`, configured by `init`.
///
/// The request is assembled as soon as this is called, but nothing goes out
/// until the returned future is polled. It resolves to the response as-is,
/// whatever its status. Unparseable targets and transport failures both
/// come back as
/// [`DispatchError::RequestError`].
pub fn fetch(
    client: &Client,
    target: String,
    init: RequestInit,
) -> impl Future<Output = Result<Response, DispatchError>> + Send + 'static {
    let RequestInit {
        method,
        body,
        headers,
    } = init;
    let mut builder = client.request(method, target).headers(headers);
    if let Some(body) = body {
        builder = builder.body(body);
    }
    let pending = builder.send();
    async move { Ok(pending.await?) }
}
