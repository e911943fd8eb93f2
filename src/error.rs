use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RestDispatchError {
    /// Query parameters are given as `name=value`.
    #[error("`{0}` is not a valid query parameter.")]
    #[diagnostic(
        code(rest_dispatch::invalid_param),
        help("Query parameters look like `--param limit=10`.")
    )]
    InvalidParam(String),

    /// Headers are given as `Name: value`, and both halves have to be valid
    /// in an HTTP header.
    #[error("`{0}` is not a valid request header.")]
    #[diagnostic(
        code(rest_dispatch::invalid_header),
        help("Headers look like `--header \"Accept: application/json\"`.")
    )]
    InvalidHeader(String),

    #[error("`{0}` is not a valid HTTP method.")]
    #[diagnostic(code(rest_dispatch::invalid_method))]
    InvalidMethod(String),

    /// No endpoint was given on the command line or found in any config
    /// source.
    #[error("No endpoint to dispatch to.")]
    #[diagnostic(
        code(rest_dispatch::missing_endpoint),
        help("Pass `--endpoint <URL>`, set REST_DISPATCH_ENDPOINT, or add `endpoint = \"...\"` to rest-dispatch.toml.")
    )]
    MissingEndpoint,
}
