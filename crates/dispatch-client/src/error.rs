use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DispatchError {
    /// The HTTP call failed. This covers both transport failures and targets
    /// that could not be parsed as URLs.
    #[error("Request failed: {0}")]
    #[diagnostic(code(dispatch_client::request_error))]
    RequestError(#[from] reqwest::Error),

    #[error("{0}")]
    #[diagnostic(code(dispatch_client::credentials_config_error))]
    CredentialsConfigError(String),

    /// Credentials contained characters that can't be sent in an HTTP
    /// header, such as newlines.
    #[error("Credentials can't be sent in an `Authorization` header.")]
    #[diagnostic(
        code(dispatch_client::invalid_credentials),
        help("Check the token or auth value for stray whitespace or control characters.")
    )]
    InvalidCredentials(#[source] reqwest::header::InvalidHeaderValue),
}
