use std::{collections::HashMap, fmt::Debug};

use base64::{prelude::BASE64_STANDARD, Engine as _};
use reqwest::header::HeaderValue;

use crate::DispatchError;

/// How a connection authenticates. Rendered into the `Authorization` header
/// of every request made through it.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `username:password`, base64-encoded on the way out.
    Basic {
        username: String,
        password: Option<String>,
    },
    /// An already-encoded basic auth value.
    EncodedBasic(String),
    /// Sent as a bearer token.
    Token(String),
}

impl Credentials {
    /// Renders these credentials as a sensitive `Authorization` header value.
    pub fn authorization(&self) -> Result<HeaderValue, DispatchError> {
        let mut val = match self {
            Self::Basic { username, password } => {
                let pair = match password {
                    Some(password) => format!("{username}:{password}"),
                    None => format!("{username}:"),
                };
                HeaderValue::from_str(&format!("Basic {}", BASE64_STANDARD.encode(pair)))
            }
            Self::EncodedBasic(auth) => HeaderValue::from_str(&format!("Basic {auth}")),
            Self::Token(token) => HeaderValue::from_str(&format!("Bearer {token}")),
        }
        .map_err(DispatchError::InvalidCredentials)?;
        val.set_sensitive(true);
        Ok(val)
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => write!(f, "Basic(username={username},password=***)"),
            Self::EncodedBasic(_) => f.write_str("EncodedBasic(***)"),
            Self::Token(_) => f.write_str("Token(***)"),
        }
    }
}

/// Reads credentials out of a config table. `token` wins over
/// `username`/`password`, which win over a pre-encoded `auth`.
impl TryFrom<HashMap<String, String>> for Credentials {
    type Error = DispatchError;

    fn try_from(mut table: HashMap<String, String>) -> Result<Self, Self::Error> {
        if let Some(token) = table.remove("token") {
            return Ok(Self::Token(token));
        }
        if let Some(username) = table.remove("username") {
            return Ok(Self::Basic {
                username,
                password: table.remove("password"),
            });
        }
        table.remove("auth").map(Self::EncodedBasic).ok_or_else(|| {
            DispatchError::CredentialsConfigError(
                "Credentials need a `token`, a `username` (and optional `password`), or an `auth` value."
                    .into(),
            )
        })
    }
}
