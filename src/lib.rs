use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use clap::{parser::ValueSource, ArgMatches, CommandFactory, FromArgMatches as _, Parser};
use directories::ProjectDirs;
use dispatch_client::header::{HeaderMap, HeaderName, HeaderValue};
use dispatch_client::{
    Credentials, Dispatch, Dispatcher, DispatcherOptions, HttpConnection, Method, Params,
};
use dispatch_config::{
    DispatchConfig, DispatchConfigLayer, DispatchConfigOptions, CONFIG_FILE_NAME,
};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};
use url::Url;

pub use error::RestDispatchError;

mod error;

/// Build and dispatch a single HTTP request against a REST API.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct RestDispatch {
    /// Path appended to the base path, for example `/123`.
    #[arg(default_value = "")]
    path_suffix: String,

    /// API endpoint URL.
    #[arg(long)]
    endpoint: Option<Url>,

    /// Path every request is made under.
    #[arg(long)]
    base_path: Option<String>,

    /// Query parameter to forward. Can be given multiple times. Parameters
    /// that aren't allowed are dropped without error.
    #[arg(long = "allow", value_name = "NAME")]
    allow: Vec<String>,

    /// Query parameter, as `name=value`. Can be given multiple times.
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Request header, as `Name: value`. Can be given multiple times.
    #[arg(long = "header", short = 'H', value_name = "HEADER", value_parser = parse_header)]
    headers: Vec<(HeaderName, HeaderValue)>,

    /// HTTP method.
    #[arg(long, short = 'X', default_value = "GET", value_parser = parse_method)]
    method: Method,

    /// Request body.
    #[arg(long)]
    body: Option<String>,

    /// Username for HTTP basic auth.
    #[arg(long)]
    username: Option<String>,

    /// Password for HTTP basic auth.
    #[arg(long)]
    password: Option<String>,

    /// Bearer token. Takes precedence over username/password.
    #[arg(long)]
    token: Option<String>,

    /// Project directory to look for config files in.
    #[arg(long)]
    root: Option<PathBuf>,

    /// File to read configuration values from.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output level/directive. Supports plain loglevels (off, error,
    /// warn, info, debug, trace) as well as more advanced directives in the
    /// format `target[span{field=value}]=level`.
    #[arg(long, default_value = "warn")]
    loglevel: String,

    /// Disable all output
    #[arg(long, short)]
    quiet: bool,

    /// Format output as JSON.
    #[arg(long)]
    json: bool,
}

impl RestDispatch {
    fn setup_logging(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(
                EnvFilter::builder()
                    .with_default_directive(if self.quiet {
                        LevelFilter::OFF.into()
                    } else {
                        self.loglevel.parse().into_diagnostic()?
                    })
                    .from_env_lossy(),
            )
            .init();
        Ok(())
    }

    pub async fn load() -> Result<()> {
        let start = Instant::now();
        let matches = RestDispatch::command().get_matches();
        let mut rd = RestDispatch::from_arg_matches(&matches).into_diagnostic()?;
        let cfg = if let Some(file) = &rd.config {
            DispatchConfigOptions::new()
                .global_config_file(Some(file.clone()))
                .load()?
        } else {
            DispatchConfigOptions::new()
                .global_config_file(
                    ProjectDirs::from("", "", "rest-dispatch")
                        .map(|d| d.config_dir().to_owned().join(CONFIG_FILE_NAME)),
                )
                .project_root(rd.root.clone())
                .load()?
        };
        rd.layer_config(&matches, &cfg)?;
        rd.setup_logging()?;
        rd.execute().await?;
        tracing::info!("Ran in {}s", start.elapsed().as_millis() as f32 / 1000.0);
        Ok(())
    }

    fn credentials(&self) -> Option<Credentials> {
        if let Some(token) = &self.token {
            Some(Credentials::Token(token.clone()))
        } else {
            self.username.as_ref().map(|username| Credentials::Basic {
                username: username.clone(),
                password: self.password.clone(),
            })
        }
    }

    fn dispatcher_options(&self) -> DispatcherOptions {
        let options =
            DispatcherOptions::new().base_path(self.base_path.clone().unwrap_or_default());
        if self.allow.is_empty() {
            options
        } else {
            options.allowed_query_params(self.allow.iter().cloned())
        }
    }

    pub async fn execute(self) -> Result<()> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or(RestDispatchError::MissingEndpoint)?;
        let conn = HttpConnection::new(endpoint).credentials(self.credentials())?;
        let dispatcher = Dispatcher::new(self.dispatcher_options());
        if dispatcher.allowed_params().is_none() && !self.params.is_empty() {
            tracing::warn!(
                "No query parameters are allowed. Dropping {} parameter(s). Use `--allow` to forward them.",
                self.params.len()
            );
        }

        let headers: HeaderMap = self.headers.iter().cloned().collect();
        let params: Params = self.params.iter().cloned().collect();
        let mut call = Dispatch::new(&conn)
            .method(self.method.clone())
            .request_headers(&headers)
            .params(&params)
            .path_suffix(&self.path_suffix);
        if let Some(body) = &self.body {
            call = call.body(body.clone());
        }

        let res = dispatcher.dispatch(call).await?;
        let status = res.status();
        let url = res.url().to_string();
        let text = res
            .text()
            .await
            .into_diagnostic()
            .wrap_err("rest_dispatch::read_body")?;

        if self.json {
            let output = serde_json::to_string_pretty(&serde_json::json!({
                "url": url,
                "status": status.as_u16(),
                "body": text,
            }))
            .into_diagnostic()
            .wrap_err("rest_dispatch::serialize")?;
            if !self.quiet {
                println!("{output}");
            }
        } else if !self.quiet {
            eprintln!("{status} {url}");
            print!("{text}");
        }
        Ok(())
    }
}

impl DispatchConfigLayer for RestDispatch {
    fn layer_config(&mut self, matches: &ArgMatches, config: &DispatchConfig) -> Result<()> {
        if self.endpoint.is_none() {
            if let Ok(endpoint) = config.get_string("endpoint") {
                self.endpoint = Some(
                    endpoint
                        .parse()
                        .into_diagnostic()
                        .wrap_err("rest_dispatch::config::endpoint")?,
                );
            }
        }
        if self.base_path.is_none() {
            self.base_path = config.get_string("base_path").ok();
        }
        if self.allow.is_empty() {
            if let Ok(allow) = config.get::<Vec<String>>("allow") {
                self.allow = allow;
            }
        }
        if self.token.is_none() && self.username.is_none() {
            self.token = config.get_string("token").ok();
            self.username = config.get_string("username").ok();
            self.password = self
                .password
                .take()
                .or_else(|| config.get_string("password").ok());
            if self.token.is_none() && self.username.is_none() {
                if let Ok(table) = config.get::<HashMap<String, String>>("credentials") {
                    match Credentials::try_from(table)? {
                        Credentials::Token(token) => self.token = Some(token),
                        Credentials::Basic { username, password } => {
                            self.username = Some(username);
                            self.password = password;
                        }
                        Credentials::EncodedBasic(_) => {
                            tracing::warn!(
                                "Pre-encoded `auth` credentials are not supported by the command line and will be ignored."
                            );
                        }
                    }
                }
            }
        }
        if matches.value_source("loglevel") == Some(ValueSource::DefaultValue) {
            if let Ok(loglevel) = config.get_string("loglevel") {
                self.loglevel = loglevel;
            }
        }
        Ok(())
    }
}

fn parse_param(s: &str) -> Result<(String, String), RestDispatchError> {
    s.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| RestDispatchError::InvalidParam(s.to_string()))
}

fn parse_header(s: &str) -> Result<(HeaderName, HeaderValue), RestDispatchError> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| RestDispatchError::InvalidHeader(s.to_string()))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|_| RestDispatchError::InvalidHeader(s.to_string()))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|_| RestDispatchError::InvalidHeader(s.to_string()))?;
    Ok((name, value))
}

fn parse_method(s: &str) -> Result<Method, RestDispatchError> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes())
        .map_err(|_| RestDispatchError::InvalidMethod(s.to_string()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn layered(args: &[&str], config: &str) -> Result<RestDispatch> {
        let dir = tempdir().into_diagnostic()?;
        let file = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&file, config).into_diagnostic()?;
        let cfg = DispatchConfigOptions::new()
            .env(false)
            .global_config_file(Some(file))
            .load()?;
        let matches = RestDispatch::command()
            .try_get_matches_from(std::iter::once("rest-dispatch").chain(args.iter().copied()))
            .into_diagnostic()?;
        let mut rd = RestDispatch::from_arg_matches(&matches).into_diagnostic()?;
        rd.layer_config(&matches, &cfg)?;
        Ok(rd)
    }

    #[test]
    fn params_and_headers() {
        assert_eq!(
            parse_param("limit=10").unwrap(),
            ("limit".to_string(), "10".to_string())
        );
        assert_eq!(
            parse_param("query=?s=?o").unwrap(),
            ("query".to_string(), "?s=?o".to_string())
        );
        assert!(parse_param("limit").is_err());
        assert!(parse_param("=10").is_err());

        let (name, value) = parse_header("Accept:  text/turtle ").unwrap();
        assert_eq!(name, "accept");
        assert_eq!(value, "text/turtle");
        assert!(parse_header("Accept").is_err());
        assert!(parse_header("Bad Name: x").is_err());

        assert_eq!(parse_method("post").unwrap(), Method::POST);
        assert!(parse_method("NOT A METHOD").is_err());
    }

    #[test]
    fn config_fills_missing_args() -> Result<()> {
        let rd = layered(
            &["/123"],
            r#"
            endpoint = "http://localhost:5820"
            base_path = "/myDb/docs"
            allow = ["limit"]
            loglevel = "debug"

            [credentials]
            username = "admin"
            password = "admin"
            "#,
        )?;
        assert_eq!(rd.endpoint.as_ref().map(Url::as_str), Some("http://localhost:5820/"));
        assert_eq!(rd.base_path.as_deref(), Some("/myDb/docs"));
        assert_eq!(rd.allow, vec!["limit".to_string()]);
        assert_eq!(rd.loglevel, "debug");
        assert_eq!(rd.path_suffix, "/123");
        assert_eq!(
            rd.credentials(),
            Some(Credentials::Basic {
                username: "admin".into(),
                password: Some("admin".into())
            })
        );
        Ok(())
    }

    #[test]
    fn args_win_over_config() -> Result<()> {
        let rd = layered(
            &[
                "--endpoint",
                "http://example.com",
                "--allow",
                "offset",
                "--token",
                "abc",
                "--loglevel",
                "error",
            ],
            r#"
            endpoint = "http://localhost:5820"
            allow = ["limit"]
            username = "admin"
            loglevel = "debug"
            "#,
        )?;
        assert_eq!(rd.endpoint.as_ref().map(Url::as_str), Some("http://example.com/"));
        assert_eq!(rd.allow, vec!["offset".to_string()]);
        assert_eq!(rd.loglevel, "error");
        assert_eq!(rd.credentials(), Some(Credentials::Token("abc".into())));
        Ok(())
    }

    #[test]
    fn no_allow_list_means_no_allowed_params() -> Result<()> {
        let rd = layered(&["--base-path", "/admin"], "")?;
        let options = rd.dispatcher_options();
        assert_eq!(options.base_path, "/admin");
        assert_eq!(options.allowed_query_params, None);
        assert_eq!(rd.method, Method::GET);
        assert_eq!(rd.credentials(), None);
        Ok(())
    }
}
