use std::path::PathBuf;

pub use clap::ArgMatches;
pub use config::Config as DispatchConfig;
use config::{Environment, File};
use miette::Result;

pub use error::DispatchConfigError;

mod error;

/// Name of the config file looked up in the global config directory and in
/// project roots. Project roots also accept a dotfile variant.
pub const CONFIG_FILE_NAME: &str = "rest-dispatch.toml";

pub trait DispatchConfigLayer {
    fn layer_config(&mut self, _matches: &ArgMatches, _config: &DispatchConfig) -> Result<()> {
        Ok(())
    }
}

pub struct DispatchConfigOptions {
    global: bool,
    env: bool,
    project_root: Option<PathBuf>,
    global_config_file: Option<PathBuf>,
}

impl Default for DispatchConfigOptions {
    fn default() -> Self {
        DispatchConfigOptions {
            global: true,
            env: true,
            project_root: None,
            global_config_file: None,
        }
    }
}

impl DispatchConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn env(mut self, env: bool) -> Self {
        self.env = env;
        self
    }

    pub fn project_root(mut self, root: Option<PathBuf>) -> Self {
        self.project_root = root;
        self
    }

    pub fn global_config_file(mut self, file: Option<PathBuf>) -> Self {
        self.global_config_file = file;
        self
    }

    /// Loads the global config file, then `REST_DISPATCH_*` environment
    /// variables, then any config files in the project root. Later sources
    /// override earlier ones. Missing files are skipped.
    pub fn load(self) -> Result<DispatchConfig> {
        let mut builder = DispatchConfig::builder();
        if self.global {
            if let Some(config_file) = self.global_config_file {
                builder = builder.add_source(File::from(config_file).required(false));
            }
        }
        if self.env {
            builder = builder.add_source(Environment::with_prefix("rest_dispatch"));
        }
        if let Some(root) = self.project_root {
            builder = builder
                .add_source(File::from(root.join(CONFIG_FILE_NAME)).required(false))
                .add_source(File::from(root.join(format!(".{CONFIG_FILE_NAME}"))).required(false));
        }
        Ok(builder.build().map_err(DispatchConfigError::ConfigError)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::fs;

    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn env_configs() -> Result<()> {
        env::set_var("REST_DISPATCH_ENDPOINT", "http://localhost:5820");
        let config = DispatchConfigOptions::new().global(false).load()?;
        env::remove_var("REST_DISPATCH_ENDPOINT");
        assert_eq!(
            config.get_string("endpoint").into_diagnostic()?,
            "http://localhost:5820"
        );
        Ok(())
    }

    #[test]
    fn global_config() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let file = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &file,
            "endpoint = \"http://example.com\"\nallow = [\"limit\", \"offset\"]",
        )
        .into_diagnostic()?;
        let config = DispatchConfigOptions::new()
            .env(false)
            .global_config_file(Some(file))
            .load()?;
        assert_eq!(
            config.get_string("endpoint").into_diagnostic()?,
            String::from("http://example.com")
        );
        assert_eq!(
            config.get::<Vec<String>>("allow").into_diagnostic()?,
            vec!["limit".to_string(), "offset".to_string()]
        );
        Ok(())
    }

    #[test]
    fn project_config_overrides_global() -> Result<()> {
        let global = tempdir().into_diagnostic()?;
        let global_file = global.path().join(CONFIG_FILE_NAME);
        fs::write(
            &global_file,
            "endpoint = \"http://global.example.com\"\nbase_path = \"/global\"",
        )
        .into_diagnostic()?;

        let root = tempdir().into_diagnostic()?;
        fs::write(
            root.path().join(CONFIG_FILE_NAME),
            "base_path = \"/project\"",
        )
        .into_diagnostic()?;
        fs::write(
            root.path().join(format!(".{CONFIG_FILE_NAME}")),
            "token = \"dotfile\"",
        )
        .into_diagnostic()?;

        let config = DispatchConfigOptions::new()
            .env(false)
            .global_config_file(Some(global_file))
            .project_root(Some(root.path().to_owned()))
            .load()?;
        assert_eq!(
            config.get_string("endpoint").into_diagnostic()?,
            "http://global.example.com"
        );
        assert_eq!(config.get_string("base_path").into_diagnostic()?, "/project");
        assert_eq!(config.get_string("token").into_diagnostic()?, "dotfile");
        Ok(())
    }

    #[test]
    fn missing_config() -> Result<()> {
        let config = DispatchConfigOptions::new().global(false).env(false).load()?;
        assert!(config.get_string("endpoint").is_err());
        Ok(())
    }
}
