//! Layered configuration for the explorer.
//!
//! Every setting is resolved once at startup, highest precedence first:
//!
//! 1. command-line argument (`--server-port 9090`)
//! 2. properties file (`server-port = 9090` in `styx.toml`, or `--config <path>`)
//! 3. environment (`STYX_SERVER_PORT=9090`)
//! 4. built-in default

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;

/// Properties file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "styx.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_port: u16,
    pub datastore_url: String,
    pub worker_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            datastore_url: "file:data/datastore.styx".to_string(),
            worker_threads: 4,
        }
    }
}

/// One source of settings; unset fields leave lower layers in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLayer {
    pub server_port: Option<u16>,
    pub datastore_url: Option<String>,
    pub worker_threads: Option<usize>,
}

impl ConfigLayer {
    pub fn apply_to(self, config: &mut Config) {
        if let Some(port) = self.server_port {
            config.server_port = port;
        }
        if let Some(url) = self.datastore_url {
            config.datastore_url = url;
        }
        if let Some(threads) = self.worker_threads {
            config.worker_threads = threads.max(1);
        }
    }
}

/// Read a properties file. A missing file is `None`.
pub fn load_file(path: &Path) -> Result<Option<ConfigLayer>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let layer = toml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(layer))
}

/// Settings from `STYX_*` variables. `lookup` is `std::env::var` outside tests.
/// Unparseable values are logged and ignored.
pub fn env_layer(lookup: impl Fn(&str) -> Option<String>) -> ConfigLayer {
    let var = |name: &str| {
        lookup(name)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    };
    let mut layer = ConfigLayer::default();

    if let Some(raw) = var("STYX_SERVER_PORT") {
        match raw.parse() {
            Ok(port) => layer.server_port = Some(port),
            Err(err) => warn!("invalid STYX_SERVER_PORT, ignoring: {err}"),
        }
    }
    if let Some(raw) = var("STYX_DATASTORE_URL") {
        layer.datastore_url = Some(raw);
    }
    if let Some(raw) = var("STYX_WORKER_THREADS") {
        match raw.parse() {
            Ok(threads) => layer.worker_threads = Some(threads),
            Err(err) => warn!("invalid STYX_WORKER_THREADS, ignoring: {err}"),
        }
    }
    layer
}

/// Merge the layers, lowest precedence first.
pub fn merge(env: ConfigLayer, file: Option<ConfigLayer>, args: ConfigLayer) -> Config {
    let mut config = Config::default();
    env.apply_to(&mut config);
    if let Some(file) = file {
        file.apply_to(&mut config);
    }
    args.apply_to(&mut config);
    config
}

/// Resolve the configuration from the process environment, the properties file
/// and the command-line layer.
pub fn load(config_path: Option<&Path>, args: ConfigLayer) -> Result<Config> {
    let file = match config_path {
        Some(path) => Some(
            load_file(path)?.with_context(|| format!("config file not found: {}", path.display()))?,
        ),
        None => load_file(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    let env = env_layer(|name| std::env::var(name).ok());
    Ok(merge(env, file, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name: &str| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn defaults() {
        let config = merge(ConfigLayer::default(), None, ConfigLayer::default());
        assert_eq!(config, Config::default());
        assert_eq!(config.server_port, 8080);
    }

    #[test]
    fn argument_beats_file_beats_env() {
        let env = env_layer(env_of(&[
            ("STYX_SERVER_PORT", "1111"),
            ("STYX_DATASTORE_URL", "memory:"),
            ("STYX_WORKER_THREADS", "2"),
        ]));
        let file = ConfigLayer {
            server_port: Some(2222),
            datastore_url: Some("file:from-file.styx".to_string()),
            ..ConfigLayer::default()
        };
        let args = ConfigLayer {
            server_port: Some(3333),
            ..ConfigLayer::default()
        };
        let config = merge(env, Some(file), args);
        assert_eq!(config.server_port, 3333);
        assert_eq!(config.datastore_url, "file:from-file.styx");
        assert_eq!(config.worker_threads, 2);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let env = env_layer(env_of(&[("STYX_SERVER_PORT", "not-a-port"), ("STYX_WORKER_THREADS", " ")]));
        assert_eq!(env, ConfigLayer::default());
    }

    #[test]
    fn parse_properties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styx.toml");
        fs::write(&path, "server-port = 9090\ndatastore-url = \"memory:\"\n").unwrap();
        let layer = load_file(&path).unwrap().unwrap();
        assert_eq!(layer.server_port, Some(9090));
        assert_eq!(layer.datastore_url.as_deref(), Some("memory:"));
        assert_eq!(layer.worker_threads, None);
    }

    #[test]
    fn unknown_property_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styx.toml");
        fs::write(&path, "template-cache = true\n").unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load(Some(missing.as_path()), ConfigLayer::default()).is_err());
    }
}
