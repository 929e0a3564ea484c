//! Run configuration and the server profile registry.
//!
//! Profiles are read once from a TOML file and never change during a run.
//! The selected [`ServerProfile`] is passed explicitly to whatever needs it.

use crate::error::{Error, Result};
use crate::identity::DEFAULT_SECRET_KEY;
use crate::inventory::DEFAULT_PAGE_SIZE;
use crate::transport::DEFAULT_TIMEOUT_SECS;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "ams.toml";
pub const DEFAULT_PORT: u16 = 5080;
const REST_PATH: &str = "/WebRTCAppEE/rest/v2";

/// One media server endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProfile {
    pub name: String,
    pub api_url: String,
    pub origin_ip: String,
    pub streams_csv: Option<PathBuf>,
}

impl ServerProfile {
    /// Ad-hoc profile for `host[:port]`, using the default application path.
    pub fn from_address(address: &str) -> Result<Self> {
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| Error::Config(format!("invalid port in '{}'", address)))?;
                (host, port)
            }
            None => (address, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(Error::Config("server address must not be empty".to_string()));
        }

        let api_url = format!("http://{}:{}{}", host, port, REST_PATH);
        validate_url(&api_url)?;
        Ok(Self {
            name: address.to_string(),
            api_url,
            origin_ip: host.to_string(),
            streams_csv: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileEntry {
    api_url: String,
    origin_ip: String,
    #[serde(default)]
    streams_csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    #[serde(default = "default_secret_key")]
    secret_key: String,
    #[serde(default = "default_page_size")]
    page_size: usize,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    profiles: BTreeMap<String, ProfileEntry>,
}

fn default_secret_key() -> String {
    DEFAULT_SECRET_KEY.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Immutable name -> profile map.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, ServerProfile>,
}

impl ProfileRegistry {
    pub fn get(&self, name: &str) -> Result<&ServerProfile> {
        self.profiles.get(name).ok_or_else(|| Error::ProfileNotFound {
            name: name.to_string(),
            known: self.names().collect::<Vec<_>>().join(", "),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secret_key: String,
    pub page_size: usize,
    pub timeout: Duration,
    pub profiles: ProfileRegistry,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            profiles: ProfileRegistry::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `ams.toml` if no path is given. A missing default file
    /// yields the built-in defaults with no profiles; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !explicit && !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(
            "Loaded {} profile(s) from {}",
            config.profiles.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let raw: RawConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;

        if raw.page_size == 0 {
            return Err(Error::Config("page_size must be positive".to_string()));
        }
        if raw.secret_key.is_empty() {
            return Err(Error::Config("secret_key must not be empty".to_string()));
        }

        let mut profiles = BTreeMap::new();
        for (name, entry) in raw.profiles {
            validate_url(&entry.api_url)
                .map_err(|e| Error::Config(format!("profile '{}': {}", name, e)))?;
            profiles.insert(
                name.clone(),
                ServerProfile {
                    name,
                    api_url: entry.api_url,
                    origin_ip: entry.origin_ip,
                    streams_csv: entry.streams_csv,
                },
            );
        }

        Ok(Self {
            secret_key: raw.secret_key,
            page_size: raw.page_size,
            timeout: Duration::from_secs(raw.timeout_secs),
            profiles: ProfileRegistry { profiles },
        })
    }
}

fn validate_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Config(format!(
            "unsupported URL scheme '{}' in '{}'",
            other, raw
        ))),
    }
}
