use crate::config::{DnsResolveMethodConfig, LogFormat, LogSpanEvents};
use anyhow::Context;
use etcetera::BaseStrategy;
use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use syntrace_core::defaults;

const DEFAULT_CONFIG_FILE: &str = "syntrace.toml";
const DEFAULT_HIDDEN_CONFIG_FILE: &str = ".syntrace.toml";

/// Read the config from the default location of user config for the platform.
///
/// Returns the parsed `Some(ConfigFile)` if the config file exists, `None` otherwise.
///
/// Syntrace will attempt to locate a `syntrace.toml` or `.syntrace.toml` config file in one of
/// the following locations:
///     - the current directory
///     - the user home directory
///     - the XDG config directory: `$XDG_CONFIG_HOME` or `~/.config`
///     - the XDG app config directory: `$XDG_CONFIG_HOME/syntrace` or `~/.config/syntrace`
///
/// Only the first config file found is used.
pub fn read_default_config_file() -> anyhow::Result<Option<ConfigFile>> {
    use etcetera::base_strategy as base;
    if let Some(file) = read_files("")? {
        Ok(Some(file))
    } else {
        let basedirs = base::choose_base_strategy()?;
        if let Some(file) = read_files(basedirs.home_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir().join("syntrace"))? {
            Ok(Some(file))
        } else {
            Ok(None)
        }
    }
}

/// Read the config from the given path.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> anyhow::Result<ConfigFile> {
    let contents = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("config file not found: {}", path.as_ref().display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("invalid config file: {}", path.as_ref().display()))
}

fn read_files<P: AsRef<Path>>(dir: P) -> anyhow::Result<Option<ConfigFile>> {
    if let Some(file) = read_file(dir.as_ref(), DEFAULT_CONFIG_FILE)? {
        Ok(Some(file))
    } else if let Some(file) = read_file(dir.as_ref(), DEFAULT_HIDDEN_CONFIG_FILE)? {
        Ok(Some(file))
    } else {
        Ok(None)
    }
}

fn read_file<P: AsRef<Path>>(dir: P, file: &str) -> anyhow::Result<Option<ConfigFile>> {
    let path = dir.as_ref().join(file);
    if path.exists() {
        Ok(Some(read_config_file(path)?))
    } else {
        Ok(None)
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub trace: Option<ConfigTrace>,
    pub dns: Option<ConfigDns>,
    pub log: Option<ConfigLog>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            trace: Some(ConfigTrace::default()),
            dns: Some(ConfigDns::default()),
            log: Some(ConfigLog::default()),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigTrace {
    pub max_hops: Option<u8>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub hop_timeout: Option<Duration>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub read_timeout: Option<Duration>,
    pub probes_per_hop: Option<u8>,
    pub source_port: Option<u16>,
    pub dest_port: Option<u16>,
    pub initial_sequence: Option<u32>,
    #[serde(default)]
    #[serde(deserialize_with = "addr_deser")]
    pub source_address: Option<IpAddr>,
    pub interface: Option<String>,
}

impl Default for ConfigTrace {
    fn default() -> Self {
        Self {
            max_hops: Some(defaults::DEFAULT_MAX_HOPS),
            hop_timeout: Some(defaults::DEFAULT_HOP_TIMEOUT),
            read_timeout: None,
            probes_per_hop: Some(defaults::DEFAULT_PROBES_PER_HOP),
            source_port: Some(defaults::DEFAULT_SOURCE_PORT),
            dest_port: None,
            initial_sequence: None,
            source_address: None,
            interface: None,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[expect(clippy::struct_field_names)]
pub struct ConfigDns {
    pub dns_resolve_method: Option<DnsResolveMethodConfig>,
    pub dns_lookup: Option<bool>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub dns_timeout: Option<Duration>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub dns_ttl: Option<Duration>,
}

impl Default for ConfigDns {
    fn default() -> Self {
        Self {
            dns_resolve_method: Some(super::constants::DEFAULT_DNS_RESOLVE_METHOD),
            dns_lookup: Some(defaults::DEFAULT_REVERSE_DNS),
            dns_timeout: Some(super::constants::DEFAULT_DNS_TIMEOUT),
            dns_ttl: Some(super::constants::DEFAULT_DNS_TTL),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[expect(clippy::struct_field_names)]
pub struct ConfigLog {
    pub log_format: Option<LogFormat>,
    pub log_filter: Option<String>,
    pub log_span_events: Option<LogSpanEvents>,
}

impl Default for ConfigLog {
    fn default() -> Self {
        Self {
            log_format: Some(super::constants::DEFAULT_LOG_FORMAT),
            log_filter: Some(String::from(super::constants::DEFAULT_LOG_FILTER)),
            log_span_events: Some(super::constants::DEFAULT_LOG_SPAN_EVENTS),
        }
    }
}

fn humantime_deser<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    humantime::parse_duration(&String::deserialize(deserializer)?)
        .map_err(serde::de::Error::custom)
        .map(Some)
}

fn addr_deser<'de, D>(deserializer: D) -> Result<Option<IpAddr>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    IpAddr::from_str(&String::deserialize(deserializer)?)
        .map_err(serde::de::Error::custom)
        .map(Some)
}
