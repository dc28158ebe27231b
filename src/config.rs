//! Configuration loading for the annotation tool.
//!
//! Configuration comes from a TOML file merged with environment variables
//! prefixed `SEISPICK_`, extracted into strongly-typed structs via figment.
//! Hop credentials live here and only here: the connection layer receives
//! opaque [`Secret`] handles and nothing in the core carries a hardcoded
//! credential.
//!
//! # Example
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [remote]
//! root = "/opt/earthworm/run_working/adj_tpd/mseed"
//!
//! [[remote.hops]]
//! host = "bastion.example.org"
//! port = 2025
//! user = "sysop"
//! secret = "..."
//!
//! [[remote.hops]]
//! host = "172.19.3.128"
//! port = 2107
//! user = "operator"
//! secret = "..."
//! ```

use crate::remote::{RemoteEndpoint, Secret};
use crate::validation::{is_not_empty, is_valid_path, is_valid_port};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub application: ApplicationConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub annotation: AnnotationConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Application-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Where the waveform tree lives and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Root of the station/file tree on the target host.
    pub root: String,
    /// When set, annotate this on-disk archive instead of connecting
    /// anywhere; the hop list is ignored.
    #[serde(default)]
    pub local_root: Option<PathBuf>,
    /// Expected waveform extension, matched case-insensitively.
    #[serde(default = "default_waveform_suffix")]
    pub waveform_suffix: String,
    /// Connection chain, outermost hop first.
    #[serde(default)]
    pub hops: Vec<HopConfig>,
}

/// One hop of the connection chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopConfig {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub user: String,
    pub secret: Secret,
    /// Disabled hops are skipped, shortening the chain.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Arbitration and admission tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationConfig {
    /// Tolerance window around the reference timestamp, in seconds.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: f64,
    /// Minimum accepted trace duration, in seconds (boundary inclusive).
    #[serde(default = "default_min_trace_duration_secs")]
    pub min_trace_duration_secs: f64,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: default_tolerance_secs(),
            min_trace_duration_secs: default_min_trace_duration_secs(),
        }
    }
}

/// Ledger output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_waveform_suffix() -> String {
    "mseed".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_enabled() -> bool {
    true
}

fn default_tolerance_secs() -> f64 {
    11.0
}

fn default_min_trace_duration_secs() -> f64 {
    30.0
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("picks.csv")
}

impl Config {
    /// Loads configuration from the default `seispick.toml` plus
    /// `SEISPICK_`-prefixed environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("seispick.toml")
    }

    /// Loads configuration from a specific file path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SEISPICK_").split("_"))
            .extract()
    }

    /// Validates configuration after loading.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.annotation.tolerance_secs < 0.0 || !self.annotation.tolerance_secs.is_finite() {
            return Err(format!(
                "Invalid tolerance_secs {}. Must be a finite value >= 0",
                self.annotation.tolerance_secs
            ));
        }

        if self.annotation.min_trace_duration_secs <= 0.0
            || !self.annotation.min_trace_duration_secs.is_finite()
        {
            return Err(format!(
                "Invalid min_trace_duration_secs {}. Must be a finite value > 0",
                self.annotation.min_trace_duration_secs
            ));
        }

        is_not_empty(&self.remote.waveform_suffix)
            .map_err(|e| format!("Invalid waveform_suffix: {e}"))?;

        is_valid_path(&self.ledger.path.to_string_lossy())
            .map_err(|e| format!("Invalid ledger path: {e}"))?;

        if self.remote.local_root.is_none() {
            is_not_empty(&self.remote.root).map_err(|e| format!("Invalid remote root: {e}"))?;
            if self.enabled_hops().is_empty() {
                return Err("No enabled hops and no local_root configured".to_string());
            }
        }

        for (index, hop) in self.remote.hops.iter().enumerate() {
            if !hop.enabled {
                continue;
            }
            is_not_empty(&hop.host).map_err(|e| format!("Hop {index}: invalid host: {e}"))?;
            is_valid_port(hop.port).map_err(|e| format!("Hop {index}: invalid port: {e}"))?;
            is_not_empty(&hop.user).map_err(|e| format!("Hop {index}: invalid user: {e}"))?;
        }

        Ok(())
    }

    /// The connection chain with disabled hops filtered out, outermost
    /// first.
    pub fn enabled_hops(&self) -> Vec<RemoteEndpoint> {
        self.remote
            .hops
            .iter()
            .filter(|hop| hop.enabled)
            .map(|hop| RemoteEndpoint {
                host: hop.host.clone(),
                port: hop.port,
                user: hop.user.clone(),
                secret: hop.secret.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            application: ApplicationConfig::default(),
            remote: RemoteConfig {
                root: "/data/mseed".to_string(),
                local_root: None,
                waveform_suffix: default_waveform_suffix(),
                hops: vec![HopConfig {
                    host: "bastion.example.org".to_string(),
                    port: 2025,
                    user: "sysop".to_string(),
                    secret: Secret::new("pw"),
                    enabled: true,
                }],
            },
            annotation: AnnotationConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = base_config();
        assert!(config.validate().is_ok());
        assert!((config.annotation.tolerance_secs - 11.0).abs() < f64::EPSILON);
        assert!((config.annotation.min_trace_duration_secs - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.remote.waveform_suffix, "mseed");
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = base_config();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let mut config = base_config();
        config.annotation.tolerance_secs = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabled_hops_are_filtered_from_the_chain() {
        let mut config = base_config();
        config.remote.hops.push(HopConfig {
            host: "172.19.3.128".to_string(),
            port: 2107,
            user: "operator".to_string(),
            secret: Secret::new("pw2"),
            enabled: false,
        });
        let hops = config.enabled_hops();
        assert_eq!(hops.len(), 1);
        assert_eq!(hops[0].host, "bastion.example.org");
    }

    #[test]
    fn no_hops_without_local_root_is_rejected() {
        let mut config = base_config();
        config.remote.hops.clear();
        assert!(config.validate().is_err());

        config.remote.local_root = Some(PathBuf::from("/archive"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hop_with_port_zero_is_rejected() {
        let mut config = base_config();
        config.remote.hops[0].port = 0;
        assert!(config.validate().is_err());
    }
}
