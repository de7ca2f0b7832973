//! Verifier configuration: built-in defaults, optionally overlaid by a TOML
//! file (`with-serde` feature) and then by command-line flags.

#[cfg(feature = "with-serde")]
mod file;

#[cfg(feature = "with-serde")]
pub use file::ConfigFile;

use std::net::AddrParseError;
use std::path::PathBuf;

use thiserror::Error;

use crate::mx::DnsOptions;
use crate::smtp_verify::SmtpProbeOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[cfg(feature = "with-serde")]
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid nameserver address '{value}': {source}")]
    InvalidNameserver {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("{which} timeout must be greater than zero")]
    ZeroTimeout { which: &'static str },
    #[error("SMTP sender address must not be empty")]
    EmptySender,
    #[error("HELO name must not be empty")]
    EmptyHeloName,
    #[error("jobs must be at least 1")]
    ZeroJobs,
}

impl ConfigError {
    pub fn invalid_nameserver(value: impl Into<String>, source: AddrParseError) -> Self {
        Self::InvalidNameserver {
            value: value.into(),
            source,
        }
    }
}

/// Everything a [`Verifier`](crate::Verifier) needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub dns: DnsOptions,
    pub smtp: SmtpProbeOptions,
    /// Worker threads for batch runs; 1 keeps the run sequential.
    pub jobs: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            dns: DnsOptions::default(),
            smtp: SmtpProbeOptions::default(),
            jobs: 1,
        }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smtp.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { which: "SMTP" });
        }
        if self.dns.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { which: "DNS" });
        }
        if self.smtp.mail_from.trim().is_empty() {
            return Err(ConfigError::EmptySender);
        }
        if self.smtp.helo_name.trim().is_empty() {
            return Err(ConfigError::EmptyHeloName);
        }
        if self.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        Ok(())
    }
}

/// Parses nameserver addresses given as plain IPs.
pub fn parse_nameservers<S: AsRef<str>>(
    values: &[S],
) -> Result<Vec<std::net::IpAddr>, ConfigError> {
    values
        .iter()
        .map(|value| {
            let value = value.as_ref().trim();
            value
                .parse()
                .map_err(|err| ConfigError::invalid_nameserver(value, err))
        })
        .collect()
}
