//! TOML configuration file format.
//!
//! ```toml
//! [dns]
//! timeout = 5
//! nameservers = ["1.1.1.1"]
//!
//! [smtp]
//! timeout = 10
//! port = 25
//! mail_from = "verify@example.com"
//! helo_name = "localhost"
//!
//! [cache]
//! enabled = true
//!
//! [batch]
//! jobs = 4
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::{ConfigError, VerifierConfig, parse_nameservers};

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) dns: DnsSection,
    #[serde(default)]
    pub(crate) smtp: SmtpSection,
    #[serde(default)]
    pub(crate) cache: CacheSection,
    #[serde(default)]
    pub(crate) batch: BatchSection,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct DnsSection {
    /// Seconds.
    pub(crate) timeout: Option<u64>,
    pub(crate) nameservers: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct SmtpSection {
    /// Seconds.
    pub(crate) timeout: Option<u64>,
    pub(crate) port: Option<u16>,
    pub(crate) mail_from: Option<String>,
    pub(crate) helo_name: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct CacheSection {
    pub(crate) enabled: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct BatchSection {
    pub(crate) jobs: Option<usize>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(file)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overwrites every field of `config` that the file sets.
    pub fn apply(&self, config: &mut VerifierConfig) -> Result<(), ConfigError> {
        if let Some(secs) = self.dns.timeout {
            config.dns.timeout = Duration::from_secs(secs);
        }
        if let Some(servers) = &self.dns.nameservers {
            config.dns.nameservers = parse_nameservers(servers)?;
        }
        if let Some(secs) = self.smtp.timeout {
            config.smtp.timeout = Duration::from_secs(secs);
        }
        if let Some(port) = self.smtp.port {
            config.smtp.port = port;
        }
        if let Some(sender) = &self.smtp.mail_from {
            config.smtp.mail_from = sender.clone();
        }
        if let Some(helo) = &self.smtp.helo_name {
            config.smtp.helo_name = helo.clone();
        }
        if let Some(enabled) = self.cache.enabled {
            config.dns.cache_enabled = enabled;
        }
        if let Some(jobs) = self.batch.jobs {
            config.jobs = jobs;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[test]
    fn partial_file_only_touches_given_fields() {
        let file = ConfigFile::parse(
            r#"
            [smtp]
            mail_from = "probe@mydomain.test"
            timeout = 3

            [cache]
            enabled = false
            "#,
        )
        .expect("parse");

        let mut config = VerifierConfig::default();
        file.apply(&mut config).expect("apply");

        assert_eq!(config.smtp.mail_from, "probe@mydomain.test");
        assert_eq!(config.smtp.timeout, Duration::from_secs(3));
        assert_eq!(config.smtp.port, 25);
        assert!(!config.dns.cache_enabled);
        assert_eq!(config.dns.timeout, Duration::from_secs(5));
        assert_eq!(config.jobs, 1);
    }

    #[test]
    fn nameservers_and_jobs_are_applied() {
        let file = ConfigFile::parse(
            r#"
            [dns]
            nameservers = ["9.9.9.9"]
            timeout = 2

            [batch]
            jobs = 8
            "#,
        )
        .expect("parse");
        let mut config = VerifierConfig::default();
        file.apply(&mut config).expect("apply");
        assert_eq!(
            config.dns.nameservers,
            vec![IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9))]
        );
        assert_eq!(config.dns.timeout, Duration::from_secs(2));
        assert_eq!(config.jobs, 8);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigFile::parse("[smtp]\nstarttls = true\n").is_err());
        assert!(ConfigFile::parse("[telegram]\ntoken = \"x\"\n").is_err());
    }

    #[test]
    fn bad_nameserver_fails_apply() {
        let file = ConfigFile::parse("[dns]\nnameservers = [\"not-an-ip\"]\n").expect("parse");
        let mut config = VerifierConfig::default();
        assert!(matches!(
            file.apply(&mut config),
            Err(ConfigError::InvalidNameserver { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ConfigFile::load(Path::new("/nonexistent/mailprobe.toml")).expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
