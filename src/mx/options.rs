use std::net::IpAddr;
use std::time::Duration;

/// Controls how [`DomainResolver::from_options`](super::DomainResolver::from_options)
/// builds its DNS client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsOptions {
    /// Upper bound for a single query.
    pub timeout: Duration,
    /// Nameservers to use instead of the system configuration (port 53).
    pub nameservers: Vec<IpAddr>,
    pub cache_enabled: bool,
}

impl Default for DnsOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            nameservers: Vec::new(),
            cache_enabled: true,
        }
    }
}
