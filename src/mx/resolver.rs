use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use trust_dns_resolver::Resolver;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::proto::rr::RecordType;

use super::types::normalize_exchange;
use super::{AddressFamily, DnsFailure, DnsOptions, MxError, MxRecord, MxRecordSet};

/// The DNS queries the resolver needs. Implemented for the trust-dns
/// [`Resolver`]; tests plug in stubs.
pub trait DnsLookup {
    /// Raw MX answers for `domain`, in any order.
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, DnsFailure>;

    /// Number of address records of `family` for `domain`.
    fn lookup_addresses(&self, domain: &str, family: AddressFamily)
    -> Result<usize, DnsFailure>;
}

impl DnsLookup for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, DnsFailure> {
        let lookup = Resolver::mx_lookup(self, fqdn(domain).as_str())
            .map_err(|err| DnsFailure::from_resolve(&err))?;
        Ok(lookup
            .iter()
            .map(|mx| MxRecord::new(mx.preference(), normalize_exchange(&mx.exchange().to_utf8())))
            .collect())
    }

    fn lookup_addresses(
        &self,
        domain: &str,
        family: AddressFamily,
    ) -> Result<usize, DnsFailure> {
        let record_type = match family {
            AddressFamily::Ipv4 => RecordType::A,
            AddressFamily::Ipv6 => RecordType::AAAA,
        };
        let lookup = Resolver::lookup(self, fqdn(domain).as_str(), record_type)
            .map_err(|err| DnsFailure::from_resolve(&err))?;
        Ok(lookup.iter().count())
    }
}

/// Absolute name, so the resolver search list is never appended.
fn fqdn(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('.');
    format!("{trimmed}.")
}

/// Builds a blocking trust-dns resolver bounded by `options.timeout`, one
/// attempt per query.
pub fn build_resolver(options: &DnsOptions) -> Result<Resolver, MxError> {
    let (config, mut opts) = if options.nameservers.is_empty() {
        trust_dns_resolver::system_conf::read_system_conf()
            .map_err(MxError::resolver_init)?
    } else {
        let group = NameServerConfigGroup::from_ips_clear(&options.nameservers, 53, true);
        (
            ResolverConfig::from_parts(None, Vec::new(), group),
            ResolverOpts::default(),
        )
    };
    opts.timeout = options.timeout;
    opts.attempts = 1;
    Resolver::new(config, opts).map_err(MxError::resolver_init)
}

/// Domain existence and MX resolution with a per-instance memo of MX answers.
///
/// The cache maps a domain to its last MX outcome, including "absent", and is
/// never evicted. Lookups do not hold the lock while querying, so two threads
/// racing on the same domain may both query; both store the same value.
pub struct DomainResolver<L = Resolver> {
    lookup: L,
    cache_enabled: bool,
    cache: Mutex<HashMap<String, Option<MxRecordSet>>>,
}

impl DomainResolver<Resolver> {
    pub fn from_options(options: &DnsOptions) -> Result<Self, MxError> {
        let resolver = build_resolver(options)?;
        Ok(Self::new(resolver, options.cache_enabled))
    }
}

impl<L: DnsLookup> DomainResolver<L> {
    pub fn new(lookup: L, cache_enabled: bool) -> Self {
        Self {
            lookup,
            cache_enabled,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// `Ok` when `domain` has an A record, or an AAAA record if the A query
    /// came back empty. Any other failure is returned as-is.
    pub fn check_domain(&self, domain: &str) -> Result<(), DnsFailure> {
        let result = match self.lookup.lookup_addresses(domain, AddressFamily::Ipv4) {
            Ok(count) if count > 0 => Ok(()),
            Ok(_) | Err(DnsFailure::NoAnswer) => {
                debug!(domain, "no A records, trying AAAA");
                match self.lookup.lookup_addresses(domain, AddressFamily::Ipv6) {
                    Ok(count) if count > 0 => Ok(()),
                    Ok(_) => Err(DnsFailure::NoAnswer),
                    Err(failure) => Err(failure),
                }
            }
            Err(failure) => Err(failure),
        };

        match &result {
            Ok(()) => debug!(domain, "domain has address records"),
            Err(DnsFailure::NxDomain) => warn!(domain, "domain does not exist"),
            Err(DnsFailure::NoAnswer) => warn!(domain, "domain has no A/AAAA records"),
            Err(failure) => error!(domain, %failure, "DNS error while checking domain existence"),
        }
        result
    }

    pub fn domain_exists(&self, domain: &str) -> bool {
        self.check_domain(domain).is_ok()
    }

    /// Uncached MX query. An answer with no routable exchange is `NoAnswer`.
    pub fn resolve_mx(&self, domain: &str) -> Result<MxRecordSet, DnsFailure> {
        debug!(domain, "querying MX records");
        let records = self.lookup.lookup_mx(domain)?;
        MxRecordSet::from_records(records).ok_or(DnsFailure::NoAnswer)
    }

    /// MX hostnames for `domain`, most preferred first, or `None` when the
    /// domain has no mail route. Served from the cache when enabled.
    pub fn mx_records(&self, domain: &str) -> Option<MxRecordSet> {
        let key = cache_key(domain);
        if self.cache_enabled {
            if let Some(cached) = self.cache.lock().get(&key) {
                debug!(domain, "using cached MX records");
                return cached.clone();
            }
        }

        let outcome = match self.resolve_mx(domain) {
            Ok(set) => {
                info!(domain, hosts = ?set.hostnames(), "found {} MX record(s)", set.len());
                Some(set)
            }
            Err(failure @ (DnsFailure::NoAnswer | DnsFailure::NxDomain)) => {
                warn!(domain, %failure, "no MX records");
                None
            }
            Err(failure) => {
                error!(domain, %failure, "DNS error while querying MX records");
                None
            }
        };

        if self.cache_enabled {
            self.cache.lock().insert(key, outcome.clone());
        }
        outcome
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
        debug!("MX cache cleared");
    }

    pub fn cache_size(&self) -> usize {
        self.cache.lock().len()
    }
}

fn cache_key(domain: &str) -> String {
    domain.trim().to_ascii_lowercase()
}
