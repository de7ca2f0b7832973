use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

use super::{
    AddressFamily, DnsFailure, DnsLookup, DnsOptions, DomainResolver, MxError, MxRecord,
    MxRecordSet, build_resolver,
};

type MxResult = Result<Vec<MxRecord>, DnsFailure>;
type AddrResult = Result<usize, DnsFailure>;
type MxFn = dyn Fn(&str) -> MxResult + Send + Sync;
type AddrFn = dyn Fn(&str, AddressFamily) -> AddrResult + Send + Sync;

pub(crate) struct StubResolver {
    pub on_mx: Box<MxFn>,
    pub on_addresses: Box<AddrFn>,
    mx_queries: AtomicUsize,
    address_queries: Mutex<Vec<(String, AddressFamily)>>,
}

impl StubResolver {
    pub(crate) fn new<M, A>(on_mx: M, on_addresses: A) -> Self
    where
        M: Fn(&str) -> MxResult + Send + Sync + 'static,
        A: Fn(&str, AddressFamily) -> AddrResult + Send + Sync + 'static,
    {
        Self {
            on_mx: Box::new(on_mx),
            on_addresses: Box::new(on_addresses),
            mx_queries: AtomicUsize::new(0),
            address_queries: Mutex::new(Vec::new()),
        }
    }

    /// Every domain has one A record and the given MX answer.
    pub(crate) fn with_mx<M>(on_mx: M) -> Self
    where
        M: Fn(&str) -> MxResult + Send + Sync + 'static,
    {
        Self::new(on_mx, |_, _| Ok(1))
    }

    pub(crate) fn mx_queries(&self) -> usize {
        self.mx_queries.load(Ordering::SeqCst)
    }

    pub(crate) fn address_queries(&self) -> Vec<(String, AddressFamily)> {
        self.address_queries.lock().expect("lock").clone()
    }
}

impl DnsLookup for StubResolver {
    fn lookup_mx(&self, domain: &str) -> MxResult {
        self.mx_queries.fetch_add(1, Ordering::SeqCst);
        (self.on_mx)(domain)
    }

    fn lookup_addresses(&self, domain: &str, family: AddressFamily) -> AddrResult {
        self.address_queries
            .lock()
            .expect("lock")
            .push((domain.to_string(), family));
        (self.on_addresses)(domain, family)
    }
}

#[test]
fn record_set_sorts_dedups_and_trims() {
    let set = MxRecordSet::from_records(vec![
        MxRecord::new(20, "mx2.example.com."),
        MxRecord::new(10, "MX1.example.com."),
        MxRecord::new(10, "mx1.example.com"),
        MxRecord::new(30, "mx3.example.com"),
    ])
    .expect("records");

    assert_eq!(set.len(), 3);
    assert_eq!(
        set.hostnames(),
        vec!["mx1.example.com", "mx2.example.com", "mx3.example.com"]
    );
    assert_eq!(set.records()[0].preference, 10);
    assert_eq!(set.records()[2].preference, 30);
}

#[test]
fn record_set_drops_null_mx() {
    assert!(MxRecordSet::from_records(vec![MxRecord::new(0, ".")]).is_none());
    assert!(MxRecordSet::from_records(Vec::new()).is_none());
}

#[test]
fn resolve_mx_reports_empty_answer_as_no_answer() {
    let resolver = DomainResolver::new(StubResolver::with_mx(|_| Ok(Vec::new())), true);
    assert_eq!(resolver.resolve_mx("example.com"), Err(DnsFailure::NoAnswer));
}

#[test]
fn mx_records_are_ordered_by_preference() {
    let stub = StubResolver::with_mx(|domain| {
        assert_eq!(domain, "example.com");
        Ok(vec![
            MxRecord::new(50, "backup.example.com."),
            MxRecord::new(5, "primary.example.com."),
        ])
    });
    let resolver = DomainResolver::new(stub, false);
    let set = resolver.mx_records("example.com").expect("records");
    assert_eq!(
        set.hostnames(),
        vec!["primary.example.com", "backup.example.com"]
    );
}

#[test]
fn cache_serves_second_lookup_without_query() {
    let stub = StubResolver::with_mx(|_| Ok(vec![MxRecord::new(10, "mx.example.com.")]));
    let resolver = DomainResolver::new(stub, true);

    let first = resolver.mx_records("example.com");
    let second = resolver.mx_records("example.com");

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(resolver.lookup().mx_queries(), 1);
    assert_eq!(resolver.cache_size(), 1);
}

#[test]
fn cache_remembers_absent_outcome() {
    let resolver = DomainResolver::new(
        StubResolver::with_mx(|_| Err(DnsFailure::NxDomain)),
        true,
    );

    assert_eq!(resolver.mx_records("missing.test"), None);
    assert_eq!(resolver.mx_records("missing.test"), None);
    assert_eq!(resolver.lookup().mx_queries(), 1);
    assert_eq!(resolver.cache_size(), 1);
}

#[test]
fn clear_cache_forces_new_query() {
    let resolver = DomainResolver::new(
        StubResolver::with_mx(|_| Ok(vec![MxRecord::new(1, "mx.example.com")])),
        true,
    );
    resolver.mx_records("example.com");
    resolver.clear_cache();
    assert_eq!(resolver.cache_size(), 0);
    resolver.mx_records("example.com");
    assert_eq!(resolver.lookup().mx_queries(), 2);
}

#[test]
fn disabled_cache_queries_every_time() {
    let resolver = DomainResolver::new(
        StubResolver::with_mx(|_| Ok(vec![MxRecord::new(1, "mx.example.com")])),
        false,
    );
    resolver.mx_records("example.com");
    resolver.mx_records("example.com");
    assert_eq!(resolver.lookup().mx_queries(), 2);
    assert_eq!(resolver.cache_size(), 0);
}

#[test]
fn dns_errors_become_absent() {
    let resolver = DomainResolver::new(
        StubResolver::with_mx(|_| Err(DnsFailure::Timeout)),
        true,
    );
    assert_eq!(resolver.mx_records("slow.test"), None);
}

#[test]
fn a_record_is_enough() {
    let resolver = DomainResolver::new(StubResolver::new(|_| Ok(Vec::new()), |_, _| Ok(2)), true);
    assert!(resolver.domain_exists("example.com"));
    assert_eq!(
        resolver.lookup().address_queries(),
        vec![("example.com".to_string(), AddressFamily::Ipv4)]
    );
}

#[test]
fn aaaa_is_tried_when_a_has_no_answer() {
    let stub = StubResolver::new(
        |_| Ok(Vec::new()),
        |_, family| match family {
            AddressFamily::Ipv4 => Err(DnsFailure::NoAnswer),
            AddressFamily::Ipv6 => Ok(1),
        },
    );
    let resolver = DomainResolver::new(stub, true);
    assert_eq!(resolver.check_domain("v6only.test"), Ok(()));
    assert_eq!(resolver.lookup().address_queries().len(), 2);
}

#[test]
fn nxdomain_stops_the_existence_check() {
    let resolver = DomainResolver::new(
        StubResolver::new(|_| Ok(Vec::new()), |_, _| Err(DnsFailure::NxDomain)),
        true,
    );
    assert_eq!(
        resolver.check_domain("nonexistent-domain-xyz123.test"),
        Err(DnsFailure::NxDomain)
    );
    assert!(!resolver.domain_exists("nonexistent-domain-xyz123.test"));
    assert_eq!(resolver.lookup().address_queries().len(), 2);
}

#[test]
fn no_answer_from_both_families_is_absent() {
    let resolver = DomainResolver::new(
        StubResolver::new(|_| Ok(Vec::new()), |_, _| Ok(0)),
        true,
    );
    assert_eq!(resolver.check_domain("empty.test"), Err(DnsFailure::NoAnswer));
}

#[test]
fn timeout_is_reported_as_timeout() {
    let resolver = DomainResolver::new(
        StubResolver::new(|_| Ok(Vec::new()), |_, _| Err(DnsFailure::Timeout)),
        true,
    );
    assert_eq!(resolver.check_domain("slow.test"), Err(DnsFailure::Timeout));
}

#[test]
fn resolve_errors_are_classified() {
    let timeout = ResolveError::from(ResolveErrorKind::Timeout);
    assert_eq!(DnsFailure::from_resolve(&timeout), DnsFailure::Timeout);

    let other = ResolveError::from("no connections available");
    assert!(matches!(
        DnsFailure::from_resolve(&other),
        DnsFailure::Other { .. }
    ));
}

#[test]
fn explicit_nameservers_build_a_resolver() {
    let options = DnsOptions {
        timeout: Duration::from_secs(1),
        nameservers: vec![IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))],
        cache_enabled: true,
    };
    assert!(build_resolver(&options).is_ok());
}

#[test]
fn resolver_init_keeps_the_io_error() {
    let err = MxError::resolver_init(io::Error::new(io::ErrorKind::NotFound, "no resolv.conf"));
    let MxError::ResolverInit { source } = &err;
    assert_eq!(source.kind(), io::ErrorKind::NotFound);
    assert_eq!(err.to_string(), "resolver initialization failed: no resolv.conf");
}
