//! The end-to-end pipeline: syntax, domain existence, MX lookup, then the
//! SMTP fallback walk. Every failure ends up as data on the
//! [`VerificationResult`].

mod batch;
mod types;

pub use batch::{BatchReport, CancelToken};
pub use types::{DomainStatus, SmtpStatus, VerificationResult, VerificationStatus};

use tracing::{info, warn};
use trust_dns_resolver::Resolver;

use crate::config::VerifierConfig;
use crate::mx::{DnsLookup, DomainResolver, MxError};
use crate::smtp_verify::{FallbackVerdict, MailProbe, SmtpProber, verify_with_fallback};
use crate::validator::EmailAddress;

/// Runs the pipeline with a shared MX cache.
///
/// The default blocking trust-dns [`Resolver`] drives every query through one
/// internal runtime behind a mutex, so with parallel batches DNS lookups still
/// run one at a time; only the SMTP dialogues overlap.
pub struct Verifier<L = Resolver, P = SmtpProber> {
    resolver: DomainResolver<L>,
    prober: P,
}

impl Verifier {
    /// Live verifier: trust-dns for DNS, plain TCP for SMTP.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, MxError> {
        let resolver = DomainResolver::from_options(&config.dns)?;
        Ok(Self::new(resolver, SmtpProber::new(config.smtp.clone())))
    }
}

impl<L: DnsLookup, P: MailProbe> Verifier<L, P> {
    pub fn new(resolver: DomainResolver<L>, prober: P) -> Self {
        Self { resolver, prober }
    }

    pub fn resolver(&self) -> &DomainResolver<L> {
        &self.resolver
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub fn verify(&self, email: &str) -> VerificationResult {
        info!(email, "starting verification");

        let address = match EmailAddress::parse(email) {
            Ok(address) => address,
            Err(reason) => {
                warn!(email, %reason, "invalid email format");
                let mut result = VerificationResult::new(email, VerificationStatus::InvalidFormat);
                result.error_message = Some(format!("Email format is invalid: {reason}"));
                return result;
            }
        };
        let domain = address.domain();

        if let Err(failure) = self.resolver.check_domain(domain) {
            warn!(email, domain, %failure, "domain does not exist");
            let mut result = VerificationResult::new(email, VerificationStatus::DomainNotFound);
            result.domain = Some(domain.to_string());
            result.error_message = Some(format!("Domain does not exist in DNS: {failure}"));
            return result;
        }

        let Some(mx) = self.resolver.mx_records(domain) else {
            warn!(email, domain, "no MX records found for domain");
            let mut result = VerificationResult::new(email, VerificationStatus::NoMxRecords);
            result.domain = Some(domain.to_string());
            result.error_message = Some("No MX records found for domain".to_string());
            return result;
        };
        let hosts = mx.hostnames();

        let report = verify_with_fallback(&self.prober, &address, &hosts);
        let (status, smtp_status) = match &report.verdict {
            FallbackVerdict::Accepted { .. } => (VerificationStatus::Valid, SmtpStatus::Verified),
            FallbackVerdict::Rejected { .. } => {
                (VerificationStatus::SmtpRejected, SmtpStatus::Rejected)
            }
            FallbackVerdict::NoHosts | FallbackVerdict::Exhausted { .. } => {
                (VerificationStatus::SmtpUnavailable, SmtpStatus::Unavailable)
            }
        };

        let mut result = VerificationResult::new(email, status);
        result.smtp_status = smtp_status;
        result.domain = Some(domain.to_string());
        result.mx_records = Some(hosts);
        result.smtp_response = report.response_text();
        result.error_message = report.error_text();

        match result.error_message.as_deref() {
            None => info!(email, "email verification successful"),
            Some(error) => warn!(email, error, "email verification failed"),
        }
        result
    }
}
