use std::io;

use thiserror::Error;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;

/// Why a DNS query produced no usable answer.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsFailure {
    #[error("DNS query timed out")]
    Timeout,
    #[error("domain does not exist (NXDOMAIN)")]
    NxDomain,
    #[error("no records in DNS response")]
    NoAnswer,
    #[error("DNS error: {message}")]
    Other { message: String },
}

impl DnsFailure {
    pub(crate) fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    pub(crate) fn from_resolve(err: &ResolveError) -> Self {
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. }
                if *response_code == ResponseCode::NXDomain =>
            {
                Self::NxDomain
            }
            ResolveErrorKind::NoRecordsFound { .. } => Self::NoAnswer,
            ResolveErrorKind::Timeout => Self::Timeout,
            _ => Self::other(err.to_string()),
        }
    }
}

/// Errors raised while building the system resolver.
#[derive(Debug, Error)]
pub enum MxError {
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: io::Error,
    },
}

impl MxError {
    pub(crate) fn resolver_init(source: io::Error) -> Self {
        Self::ResolverInit { source }
    }
}
