#![forbid(unsafe_code)]
//! mailprobe_lib: email deliverability probing without sending mail.
//!
//! The pipeline checks syntax ([`validator`]), domain existence and MX records
//! ([`mx`]), then walks the MX hosts with a live SMTP handshake
//! ([`smtp_verify`]). [`Verifier`] ties the steps together and records every
//! outcome, including failures, on a [`VerificationResult`].

pub mod config;
pub mod mx;
pub mod smtp_verify;
pub mod validator;
pub mod verification;

pub use config::{ConfigError, VerifierConfig};
#[cfg(feature = "with-serde")]
pub use config::ConfigFile;
pub use mx::{DnsFailure, DnsLookup, DnsOptions, DomainResolver, MxError, MxRecord, MxRecordSet};
pub use smtp_verify::{
    FallbackReport, FallbackVerdict, MailProbe, ProbeFailure, SmtpOutcome, SmtpProbeOptions,
    SmtpProber, SmtpReply, verify_with_fallback,
};
pub use validator::{
    EmailAddress, FormatError, extract_domain, validate_and_extract, validate_format,
};
pub use verification::{
    BatchReport, CancelToken, DomainStatus, SmtpStatus, VerificationResult, VerificationStatus,
    Verifier,
};
