use std::fmt;

#[cfg(feature = "with-serde")]
use serde::Serialize;

/// Where the pipeline stopped for an address.
#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    InvalidFormat,
    DomainNotFound,
    NoMxRecords,
    Valid,
    SmtpRejected,
    SmtpUnavailable,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::DomainNotFound => "domain_not_found",
            Self::NoMxRecords => "no_mx_records",
            Self::Valid => "valid",
            Self::SmtpRejected => "smtp_rejected",
            Self::SmtpUnavailable => "smtp_unavailable",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SmtpStatus {
    Verified,
    Rejected,
    Unavailable,
    #[default]
    NotChecked,
}

impl SmtpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Unavailable => "unavailable",
            Self::NotChecked => "not checked",
        }
    }
}

impl fmt::Display for SmtpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse three-way domain classification shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainStatus {
    Valid,
    Absent,
    MxMissing,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "domain valid",
            Self::Absent => "domain absent",
            Self::MxMissing => "MX records absent or invalid",
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of verifying one address. Built once by the pipeline and then
/// only read.
#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub email: String,
    pub status: VerificationStatus,
    pub smtp_status: SmtpStatus,
    pub domain: Option<String>,
    pub mx_records: Option<Vec<String>>,
    pub smtp_response: Option<String>,
    pub error_message: Option<String>,
}

impl VerificationResult {
    pub(crate) fn new(email: impl Into<String>, status: VerificationStatus) -> Self {
        Self {
            email: email.into(),
            status,
            smtp_status: SmtpStatus::NotChecked,
            domain: None,
            mx_records: None,
            smtp_response: None,
            error_message: None,
        }
    }

    /// Rejected and unavailable SMTP outcomes still count as a valid domain;
    /// only the SMTP axis tells them apart.
    pub fn domain_status(&self) -> DomainStatus {
        match self.status {
            VerificationStatus::InvalidFormat | VerificationStatus::DomainNotFound => {
                DomainStatus::Absent
            }
            VerificationStatus::NoMxRecords => DomainStatus::MxMissing,
            VerificationStatus::Valid
            | VerificationStatus::SmtpRejected
            | VerificationStatus::SmtpUnavailable => DomainStatus::Valid,
        }
    }

    pub fn smtp_status_text(&self) -> &'static str {
        self.smtp_status.as_str()
    }
}
