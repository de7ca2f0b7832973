use std::fmt;

use thiserror::Error;

/// Why a single domain label was refused.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelIssue {
    Empty,
    TooLong,
    HyphenEdge,
    InvalidChars,
}

impl fmt::Display for LabelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty label"),
            Self::TooLong => f.write_str("label longer than 63 characters"),
            Self::HyphenEdge => f.write_str("label cannot start/end with '-'"),
            Self::InvalidChars => f.write_str("label has invalid characters"),
        }
    }
}

/// First syntax rule an address violates. Detected before any network I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("address is empty")]
    Empty,
    #[error("total length {0} > 254")]
    TooLong(usize),
    #[error("must contain an '@'")]
    MissingAt,
    #[error("must contain exactly one '@'")]
    MultipleAt,
    #[error("local part is empty")]
    EmptyLocalPart,
    #[error("local part length {0} > 64")]
    LocalPartTooLong(usize),
    #[error("local part has invalid characters")]
    InvalidLocalPart,
    #[error("domain is empty")]
    EmptyDomain,
    #[error("domain length {0} > 253")]
    DomainTooLong(usize),
    #[error("domain label '{label}': {issue}")]
    InvalidLabel { label: String, issue: LabelIssue },
}

/// A syntactically valid address. Only [`EmailAddress::parse`] builds one.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    pub(crate) raw: String,
    pub(crate) local_part: String,
    pub(crate) domain: String,
}

impl EmailAddress {
    /// The string exactly as the caller supplied it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Local part, trimmed, case preserved.
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// Lower-cased domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `local@domain`, the form used in `RCPT TO`.
    pub fn address(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}
