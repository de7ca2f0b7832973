//! Address syntax checks. Pure functions, no I/O.
//!
//! The accepted grammar is a simplified RFC 5322 subset: a local part made of
//! ASCII atext and dots, exactly one `@`, and a domain of dot-separated
//! alphanumeric/hyphen labels. Length limits follow RFC 5321 (254 total,
//! 64 local) and RFC 1035 (253 domain, 63 per label).

mod domain;
mod local;
mod types;

pub use types::{EmailAddress, FormatError, LabelIssue};

use domain::check_domain;
use local::check_local;

impl EmailAddress {
    /// Validates `email` and returns the parsed address, or the first rule it
    /// breaks. Surrounding whitespace is ignored; the domain is lower-cased.
    pub fn parse(email: &str) -> Result<Self, FormatError> {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(FormatError::Empty);
        }

        let lowered = trimmed.to_lowercase();
        if lowered.len() > 254 {
            return Err(FormatError::TooLong(lowered.len()));
        }

        let (local, domain) = match trimmed.matches('@').count() {
            0 => return Err(FormatError::MissingAt),
            1 => trimmed.split_once('@').ok_or(FormatError::MissingAt)?,
            _ => return Err(FormatError::MultipleAt),
        };

        check_local(local)?;
        let domain = domain.to_lowercase();
        check_domain(&domain)?;

        Ok(Self {
            raw: email.to_string(),
            local_part: local.to_string(),
            domain,
        })
    }
}

/// `true` when `email` is syntactically acceptable.
pub fn validate_format(email: &str) -> bool {
    EmailAddress::parse(email).is_ok()
}

/// Everything after the last `@`, trimmed and lower-cased. `None` only when
/// there is no `@` at all; the result is not validated.
pub fn extract_domain(email: &str) -> Option<String> {
    let lowered = email.trim().to_lowercase();
    match lowered.rsplit_once('@') {
        Some((_, domain)) => Some(domain.to_string()),
        None => {
            tracing::debug!(email, "no '@' in address, cannot extract domain");
            None
        }
    }
}

/// Validates then extracts; the domain is only returned for valid input.
pub fn validate_and_extract(email: &str) -> (bool, Option<String>) {
    match EmailAddress::parse(email) {
        Ok(address) => (true, Some(address.domain)),
        Err(_) => (false, None),
    }
}
