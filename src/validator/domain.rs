use super::types::{FormatError, LabelIssue};

/// Validates the (lower-cased) domain: overall length then each label.
pub(crate) fn check_domain(domain: &str) -> Result<(), FormatError> {
    if domain.is_empty() {
        return Err(FormatError::EmptyDomain);
    }
    if domain.len() > 253 {
        return Err(FormatError::DomainTooLong(domain.len()));
    }

    for label in domain.split('.') {
        if let Some(issue) = label_issue(label) {
            return Err(FormatError::InvalidLabel {
                label: label.to_string(),
                issue,
            });
        }
    }
    Ok(())
}

fn label_issue(label: &str) -> Option<LabelIssue> {
    if label.is_empty() {
        return Some(LabelIssue::Empty);
    }
    if label.len() > 63 {
        return Some(LabelIssue::TooLong);
    }
    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Some(LabelIssue::InvalidChars);
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Some(LabelIssue::HyphenEdge);
    }
    None
}
