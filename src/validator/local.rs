use once_cell::sync::Lazy;
use regex::Regex;

use super::types::FormatError;

/// atext ASCII plus '.', matched on the local part after Unicode lower-casing,
/// the same folding the domain gets.
static LOCAL_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+$")
        .expect("local part pattern failed to compile. This is a bug.")
});

pub(crate) fn check_local(local: &str) -> Result<(), FormatError> {
    if local.is_empty() {
        return Err(FormatError::EmptyLocalPart);
    }
    if local.len() > 64 {
        return Err(FormatError::LocalPartTooLong(local.len()));
    }
    if !LOCAL_PART.is_match(&local.to_lowercase()) {
        return Err(FormatError::InvalidLocalPart);
    }
    Ok(())
}
