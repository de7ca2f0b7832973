//! Domain existence and MX resolution.
//!
//! [`DomainResolver`] owns its MX cache; build one per verification session
//! (or share it behind a reference across threads). DNS failures are
//! classified into [`DnsFailure`] and never escape as errors from the boolean
//! and optional entry points.

mod error;
mod options;
mod resolver;
mod types;

pub use error::{DnsFailure, MxError};
pub use options::DnsOptions;
pub use resolver::{DnsLookup, DomainResolver, build_resolver};
pub use types::{AddressFamily, MxRecord, MxRecordSet};

#[cfg(test)]
pub(crate) mod tests;
