//! SMTP handshake probing.
//!
//! [`SmtpProber`] runs a minimal dialogue (greeting, `EHLO`/`HELO`,
//! `MAIL FROM`, `RCPT TO`, `QUIT`) against one host and classifies the
//! recipient reply into an [`SmtpOutcome`]. [`verify_with_fallback`] walks an
//! MX host list in priority order and stops at the first definitive answer.

mod fallback;
mod options;
mod probe;
mod session;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use fallback::{FallbackReport, FallbackVerdict, HostAttempt, verify_with_fallback};
pub use options::SmtpProbeOptions;
pub use probe::{MailProbe, SmtpProber};
pub use types::{ProbeFailure, ProbeStage, SmtpOutcome, SmtpReply, TransportErrorKind};
