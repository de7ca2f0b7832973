use std::time::Duration;

/// Connection and envelope settings for [`SmtpProber`](super::SmtpProber).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProbeOptions {
    pub port: u16,
    /// Applied to the TCP connect and to every read and write.
    pub timeout: Duration,
    /// Envelope sender used in `MAIL FROM`.
    pub mail_from: String,
    /// Name announced in `EHLO`/`HELO`.
    pub helo_name: String,
}

impl Default for SmtpProbeOptions {
    fn default() -> Self {
        Self {
            port: 25,
            timeout: Duration::from_secs(10),
            mail_from: "verify@example.com".to_string(),
            helo_name: "localhost".to_string(),
        }
    }
}
