use std::io::{Read, Write};

use tracing::{debug, error, info, warn};

use super::options::SmtpProbeOptions;
use super::session::SmtpSession;
use super::types::{ProbeFailure, ProbeStage, SmtpOutcome};
use crate::validator::EmailAddress;

/// Probes one mail host for one recipient.
pub trait MailProbe {
    fn probe(&self, email: &EmailAddress, host: &str) -> SmtpOutcome;
}

impl<P: MailProbe + ?Sized> MailProbe for &P {
    fn probe(&self, email: &EmailAddress, host: &str) -> SmtpOutcome {
        (**self).probe(email, host)
    }
}

/// Live prober speaking plain SMTP over TCP. Stops after `RCPT TO`; no data
/// is ever sent.
#[derive(Debug, Clone, Default)]
pub struct SmtpProber {
    options: SmtpProbeOptions,
}

impl SmtpProber {
    pub fn new(options: SmtpProbeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SmtpProbeOptions {
        &self.options
    }

    fn converse<S: Read + Write>(
        &self,
        session: &mut SmtpSession<S>,
        email: &EmailAddress,
    ) -> Result<SmtpOutcome, ProbeFailure> {
        let greeting = session.read_reply(ProbeStage::Greeting)?;
        if !greeting.is_positive_completion() {
            return Err(ProbeFailure::protocol(
                session.host(),
                ProbeStage::Greeting,
                greeting,
            ));
        }

        self.hello(session)?;

        let mail_from = format!("MAIL FROM:<{}>", self.options.mail_from);
        let reply = session.command(&mail_from, ProbeStage::MailFrom)?;
        if reply.code != 250 {
            return Err(ProbeFailure::protocol(
                session.host(),
                ProbeStage::MailFrom,
                reply,
            ));
        }

        let rcpt_to = format!("RCPT TO:<{}>", email.address());
        let reply = session.command(&rcpt_to, ProbeStage::RcptTo)?;
        Ok(match reply.code {
            250 => SmtpOutcome::Accepted { reply },
            550 => SmtpOutcome::Rejected { reply },
            _ => SmtpOutcome::Unavailable {
                reason: ProbeFailure::protocol(session.host(), ProbeStage::RcptTo, reply),
            },
        })
    }

    /// `EHLO`, falling back to `HELO` for servers that refuse it.
    fn hello<S: Read + Write>(&self, session: &mut SmtpSession<S>) -> Result<(), ProbeFailure> {
        let helo_name = &self.options.helo_name;
        let ehlo = session.command(&format!("EHLO {helo_name}"), ProbeStage::Hello)?;
        if ehlo.code == 250 {
            return Ok(());
        }
        debug!(host = session.host(), code = ehlo.code, "EHLO refused, trying HELO");
        let helo = session.command(&format!("HELO {helo_name}"), ProbeStage::Hello)?;
        if helo.code == 250 {
            Ok(())
        } else {
            Err(ProbeFailure::protocol(session.host(), ProbeStage::Hello, helo))
        }
    }

    /// Drives an open session up to `RCPT TO`, always ends it with `QUIT`,
    /// and logs the outcome.
    pub(crate) fn run_session<S: Read + Write>(
        &self,
        mut session: SmtpSession<S>,
        email: &EmailAddress,
    ) -> SmtpOutcome {
        let host_name = session.host().to_string();
        let host = host_name.as_str();
        let outcome = self
            .converse(&mut session, email)
            .unwrap_or_else(|reason| SmtpOutcome::Unavailable { reason });

        match session.quit() {
            Ok(_) => debug!(host, "SMTP connection closed"),
            Err(err) => debug!(host, error = %err, "error closing SMTP connection"),
        }

        match &outcome {
            SmtpOutcome::Accepted { reply } => {
                info!(host, email = %email, %reply, "recipient accepted")
            }
            SmtpOutcome::Rejected { reply } => {
                warn!(host, email = %email, %reply, "recipient rejected")
            }
            SmtpOutcome::Unavailable {
                reason: reason @ ProbeFailure::Protocol { .. },
            } => warn!(host, email = %email, %reason, "SMTP verification inconclusive"),
            SmtpOutcome::Unavailable { reason } => {
                error!(host, email = %email, %reason, "SMTP verification failed")
            }
        }
        outcome
    }
}

impl MailProbe for SmtpProber {
    fn probe(&self, email: &EmailAddress, host: &str) -> SmtpOutcome {
        debug!(host, port = self.options.port, "connecting to SMTP server");
        match SmtpSession::connect(host, self.options.port, self.options.timeout) {
            Ok(session) => self.run_session(session, email),
            Err(reason) => {
                error!(host, %reason, "SMTP connection failed");
                SmtpOutcome::Unavailable { reason }
            }
        }
    }
}
