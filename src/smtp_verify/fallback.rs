use tracing::{error, info};

use super::probe::MailProbe;
use super::types::{ProbeFailure, SmtpOutcome, SmtpReply, rejection_text};
use crate::validator::EmailAddress;

/// One host probed during a fallback run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAttempt {
    pub host: String,
    pub outcome: SmtpOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackVerdict {
    /// The host list was empty; nothing was probed.
    NoHosts,
    Accepted { host: String, reply: SmtpReply },
    /// A 550 from one host is final for the whole domain.
    Rejected { host: String, reply: SmtpReply },
    /// Every host was unavailable. `last_reply` is the most recent reply any
    /// host sent, `last_failure` the failure of the final host.
    Exhausted {
        hosts_tried: usize,
        last_reply: Option<SmtpReply>,
        last_failure: ProbeFailure,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackReport {
    pub verdict: FallbackVerdict,
    pub attempts: Vec<HostAttempt>,
}

impl FallbackReport {
    pub fn accepted(&self) -> bool {
        matches!(self.verdict, FallbackVerdict::Accepted { .. })
    }

    pub fn rejected(&self) -> bool {
        matches!(self.verdict, FallbackVerdict::Rejected { .. })
    }

    pub fn reply(&self) -> Option<&SmtpReply> {
        match &self.verdict {
            FallbackVerdict::NoHosts => None,
            FallbackVerdict::Accepted { reply, .. } | FallbackVerdict::Rejected { reply, .. } => {
                Some(reply)
            }
            FallbackVerdict::Exhausted { last_reply, .. } => last_reply.as_ref(),
        }
    }

    pub fn response_text(&self) -> Option<String> {
        self.reply().map(ToString::to_string)
    }

    pub fn error_text(&self) -> Option<String> {
        match &self.verdict {
            FallbackVerdict::NoHosts => Some("No MX hosts provided".to_string()),
            FallbackVerdict::Accepted { .. } => None,
            FallbackVerdict::Rejected { reply, .. } => Some(rejection_text(reply)),
            FallbackVerdict::Exhausted {
                hosts_tried,
                last_failure,
                ..
            } => Some(exhausted_text(*hosts_tried, last_failure)),
        }
    }
}

fn exhausted_text(hosts_tried: usize, last_failure: &ProbeFailure) -> String {
    format!(
        "SMTP verification failed on all {hosts_tried} MX host(s). Last error: {last_failure}"
    )
}

/// Probes `hosts` in order until one gives a definitive answer.
///
/// Acceptance and 550 rejection both stop the walk; anything else moves on to
/// the next host. Hosts are never retried.
pub fn verify_with_fallback<P, H>(prober: &P, email: &EmailAddress, hosts: &[H]) -> FallbackReport
where
    P: MailProbe + ?Sized,
    H: AsRef<str>,
{
    let mut attempts = Vec::with_capacity(hosts.len());
    let mut last_reply = None;
    let mut last_failure = None;

    for host in hosts {
        let host = host.as_ref();
        info!(host, email = %email, "attempting SMTP verification");
        let outcome = prober.probe(email, host);
        attempts.push(HostAttempt {
            host: host.to_string(),
            outcome: outcome.clone(),
        });

        match outcome {
            SmtpOutcome::Accepted { reply } => {
                return FallbackReport {
                    verdict: FallbackVerdict::Accepted {
                        host: host.to_string(),
                        reply,
                    },
                    attempts,
                };
            }
            SmtpOutcome::Rejected { reply } => {
                return FallbackReport {
                    verdict: FallbackVerdict::Rejected {
                        host: host.to_string(),
                        reply,
                    },
                    attempts,
                };
            }
            SmtpOutcome::Unavailable { reason } => {
                if let Some(reply) = reason.reply() {
                    last_reply = Some(reply.clone());
                }
                last_failure = Some(reason);
            }
        }
    }

    let verdict = match last_failure {
        None => FallbackVerdict::NoHosts,
        Some(last_failure) => {
            error!(
                email = %email,
                "{}",
                exhausted_text(attempts.len(), &last_failure)
            );
            FallbackVerdict::Exhausted {
                hosts_tried: attempts.len(),
                last_reply,
                last_failure,
            }
        }
    };
    FallbackReport { verdict, attempts }
}
