use std::fmt;
use std::io;

use thiserror::Error;

/// A raw SMTP reply. Multi-line replies keep one line of text per `\n`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub message: String,
}

impl SmtpReply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// `"<code> <text>"`, the form shown to users and stored on results.
impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} {}", self.code, self.message)
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Connect,
    Greeting,
    Hello,
    MailFrom,
    RcptTo,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Hello => "EHLO/HELO",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
        };
        f.write_str(label)
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Refused,
    HostResolution,
    Disconnected,
    MalformedReply,
    Io,
}

impl TransportErrorKind {
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            io::ErrorKind::ConnectionRefused => Self::Refused,
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Disconnected,
            io::ErrorKind::InvalidData => Self::MalformedReply,
            _ => Self::Io,
        }
    }
}

/// Why a host could not give a definitive answer.
///
/// `Transport` covers everything below the SMTP layer and never carries a
/// reply; `Protocol` is a well-formed reply that ends the dialogue early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("{}", describe_transport(.host, .kind, .detail))]
    Transport {
        host: String,
        stage: ProbeStage,
        kind: TransportErrorKind,
        detail: String,
    },
    #[error("{}", describe_protocol(.stage, .reply))]
    Protocol {
        host: String,
        stage: ProbeStage,
        reply: SmtpReply,
    },
}

impl ProbeFailure {
    pub fn transport(host: &str, stage: ProbeStage, err: &io::Error) -> Self {
        Self::Transport {
            host: host.to_string(),
            stage,
            kind: TransportErrorKind::from_io(err),
            detail: err.to_string(),
        }
    }

    pub fn host_resolution(host: &str, detail: impl Into<String>) -> Self {
        Self::Transport {
            host: host.to_string(),
            stage: ProbeStage::Connect,
            kind: TransportErrorKind::HostResolution,
            detail: detail.into(),
        }
    }

    pub fn protocol(host: &str, stage: ProbeStage, reply: SmtpReply) -> Self {
        Self::Protocol {
            host: host.to_string(),
            stage,
            reply,
        }
    }

    pub fn host(&self) -> &str {
        match self {
            Self::Transport { host, .. } | Self::Protocol { host, .. } => host,
        }
    }

    pub fn stage(&self) -> ProbeStage {
        match self {
            Self::Transport { stage, .. } | Self::Protocol { stage, .. } => *stage,
        }
    }

    /// The server reply behind a protocol failure; transport failures have none.
    pub fn reply(&self) -> Option<&SmtpReply> {
        match self {
            Self::Transport { .. } => None,
            Self::Protocol { reply, .. } => Some(reply),
        }
    }
}

fn describe_transport(host: &str, kind: &TransportErrorKind, detail: &str) -> String {
    match kind {
        TransportErrorKind::Timeout => format!("SMTP connection timeout to {host}"),
        TransportErrorKind::Refused => format!("SMTP connection refused by {host}"),
        TransportErrorKind::HostResolution => {
            format!("Failed to resolve SMTP host {host}: {detail}")
        }
        TransportErrorKind::Disconnected => {
            format!("SMTP server {host} disconnected: {detail}")
        }
        TransportErrorKind::MalformedReply => {
            format!("Malformed SMTP reply from {host}: {detail}")
        }
        TransportErrorKind::Io => format!("Network error connecting to {host}: {detail}"),
    }
}

fn describe_protocol(stage: &ProbeStage, reply: &SmtpReply) -> String {
    let text = &reply.message;
    let code = reply.code;
    match stage {
        ProbeStage::Greeting => format!("SMTP greeting refused with code {code}: {text}"),
        ProbeStage::Hello => format!("EHLO/HELO rejected with code {code}: {text}"),
        ProbeStage::MailFrom => format!("MAIL FROM rejected with code {code}: {text}"),
        ProbeStage::Connect | ProbeStage::RcptTo => {
            format!("Unexpected SMTP code {code}: {text}")
        }
    }
}

/// Result of one probe against one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpOutcome {
    /// `RCPT TO` answered 250.
    Accepted { reply: SmtpReply },
    /// `RCPT TO` answered 550.
    Rejected { reply: SmtpReply },
    Unavailable { reason: ProbeFailure },
}

impl SmtpOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn reply(&self) -> Option<&SmtpReply> {
        match self {
            Self::Accepted { reply } | Self::Rejected { reply } => Some(reply),
            Self::Unavailable { reason } => reason.reply(),
        }
    }

    /// Formatted reply, when the server answered at all.
    pub fn response_text(&self) -> Option<String> {
        self.reply().map(ToString::to_string)
    }

    pub fn error_text(&self) -> Option<String> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { reply } => Some(rejection_text(reply)),
            Self::Unavailable { reason } => Some(reason.to_string()),
        }
    }
}

pub(crate) fn rejection_text(reply: &SmtpReply) -> String {
    format!("Email rejected with code {}: {}", reply.code, reply.message)
}
