use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgGroup, Parser, ValueEnum};
use mailprobe_lib::VerifierConfig;
use mailprobe_lib::config::parse_nameservers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
    Ndjson,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Comma-separated list given on the command line.
    Emails(String),
    File(PathBuf),
    Stdin,
}

#[derive(Parser, Debug)]
#[command(
    name = "mailprobe-cli",
    version,
    about = "Email verification with DNS and SMTP checks (no mail is sent)",
    after_help = "Examples:\n  \
        mailprobe-cli --emails \"test@example.com,user@domain.org\"\n  \
        mailprobe-cli --file emails.txt --jobs 4\n  \
        mailprobe-cli --emails \"test@gmail.com\" --json output.json"
)]
#[command(group(ArgGroup::new("input").required(true).args(["emails", "file", "stdin"])))]
pub struct Cli {
    /// comma-separated email addresses
    #[arg(long)]
    pub emails: Option<String>,

    /// text file with one address per line
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// read addresses from stdin, one per line
    #[arg(long)]
    pub stdin: bool,

    /// stdout format
    #[arg(long, value_enum, default_value_t = Format::Human)]
    pub format: Format,

    /// also save `{total, results}` as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// TOML config file; flags override its values
    #[arg(long, env = "MAILPROBE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SMTP connect/command timeout in seconds
    #[arg(long, env = "MAILPROBE_SMTP_TIMEOUT", value_name = "SECS")]
    pub smtp_timeout: Option<u64>,

    #[arg(long, env = "MAILPROBE_SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// envelope sender used in MAIL FROM
    #[arg(long = "from", env = "MAILPROBE_MAIL_FROM", value_name = "ADDRESS")]
    pub mail_from: Option<String>,

    /// name announced in EHLO/HELO
    #[arg(long, env = "MAILPROBE_HELO")]
    pub helo: Option<String>,

    /// DNS query timeout in seconds
    #[arg(long, env = "MAILPROBE_DNS_TIMEOUT", value_name = "SECS")]
    pub dns_timeout: Option<u64>,

    /// nameserver IP to use instead of the system resolver (repeatable)
    #[arg(
        long = "nameserver",
        env = "MAILPROBE_NAMESERVERS",
        value_delimiter = ',',
        value_name = "IP"
    )]
    pub nameservers: Vec<String>,

    /// disable the in-memory MX cache
    #[arg(long)]
    pub no_cache: bool,

    /// addresses verified in parallel (SMTP overlaps, DNS stays serial)
    #[arg(long, env = "MAILPROBE_JOBS")]
    pub jobs: Option<usize>,

    /// log level when RUST_LOG is unset (trace|debug|info|warn|error)
    #[arg(long, env = "MAILPROBE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn input_source(&self) -> InputSource {
        if let Some(list) = &self.emails {
            InputSource::Emails(list.clone())
        } else if let Some(path) = &self.file {
            InputSource::File(path.clone())
        } else {
            InputSource::Stdin
        }
    }

    /// Defaults, then the config file, then flags and their env fallbacks.
    pub fn verifier_config(&self) -> Result<VerifierConfig> {
        let mut config = VerifierConfig::default();

        if let Some(path) = &self.config {
            load_config_file(path, &mut config)?;
        }

        if let Some(secs) = self.smtp_timeout {
            config.smtp.timeout = Duration::from_secs(secs);
        }
        if let Some(port) = self.smtp_port {
            config.smtp.port = port;
        }
        if let Some(sender) = &self.mail_from {
            config.smtp.mail_from = sender.clone();
        }
        if let Some(helo) = &self.helo {
            config.smtp.helo_name = helo.clone();
        }
        if let Some(secs) = self.dns_timeout {
            config.dns.timeout = Duration::from_secs(secs);
        }
        if !self.nameservers.is_empty() {
            config.dns.nameservers = parse_nameservers(&self.nameservers)?;
        }
        if self.no_cache {
            config.dns.cache_enabled = false;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "with-serde")]
fn load_config_file(path: &std::path::Path, config: &mut VerifierConfig) -> Result<()> {
    let file = mailprobe_lib::ConfigFile::load(path)?;
    file.apply(config)?;
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn load_config_file(_path: &std::path::Path, _config: &mut VerifierConfig) -> Result<()> {
    anyhow::bail!("--config requires the 'with-serde' feature")
}
