use std::io;
use std::process::{self, ExitCode};
use std::thread;

use anyhow::{Context, Result, bail};
use mailprobe_lib::{CancelToken, Verifier};
use tracing::{error, info, warn};

mod args;
mod input;
mod output;

use args::Cli;

/// Exit code after Ctrl+C, as a shell reports SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let emails = input::load(&cli.input_source())?;
    if emails.is_empty() {
        bail!("no email addresses found");
    }

    let config = cli.verifier_config().context("invalid configuration")?;
    let verifier = Verifier::from_config(&config).context("failed to set up DNS resolver")?;

    let cancel = CancelToken::new();
    spawn_interrupt_listener(cancel.clone());

    let report = verifier.verify_batch_parallel(&emails, config.jobs, &cancel);
    output::write_reports(&report.results, cli.format)?;

    if let Some(path) = &cli.json {
        output::save_json(&report.results, path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    if report.interrupted {
        eprintln!("\nProcess interrupted by user");
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` wins; otherwise our crates log at `level` and trust-dns at warn.
/// Logs go to stderr so stdout stays parseable.
fn init_tracing(level: &str) {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::new(format!(
            "mailprobe_lib={level},\
             mailprobe_cli={level},\
             trust_dns_resolver=warn,\
             trust_dns_proto=warn"
        )),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// First Ctrl+C trips `cancel`: the batch stops before its next email and
/// whatever finished is still reported. A second Ctrl+C exits at once.
fn spawn_interrupt_listener(cancel: CancelToken) {
    let spawned = thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    warn!(error = %err, "cannot listen for Ctrl+C");
                    return;
                }
            };
            match runtime.block_on(handle_interrupts(&cancel, tokio::signal::ctrl_c)) {
                Ok(()) => process::exit(i32::from(EXIT_INTERRUPTED)),
                Err(err) => warn!(error = %err, "failed to listen for Ctrl+C"),
            }
        });
    if let Err(err) = spawned {
        warn!(error = %err, "cannot spawn Ctrl+C listener");
    }
}

/// Returns once a second signal arrives.
async fn handle_interrupts<F, Fut>(cancel: &CancelToken, mut next_signal: F) -> io::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    next_signal().await?;
    info!("received Ctrl+C, stopping after in-flight verifications (again to quit now)");
    cancel.cancel();
    next_signal().await?;
    warn!("received second Ctrl+C, exiting without waiting");
    Ok(())
}
