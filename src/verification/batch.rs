use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{info, warn};

use super::{VerificationResult, Verifier};
use crate::mx::DnsLookup;
use crate::smtp_verify::MailProbe;

/// Shared stop flag, checked between emails. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Completed results, in input order.
    pub results: Vec<VerificationResult>,
    /// Some emails were skipped because the run was cancelled.
    pub interrupted: bool,
}

impl<L: DnsLookup, P: MailProbe> Verifier<L, P> {
    /// Verifies `emails` one after another. A cancelled token stops the run
    /// before the next email; finished results are kept.
    pub fn verify_batch<S: AsRef<str>>(&self, emails: &[S], cancel: &CancelToken) -> BatchReport {
        let total = emails.len();
        info!("starting bulk verification for {total} email(s)");

        let mut report = BatchReport::default();
        for (idx, email) in emails.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(done = idx, total, "verification interrupted");
                report.interrupted = true;
                break;
            }
            let email = email.as_ref();
            info!("processing {}/{total}: {email}", idx + 1);
            report.results.push(self.verify(email));
        }

        info!("bulk verification completed: {} email(s) processed", report.results.len());
        report
    }
}

impl<L, P> Verifier<L, P>
where
    L: DnsLookup + Sync,
    P: MailProbe + Sync,
{
    /// Runs up to `jobs` pipelines at once on a dedicated rayon pool. Each
    /// email is still verified step by step, the MX cache is shared, and
    /// results come back in input order. Emails not started before
    /// cancellation are left out. DNS queries on the default resolver are
    /// serialized, see [`Verifier`].
    pub fn verify_batch_parallel<S>(
        &self,
        emails: &[S],
        jobs: usize,
        cancel: &CancelToken,
    ) -> BatchReport
    where
        S: AsRef<str> + Sync,
    {
        if jobs <= 1 {
            return self.verify_batch(emails, cancel);
        }
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool,
            Err(err) => {
                warn!(error = %err, "could not start worker pool, verifying sequentially");
                return self.verify_batch(emails, cancel);
            }
        };

        info!(jobs, "starting bulk verification for {} email(s)", emails.len());
        let slots: Vec<Option<VerificationResult>> = pool.install(|| {
            emails
                .par_iter()
                .map(|email| {
                    if cancel.is_cancelled() {
                        None
                    } else {
                        Some(self.verify(email.as_ref()))
                    }
                })
                .collect()
        });

        let interrupted = slots.iter().any(Option::is_none);
        let results: Vec<VerificationResult> = slots.into_iter().flatten().collect();
        if interrupted {
            warn!(done = results.len(), total = emails.len(), "verification interrupted");
        }
        info!("bulk verification completed: {} email(s) processed", results.len());
        BatchReport {
            results,
            interrupted,
        }
    }
}
