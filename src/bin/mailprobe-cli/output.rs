use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;
use mailprobe_lib::{SmtpStatus, VerificationResult};

use crate::args::Format;

const RULE: &str = "================================================================================";

pub fn write_reports(results: &[VerificationResult], format: Format) -> Result<()> {
    match format {
        Format::Human => {
            println!();
            println!("{}", render_console(results));
            Ok(())
        }
        Format::Json => write_json(results),
        Format::Ndjson => write_ndjson(results),
    }
}

/// Numbered, human-readable report. The `Status` line is the coarse domain
/// classification; SMTP details follow on their own lines.
pub fn render_console(results: &[VerificationResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}\nEMAIL VERIFICATION RESULTS\n{RULE}\n");

    for (idx, result) in results.iter().enumerate() {
        let _ = writeln!(out, "{}. Email: {}", idx + 1, result.email);
        let _ = writeln!(out, "   Status: {}", result.domain_status());
        if let Some(domain) = &result.domain {
            let _ = writeln!(out, "   Domain: {domain}");
        }
        if let Some(mx) = &result.mx_records {
            let hosts: Vec<&str> = mx
                .iter()
                .map(String::as_str)
                .filter(|host| !host.is_empty())
                .collect();
            if !hosts.is_empty() {
                let _ = writeln!(out, "   MX Records: {}", hosts.join(", "));
            }
        }
        if result.smtp_status != SmtpStatus::NotChecked {
            let _ = writeln!(out, "   SMTP: {}", result.smtp_status_text());
        }
        if let Some(response) = &result.smtp_response {
            let _ = writeln!(out, "   SMTP Response: {response}");
        }
        if let Some(error) = &result.error_message {
            let _ = writeln!(out, "   Error: {error}");
        }
        out.push('\n');
    }

    out.push_str(RULE);
    out
}

#[cfg(feature = "with-serde")]
#[derive(serde::Serialize)]
struct JsonReport<'a> {
    total: usize,
    results: &'a [VerificationResult],
}

#[cfg(feature = "with-serde")]
fn json_report(results: &[VerificationResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport {
        total: results.len(),
        results,
    })?)
}

#[cfg(feature = "with-serde")]
fn write_json(results: &[VerificationResult]) -> Result<()> {
    println!("{}", json_report(results)?);
    Ok(())
}

#[cfg(feature = "with-serde")]
fn write_ndjson(results: &[VerificationResult]) -> Result<()> {
    for result in results {
        println!("{}", serde_json::to_string(result)?);
    }
    Ok(())
}

/// Writes `{"total": n, "results": [...]}` to `path` via a temp file + rename.
#[cfg(feature = "with-serde")]
pub fn save_json(results: &[VerificationResult], path: &Path) -> Result<()> {
    use anyhow::Context;

    let body = json_report(results)?;
    write_all_atomically(path, body.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    tracing::info!("results saved to JSON file: {}", path.display());
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json(_results: &[VerificationResult]) -> Result<()> {
    anyhow::bail!("--format json requires the 'with-serde' feature")
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson(_results: &[VerificationResult]) -> Result<()> {
    anyhow::bail!("--format ndjson requires the 'with-serde' feature")
}

#[cfg(not(feature = "with-serde"))]
pub fn save_json(_results: &[VerificationResult], _path: &Path) -> Result<()> {
    anyhow::bail!("--json requires the 'with-serde' feature")
}

#[cfg(feature = "with-serde")]
fn write_all_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}
