use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::args::InputSource;

pub fn load(source: &InputSource) -> Result<Vec<String>> {
    let emails = match source {
        InputSource::Emails(list) => {
            let emails = parse_list(list);
            info!("parsed {} email(s) from input string", emails.len());
            emails
        }
        InputSource::File(path) => load_file(path)?,
        InputSource::Stdin => {
            let emails = read_lines(io::stdin().lock()).context("read stdin")?;
            info!("read {} email(s) from stdin", emails.len());
            emails
        }
    };
    Ok(emails)
}

/// Splits on commas, dropping blanks.
pub fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}

/// One address per line, blank lines skipped.
pub fn read_lines<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut emails = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            emails.push(line.to_string());
        }
    }
    Ok(emails)
}

fn load_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        bail!("file not found: {}", path.display());
    }
    if !path.is_file() {
        bail!("path is not a file: {}", path.display());
    }
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let emails =
        read_lines(BufReader::new(file)).with_context(|| format!("read {}", path.display()))?;
    info!("loaded {} email(s) from file: {}", emails.len(), path.display());
    Ok(emails)
}
