use std::fmt;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// Mail exchangers of a domain, most preferred first. Never empty.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecordSet {
    records: Vec<MxRecord>,
}

impl MxRecordSet {
    /// Normalizes hostnames, drops null MX entries and duplicates, and sorts by
    /// ascending preference. Returns `None` when nothing routable is left.
    pub fn from_records(records: Vec<MxRecord>) -> Option<Self> {
        let mut records: Vec<MxRecord> = records
            .into_iter()
            .map(|r| MxRecord::new(r.preference, normalize_exchange(&r.exchange)))
            .filter(|r| !r.exchange.is_empty())
            .collect();
        records.sort();
        records.dedup();

        if records.is_empty() {
            None
        } else {
            Some(Self { records })
        }
    }

    pub fn records(&self) -> &[MxRecord] {
        &self.records
    }

    /// Exchange hostnames in priority order.
    pub fn hostnames(&self) -> Vec<String> {
        self.records.iter().map(|r| r.exchange.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Address record family queried by the existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => f.write_str("A"),
            Self::Ipv6 => f.write_str("AAAA"),
        }
    }
}
