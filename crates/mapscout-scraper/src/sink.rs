//! Deduplicating accumulator for extracted records.

use std::collections::HashSet;

use mapscout_core::BusinessRecord;

/// Collects records in first-seen order, dropping duplicates.
///
/// The dedup key is the normalized `(name, address)` pair; listings without
/// an address fall back to `(name, map_url)` so two address-less listings
/// with the same name still stay distinct. Accumulation is monotonic — there
/// is no removal.
#[derive(Debug, Default)]
pub struct ResultSink {
    seen: HashSet<(String, String)>,
    records: Vec<BusinessRecord>,
}

impl ResultSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `record` unless an equivalent one was already collected.
    /// Returns whether the record was newly added.
    pub fn add(&mut self, record: BusinessRecord) -> bool {
        let key = dedup_key(&record);
        if self.seen.insert(key) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The collected records, in first-seen order.
    #[must_use]
    pub fn snapshot(&self) -> &[BusinessRecord] {
        &self.records
    }

    /// Consumes the sink, handing the records to the exporter.
    #[must_use]
    pub fn into_records(self) -> Vec<BusinessRecord> {
        self.records
    }
}

fn dedup_key(record: &BusinessRecord) -> (String, String) {
    let name = normalize(&record.name);
    match record.address.as_deref() {
        Some(address) => (name, normalize(address)),
        None => (name, normalize(&record.map_url)),
    }
}

/// Lowercases and collapses internal whitespace so cosmetic differences
/// ("Joe's Diner " vs "joe's  diner") do not defeat deduplication.
fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
