use super::FrequencyTable;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub key: String,
    pub count: u64,
}

/// The `k` highest counts of `table`, highest first. Equal counts keep the
/// table's iteration order (the sort is stable).
pub fn select(table: &FrequencyTable, k: usize) -> Vec<RankedEntry> {
    if k == 0 {
        return Vec::new();
    }
    let mut entries: Vec<(&str, u64)> = table.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
        .into_iter()
        .take(k)
        .map(|(key, count)| RankedEntry {
            key: key.to_owned(),
            count,
        })
        .collect()
}
