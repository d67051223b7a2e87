use crate::tally::{RankedEntry, select};
use crate::worker::PartialTally;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelShare {
    pub label: String,
    pub count: u64,
    pub percent: f64,
}

/// What a finished run tells the user.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub top_categories: Vec<RankedEntry>,
    pub top_words: Vec<RankedEntry>,
    /// Classifier label distribution; empty when classification was off.
    pub labels: Vec<LabelShare>,
    pub distinct_categories: usize,
    pub distinct_words: usize,
    pub records: u64,
    pub skipped: u64,
    pub workers: usize,
    pub input_bytes: usize,
    pub elapsed_secs: f64,
}

impl Report {
    pub fn build(
        totals: &PartialTally,
        top_k: usize,
        workers: usize,
        input_bytes: usize,
        elapsed: Duration,
    ) -> Self {
        let labelled = totals.labels.total();
        let labels = select(&totals.labels, totals.labels.len())
            .into_iter()
            .map(|entry| LabelShare {
                percent: if labelled == 0 {
                    0.0
                } else {
                    100.0 * entry.count as f64 / labelled as f64
                },
                label: entry.key,
                count: entry.count,
            })
            .collect();

        Self {
            top_categories: select(&totals.categories, top_k),
            top_words: select(&totals.words, top_k),
            labels,
            distinct_categories: totals.categories.len(),
            distinct_words: totals.words.len(),
            records: totals.records,
            skipped: totals.skipped,
            workers,
            input_bytes,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}

const RULE: &str = "================================================";

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "CORPUS TALLY")?;
        writeln!(f, "{RULE}")?;
        writeln!(f)?;

        writeln!(f, "--- Top {} categories by records ---", self.top_categories.len())?;
        for (rank, entry) in self.top_categories.iter().enumerate() {
            writeln!(f, "{:3}. {:<40} {:>8}", rank + 1, entry.key, entry.count)?;
        }
        writeln!(f)?;

        writeln!(f, "--- Top {} words by occurrences ---", self.top_words.len())?;
        for (rank, entry) in self.top_words.iter().enumerate() {
            writeln!(f, "{:3}. {:<30} {:>12}", rank + 1, entry.key, entry.count)?;
        }

        if !self.labels.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Classifier labels ---")?;
            for share in &self.labels {
                writeln!(f, "  {:<10} {:>8} ({:.2}%)", share.label, share.count, share.percent)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Statistics:")?;
        writeln!(f, "  - distinct categories: {}", self.distinct_categories)?;
        writeln!(f, "  - distinct words:      {}", self.distinct_words)?;
        writeln!(f, "  - records counted:     {}", self.records)?;
        writeln!(f, "  - records skipped:     {}", self.skipped)?;
        writeln!(f, "  - workers:             {}", self.workers)?;
        writeln!(
            f,
            "  - input size:          {:.2} MiB",
            self.input_bytes as f64 / (1024.0 * 1024.0)
        )?;
        writeln!(f, "  - elapsed:             {:.3} s", self.elapsed_secs)?;
        writeln!(f, "{RULE}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Columns;
    use crate::worker::WorkerPass;

    #[test]
    fn summary_counts_come_from_the_totals() {
        let mut totals = WorkerPass::new(Columns::default())
            .run(b"A,s,/l,red red blue\nB,s,/l,blue\nA,s,/l,green\n,s,/l,x\n");
        totals.labels.increment("positive");
        totals.labels.increment("positive");
        totals.labels.increment("neutral");
        totals.labels.increment("negative");

        let report = Report::build(&totals, 2, 3, 1024, Duration::from_millis(1500));
        assert_eq!(report.distinct_categories, 2);
        assert_eq!(report.distinct_words, 3);
        assert_eq!(report.records, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.top_words.len(), 2);
        assert_eq!(report.top_categories[0].key, "A");
        assert_eq!(report.labels[0].label, "positive");
        assert_eq!(report.labels[0].percent, 50.0);

        let text = report.to_string();
        assert!(text.contains("distinct words:      3"));
        assert!(text.contains("Classifier labels"));
        assert!(text.contains("elapsed:             1.500 s"));
    }

    #[test]
    fn json_has_the_ranked_lists() -> crate::Result<()> {
        let totals = WorkerPass::new(Columns::default()).run(b"A,s,/l,hello\n");
        let report = Report::build(&totals, 20, 1, 14, Duration::ZERO);
        let json: serde_json::Value = serde_json::to_value(&report)?;
        assert_eq!(json["top_categories"][0]["key"], "A");
        assert_eq!(json["top_words"][0]["count"], 1);
        assert_eq!(json["labels"].as_array().map(Vec::len), Some(0));
        Ok(())
    }
}
