use crate::classify::ClassifierHandle;
use crate::corpus::{Columns, Malformed, Record, parse_record, split_fields, trim_line_end};
use crate::tally::{FrequencyTable, tokenize};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Everything one worker learned from its range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialTally {
    pub categories: FrequencyTable,
    pub words: FrequencyTable,
    /// Classifier labels, one per counted record. Empty unless classification ran.
    pub labels: FrequencyTable,
    pub records: u64,
    pub skipped: u64,
    /// Counted records with their label, in input order. Only filled when
    /// the pass was asked to keep rows.
    pub rows: Vec<AnnotatedRow>,
}

/// One input record, every field as read, plus the label it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    pub fields: Vec<String>,
    pub label: String,
}

impl Default for PartialTally {
    fn default() -> Self {
        Self {
            categories: FrequencyTable::labels(),
            words: FrequencyTable::words(),
            labels: FrequencyTable::labels(),
            records: 0,
            skipped: 0,
            rows: Vec::new(),
        }
    }
}

impl PartialTally {
    /// Count one parsed record.
    pub fn observe(&mut self, record: &Record) {
        self.records += 1;
        self.categories.increment(&record.category);
        for token in tokenize(&record.text) {
            self.words.increment(&token);
        }
    }

    pub fn merge(&mut self, other: PartialTally) {
        self.categories.merge(other.categories);
        self.words.merge(other.words);
        self.labels.merge(other.labels);
        self.records += other.records;
        self.skipped += other.skipped;
        self.rows.extend(other.rows);
    }
}

/// The per-range scan: parse lines, count categories and words.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPass {
    columns: Columns,
    keep_rows: bool,
}

impl WorkerPass {
    pub fn new(columns: Columns) -> Self {
        Self {
            columns,
            keep_rows: false,
        }
    }

    /// Make [`run_classified`](Self::run_classified) also return every
    /// counted record with its label.
    pub fn keeping_rows(mut self, keep_rows: bool) -> Self {
        self.keep_rows = keep_rows;
        self
    }

    pub fn run(&self, chunk: &[u8]) -> PartialTally {
        let mut tally = PartialTally::default();
        for parsed in self.records(chunk) {
            match parsed {
                Ok(record) => tally.observe(&record),
                Err(_) => tally.skipped += 1,
            }
        }
        tally
    }

    /// Like [`run`](Self::run), and also asks the classifier for a label for
    /// every counted record.
    pub async fn run_classified(&self, chunk: &[u8], classifier: &ClassifierHandle) -> PartialTally {
        let mut tally = PartialTally::default();
        for line in lines(chunk) {
            match self.parse(line) {
                Ok(record) => {
                    tally.observe(&record);
                    let label = classifier.label(&record.text).await;
                    tally.labels.increment(&label);
                    if self.keep_rows {
                        // parsed once already, so the line is well formed
                        let fields = split_fields(line).unwrap_or_default();
                        tally.rows.push(AnnotatedRow { fields, label });
                    }
                }
                Err(_) => tally.skipped += 1,
            }
        }
        tally
    }

    /// Records of `chunk` in order. Blank lines are not records and are not
    /// reported at all.
    pub fn records<'a>(
        &self,
        chunk: &'a [u8],
    ) -> impl Iterator<Item = core::result::Result<Record, Malformed>> + use<'a> {
        let pass = *self;
        lines(chunk).map(move |line| pass.parse(line))
    }

    fn parse(&self, line: &[u8]) -> core::result::Result<Record, Malformed> {
        let parsed = parse_record(line, &self.columns);
        if let Err(reason) = &parsed {
            trace!(?reason, "skipping line");
        }
        parsed
    }
}

/// Non-blank lines of `chunk`, terminators stripped.
fn lines(chunk: &[u8]) -> impl Iterator<Item = &[u8]> {
    chunk
        .split(|&b| b == b'\n')
        .map(trim_line_end)
        .filter(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classifier, ClassifierHandle};
    use crate::{Error, Result};
    use futures::future::BoxFuture;
    use std::sync::Arc;
    use std::time::Duration;

    fn pass() -> WorkerPass {
        WorkerPass::new(Columns::default())
    }

    #[test]
    fn counts_categories_and_words() {
        let chunk = b"ABBA,s1,/l,Love love me\nQueen,s2,/l,\"Love, again\"\n";
        let tally = pass().run(chunk);
        assert_eq!(tally.records, 2);
        assert_eq!(tally.categories.get("ABBA"), Some(1));
        assert_eq!(tally.categories.get("Queen"), Some(1));
        assert_eq!(tally.words.get("love"), Some(3));
        assert_eq!(tally.words.get("me"), Some(1));
        assert_eq!(tally.words.get("again"), Some(1));
        assert!(tally.labels.is_empty());
    }

    #[test]
    fn empty_category_skips_the_whole_record() {
        let tally = pass().run(b",s,/l,ghost words\n");
        assert_eq!(tally.records, 0);
        assert_eq!(tally.skipped, 1);
        assert!(tally.categories.is_empty());
        assert!(tally.words.is_empty());
    }

    #[test]
    fn missing_text_counts_only_the_category() {
        let tally = pass().run(b"ABBA,s,/l,\nQueen,s\n");
        assert_eq!(tally.records, 2);
        assert_eq!(tally.categories.len(), 2);
        assert!(tally.words.is_empty());
    }

    #[test]
    fn malformed_lines_do_not_stop_the_pass() {
        let chunk = b"ABBA,s,/l,\"open quote\nQueen,s,/l,fine words\r\n\n";
        let tally = pass().run(chunk);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.records, 1);
        assert_eq!(tally.words.get("fine"), Some(1));
        assert_eq!(tally.words.get("open"), None);
    }

    #[test]
    fn oversized_category_is_ignored_but_words_count() {
        let artist = "a".repeat(200);
        let chunk = format!("{artist},s,/l,still counted\n");
        let tally = pass().run(chunk.as_bytes());
        assert!(tally.categories.is_empty());
        assert_eq!(tally.words.get("counted"), Some(1));
    }

    #[test]
    fn merge_sums_every_part() {
        let mut left = pass().run(b"A,s,/l,one two\n,s,/l,x\n");
        let right = pass().run(b"A,s,/l,two\nB,s,/l,three\n");
        left.merge(right);
        assert_eq!(left.records, 3);
        assert_eq!(left.skipped, 1);
        assert_eq!(left.categories.get("A"), Some(2));
        assert_eq!(left.words.get("two"), Some(2));
    }

    struct ByFirstWord;

    impl Classifier for ByFirstWord {
        fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String>> {
            Box::pin(async move {
                match text.split_whitespace().next() {
                    Some("happy") => Ok("positive".to_string()),
                    Some("sad") => Ok("negative".to_string()),
                    _ => Err(Error::General("no opinion".into())),
                }
            })
        }
    }

    #[test]
    fn stray_quote_inside_a_field_keeps_the_record() {
        let tally = pass().run(b"Prince,12\" Single,/l,purple rain\n");
        assert_eq!(tally.records, 1);
        assert_eq!(tally.skipped, 0);
        assert_eq!(tally.categories.get("Prince"), Some(1));
        assert_eq!(tally.words.get("purple"), Some(1));
    }

    #[tokio::test]
    async fn kept_rows_carry_every_field_and_the_label() {
        let classifier = ClassifierHandle::new(Arc::new(ByFirstWord), Duration::from_secs(1));
        let chunk = b"A,s,/l,\"happy, happy\"\n,s,/l,happy\nB,s,/l,sad song\n";
        let tally = pass()
            .keeping_rows(true)
            .run_classified(chunk, &classifier)
            .await;
        assert_eq!(
            tally.rows,
            vec![
                AnnotatedRow {
                    fields: vec!["A".into(), "s".into(), "/l".into(), "happy, happy".into()],
                    label: "positive".into(),
                },
                AnnotatedRow {
                    fields: vec!["B".into(), "s".into(), "/l".into(), "sad song".into()],
                    label: "negative".into(),
                },
            ]
        );

        let plain = pass().run_classified(chunk, &classifier).await;
        assert!(plain.rows.is_empty());
    }

    #[tokio::test]
    async fn classified_pass_tallies_labels() {
        let classifier = ClassifierHandle::new(Arc::new(ByFirstWord), Duration::from_secs(1));
        let chunk = b"A,s,/l,happy days\nB,s,/l,sad song\nC,s,/l,shrug\n,s,/l,happy\n";
        let tally = pass().run_classified(chunk, &classifier).await;
        assert_eq!(tally.records, 3);
        assert_eq!(tally.labels.get("positive"), Some(1));
        assert_eq!(tally.labels.get("negative"), Some(1));
        assert_eq!(tally.labels.get("neutral"), Some(1));
    }
}
