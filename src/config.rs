use crate::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const WORKERS_ENV: &str = "CORPUS_TALLY_WORKERS";
pub const COLLECT_TIMEOUT_ENV: &str = "CORPUS_TALLY_COLLECT_TIMEOUT_SECS";
pub const MAX_RECORD_BYTES_ENV: &str = "CORPUS_TALLY_MAX_RECORD_BYTES";
pub const CLASSIFY_TIMEOUT_ENV: &str = "CORPUS_TALLY_CLASSIFY_TIMEOUT_SECS";

pub const DEFAULT_TOP_K: usize = 20;
pub const DEFAULT_MAX_RECORD_BYTES: usize = 1 << 20;
pub const DEFAULT_COLLECT_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Knobs of a single run. Worker count and limits come from the
/// environment; top-k and classification from the command line.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Total worker identities, the coordinator included.
    pub workers: usize,
    pub top_k: usize,
    pub max_record_bytes: usize,
    /// How long the coordinator waits for all partials after dispatching.
    pub collect_timeout: Duration,
    pub classify: bool,
    pub classify_timeout: Duration,
    /// Where to write the corpus again with a label column. Needs `classify`.
    pub output: Option<PathBuf>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            top_k: DEFAULT_TOP_K,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            collect_timeout: DEFAULT_COLLECT_TIMEOUT,
            classify: false,
            classify_timeout: DEFAULT_CLASSIFY_TIMEOUT,
            output: None,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

impl RunSettings {
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides found by `lookup` (an environment in production, a
    /// map in tests).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(WORKERS_ENV) {
            self.workers = parse_number(WORKERS_ENV, &raw)?;
        }
        if let Some(raw) = lookup(MAX_RECORD_BYTES_ENV) {
            self.max_record_bytes = parse_number(MAX_RECORD_BYTES_ENV, &raw)?;
        }
        if let Some(raw) = lookup(COLLECT_TIMEOUT_ENV) {
            self.collect_timeout = Duration::from_secs(parse_number(COLLECT_TIMEOUT_ENV, &raw)?);
        }
        if let Some(raw) = lookup(CLASSIFY_TIMEOUT_ENV) {
            self.classify_timeout = Duration::from_secs(parse_number(CLASSIFY_TIMEOUT_ENV, &raw)?);
        }
        self.validate()?;
        Ok(self)
    }

    /// Workers return their labelled records only when they will be written.
    pub fn keeps_rows(&self) -> bool {
        self.classify && self.output.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidWorkerCount);
        }
        if self.max_record_bytes == 0 {
            return Err(Error::General(format!("{MAX_RECORD_BYTES_ENV} must be positive")));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::General(format!("{name}: '{raw}' is not a valid number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<RunSettings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunSettings::default().with_overrides(|name| vars.get(name).cloned())
    }

    #[test]
    fn environment_overrides_defaults() -> Result<()> {
        let settings = settings_from(&[
            (WORKERS_ENV, "4"),
            (COLLECT_TIMEOUT_ENV, " 5 "),
            (MAX_RECORD_BYTES_ENV, "20000"),
        ])?;
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.collect_timeout, Duration::from_secs(5));
        assert_eq!(settings.max_record_bytes, 20000);
        assert_eq!(settings.top_k, DEFAULT_TOP_K);
        assert_eq!(settings.classify_timeout, DEFAULT_CLASSIFY_TIMEOUT);
        Ok(())
    }

    #[test]
    fn rows_are_kept_only_for_a_classified_output() {
        let mut settings = RunSettings::default();
        settings.output = Some(PathBuf::from("labelled.csv"));
        assert!(!settings.keeps_rows());
        settings.classify = true;
        assert!(settings.keeps_rows());
        settings.output = None;
        assert!(!settings.keeps_rows());
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(
            settings_from(&[(WORKERS_ENV, "0")]),
            Err(Error::InvalidWorkerCount)
        ));
    }

    #[test]
    fn garbage_number_names_the_variable() {
        let err = settings_from(&[(WORKERS_ENV, "many")]).unwrap_err();
        assert!(err.to_string().contains(WORKERS_ENV));
    }
}
