// Per-record labelling through an injected classifier.
// Whatever the classifier does wrong (error, timeout, empty or odd answer),
// the record still gets a label: DEFAULT_LABEL.

mod ollama;

pub use ollama::OllamaClassifier;

use crate::Result;
use futures::future::BoxFuture;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_LABEL: &str = "neutral";
pub const POSITIVE: &str = "positive";
pub const NEGATIVE: &str = "negative";

pub trait Classifier: Send + Sync {
    /// Raw answer for `text`; normalisation happens in [`ClassifierHandle`].
    fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Answers [`DEFAULT_LABEL`] for everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralClassifier;

impl Classifier for NeutralClassifier {
    fn classify<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async { Ok(DEFAULT_LABEL.to_string()) })
    }
}

/// A shared classifier plus the per-call deadline.
#[derive(Clone)]
pub struct ClassifierHandle {
    inner: Arc<dyn Classifier>,
    timeout: Duration,
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for ClassifierHandle {
    fn default() -> Self {
        Self::new(Arc::new(NeutralClassifier), Duration::from_secs(30))
    }
}

impl ClassifierHandle {
    pub fn new(inner: Arc<dyn Classifier>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Never fails: problems degrade to [`DEFAULT_LABEL`].
    pub async fn label(&self, text: &str) -> String {
        match tokio::time::timeout(self.timeout, self.inner.classify(text)).await {
            Ok(Ok(raw)) => normalize_label(&raw).unwrap_or(DEFAULT_LABEL).to_string(),
            Ok(Err(e)) => {
                warn!(error = %e, "classifier failed, using default label");
                DEFAULT_LABEL.to_string()
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "classifier timed out");
                DEFAULT_LABEL.to_string()
            }
        }
    }
}

static FIRST_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Alphabetic}+").expect("static pattern"));

/// Map a free-form answer to one of the three labels. `None` for an empty answer.
///
/// The first word decides when it is a known spelling (English or
/// Portuguese, any gender); otherwise any mention of a polarity wins, and
/// anything else is neutral.
pub fn normalize_label(raw: &str) -> Option<&'static str> {
    let first_line = raw.trim().lines().next()?.trim().to_lowercase();
    if first_line.is_empty() {
        return None;
    }
    let first_word = FIRST_WORD.find(&first_line).map(|m| m.as_str());
    let label = match first_word {
        Some("positive" | "positivo" | "positiva") => POSITIVE,
        Some("negative" | "negativo" | "negativa") => NEGATIVE,
        Some("neutral" | "neutro" | "neutra") => DEFAULT_LABEL,
        _ if first_line.contains("positiv") => POSITIVE,
        _ if first_line.contains("negativ") => NEGATIVE,
        _ => DEFAULT_LABEL,
    };
    Some(label)
}
