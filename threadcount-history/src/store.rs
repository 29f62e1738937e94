//! Bounded, persisted history per software name.
use crate::history::{HISTORY_LENGTH, History};
use crate::kv::KvStore;
use crate::sample::Sample;
use std::sync::Arc;
use threadcount_common::{Result, ThreadcountError};
use tracing::{debug, info, warn};

/// Canonical store key for a software name: trimmed and lower-cased.
///
/// ```
/// assert_eq!(threadcount_history::canonical_key(" Lemmy "), "lemmy");
/// ```
pub fn canonical_key(software: &str) -> String {
    software.trim().to_lowercase()
}

#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KvStore>,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &Arc<dyn KvStore> {
        &self.kv
    }

    /// Read the persisted history. Absent or unparseable values yield an empty history.
    pub async fn load(&self, software: &str) -> Result<History> {
        let key = canonical_key(software);
        let raw = self.kv.get(&key).await?;
        Ok(parse_lenient(&key, raw.as_deref()))
    }

    /// Append `sample`, keep the newest [`HISTORY_LENGTH`] entries, persist and return them.
    pub async fn append(&self, software: &str, sample: Sample) -> Result<History> {
        let key = canonical_key(software);
        info!(software=%key, backend=self.kv.backend(), "history.append.start");

        let raw = self.kv.get(&key).await?;
        let mut history = parse_lenient(&key, raw.as_deref());
        let dropped = history.push_bounded(sample, HISTORY_LENGTH);

        let encoded = serde_json::to_string(&history)
            .map_err(|e| ThreadcountError::Store(format!("encode history {key}: {e}")))?;
        self.kv.put(&key, encoded).await?;

        info!(
            software=%key,
            len=history.len(),
            dropped,
            total=sample.users.total,
            mau=sample.users.mau,
            "history.append"
        );
        Ok(history)
    }
}

fn parse_lenient(key: &str, raw: Option<&str>) -> History {
    let Some(raw) = raw else {
        debug!(software=%key, "history.absent");
        return History::new();
    };
    match serde_json::from_str::<History>(raw) {
        Ok(history) => history,
        Err(e) => {
            warn!(
                software=%key,
                error=%e,
                raw_len=raw.len(),
                "history.parse_failed.reset"
            );
            History::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parse_accepts_stored_format() {
        let raw = r#"[{"date":"2023-06-20T12:00:00.000Z","users":{"total":10,"mau":2}}]"#;
        let h = parse_lenient("lemmy", Some(raw));
        assert_eq!(h.len(), 1);
        assert_eq!(h.latest().unwrap().users.total, 10);
    }

    #[test]
    fn lenient_parse_resets_on_garbage() {
        assert!(parse_lenient("lemmy", Some("not json")).is_empty());
        assert!(parse_lenient("lemmy", Some(r#"{"date":1}"#)).is_empty());
        assert!(parse_lenient("lemmy", Some("")).is_empty());
        assert!(parse_lenient("lemmy", None).is_empty());
    }
}
