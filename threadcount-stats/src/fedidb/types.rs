use serde::{Deserialize, Serialize};
use threadcount_history::UserCount;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SoftwareList {
    #[serde(default)]
    pub data: Vec<SoftwareEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SoftwareEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub user_count: Option<u64>,
    #[serde(default, alias = "monthly_actives")]
    pub monthly_active_users: Option<u64>,
    #[serde(default)]
    pub instance_count: Option<u64>,
}

impl SoftwareEntry {
    pub fn matches(&self, software: &str) -> bool {
        self.name.eq_ignore_ascii_case(software)
            || self
                .slug
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(software))
    }

    pub fn user_count(&self) -> UserCount {
        UserCount {
            total: self.user_count.unwrap_or(0),
            mau: self.monthly_active_users.unwrap_or(0),
        }
    }
}

impl SoftwareList {
    /// Counts for `software`; zero when the listing does not mention it.
    pub fn counts_for(&self, software: &str) -> UserCount {
        self.data
            .iter()
            .find(|e| e.matches(software))
            .map(SoftwareEntry::user_count)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_entry_case_insensitively_with_defaults() {
        let raw = r#"{
            "data": [
                { "name": "Lemmy", "user_count": 1000, "monthly_active_users": 200 },
                { "name": "kbin", "user_count": 500, "monthly_actives": 100 },
                { "name": "Mastodon" }
            ]
        }"#;
        let list: SoftwareList = serde_json::from_str(raw).unwrap();
        assert_eq!(list.counts_for("lemmy"), UserCount::new(1000, 200));
        assert_eq!(list.counts_for("KBIN"), UserCount::new(500, 100));
        assert_eq!(list.counts_for("mastodon"), UserCount::new(0, 0));
        assert_eq!(list.counts_for("pixelfed"), UserCount::default());
    }

    #[test]
    fn null_counts_default_to_zero() {
        let raw = r#"{ "data": [ { "name": "lemmy", "user_count": null, "monthly_active_users": 3 } ] }"#;
        let list: SoftwareList = serde_json::from_str(raw).unwrap();
        assert_eq!(list.counts_for("lemmy"), UserCount::new(0, 3));
    }

    #[test]
    fn missing_data_is_an_empty_listing() {
        let list: SoftwareList = serde_json::from_str("{}").unwrap();
        assert_eq!(list.counts_for("lemmy"), UserCount::default());
    }
}
