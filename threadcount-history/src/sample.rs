use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;

/// Registered and monthly-active users of one platform at one instant.
///
/// Missing fields deserialize as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCount {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub mau: u64,
}

impl UserCount {
    pub fn new(total: u64, mau: u64) -> Self {
        Self { total, mau }
    }
}

impl Add for UserCount {
    type Output = UserCount;

    fn add(self, rhs: Self) -> Self::Output {
        UserCount {
            total: self.total.saturating_add(rhs.total),
            mau: self.mau.saturating_add(rhs.mau),
        }
    }
}

impl Sum for UserCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(UserCount::default(), Add::add)
    }
}

/// One timestamped snapshot. Persisted as `{ "date": "<ISO-8601>", "users": {..} }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(with = "iso_millis")]
    pub date: DateTime<Utc>,
    pub users: UserCount,
}

impl Sample {
    pub fn new(date: DateTime<Utc>, users: UserCount) -> Self {
        Self { date, users }
    }

    /// Snapshot taken at the current instant.
    pub fn now(users: UserCount) -> Self {
        Self::new(Utc::now(), users)
    }
}

/// `2023-06-20T12:00:00.000Z` on the way out, any RFC 3339 instant on the way in.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
