use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    /// Unknown names fall back to `None` so config validation can report them.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "unlisted" => Some(Visibility::Unlisted),
            "private" => Some(Visibility::Private),
            "direct" => Some(Visibility::Direct),
            _ => None,
        }
    }
}

/// Body of `POST api/v1/statuses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStatus {
    pub status: String,
    pub media_ids: Vec<String>,
    pub visibility: Visibility,
}

impl NewStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            media_ids: Vec::new(),
            visibility: Visibility::default(),
        }
    }

    pub fn with_media(mut self, id: impl Into<String>) -> Self {
        self.media_ids.push(id.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    #[serde(default)]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_status_wire_shape() {
        let body = NewStatus::new("hello").with_media("109");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "status": "hello", "media_ids": ["109"], "visibility": "public" })
        );
    }

    #[test]
    fn status_tolerates_sparse_response() {
        let s: Status = serde_json::from_value(json!({ "id": "1" })).unwrap();
        assert!(s.url.is_none());
        assert!(s.media_attachments.is_empty());
    }

    #[test]
    fn visibility_parse() {
        assert_eq!(Visibility::parse(" Unlisted "), Some(Visibility::Unlisted));
        assert_eq!(Visibility::parse("everyone"), None);
    }
}
