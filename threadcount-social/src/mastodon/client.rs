use crate::mastodon::types::{MediaAttachment, NewStatus, Status};
use crate::{MediaUploader, StatusPublisher};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use threadcount_common::{Result, ThreadcountError};
use threadcount_http::{Auth, FormPart, HttpClient, RequestOpts};

#[derive(Clone, Debug)]
pub struct MastodonClient {
    http: HttpClient,
    token: String,
}

impl MastodonClient {
    /// `instance` is the base URL, e.g. `https://botsin.space`.
    pub fn new(instance: &str, token: String) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(ThreadcountError::Config(
                "mastodon access token is empty (set MASTODON_TOKEN)".into(),
            ));
        }
        let http = HttpClient::new(instance)
            .map_err(|e| ThreadcountError::Config(format!("mastodon instance: {e}")))?;
        Ok(Self { http, token })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    fn opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.token)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MediaUploader for MastodonClient {
    async fn upload_media(&self, png: Bytes, description: &str) -> Result<MediaAttachment> {
        let size = png.len();
        let parts = vec![
            FormPart::File {
                name: "file".into(),
                file_name: "chart.png".into(),
                mime: "image/png".into(),
                data: png,
            },
            FormPart::Text {
                name: "description".into(),
                value: description.to_string(),
            },
        ];
        let media: MediaAttachment = self
            .http
            .post_multipart("api/v2/media", parts, self.opts())
            .await
            .map_err(|e| ThreadcountError::Upload(e.to_string()))?;
        tracing::info!(media_id = %media.id, bytes = size, "mastodon.media.uploaded");
        Ok(media)
    }
}

#[async_trait]
impl StatusPublisher for MastodonClient {
    async fn post_status(&self, status: &NewStatus) -> Result<Status> {
        let posted: Status = self
            .http
            .post_json("api/v1/statuses", status, self.opts())
            .await
            .map_err(|e| ThreadcountError::Publish(e.to_string()))?;
        tracing::info!(
            status_id = %posted.id,
            url = posted.url.as_deref().unwrap_or("-"),
            media = status.media_ids.len(),
            "mastodon.status.posted"
        );
        Ok(posted)
    }
}
