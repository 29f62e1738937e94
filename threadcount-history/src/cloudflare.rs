//! Cloudflare Workers KV over the v4 REST API.
use crate::kv::KvStore;
use async_trait::async_trait;
use bytes::Bytes;
use threadcount_common::{Result, ThreadcountError};
use threadcount_http::{Auth, HttpClient, RequestOpts};

#[derive(Debug, Clone)]
pub struct CloudflareKv {
    http: HttpClient,
    namespace_path: String,
    api_token: String,
}

impl CloudflareKv {
    /// `endpoint` is normally `https://api.cloudflare.com/client/v4/`.
    pub fn new(
        http: HttpClient,
        account_id: &str,
        namespace_id: &str,
        api_token: String,
    ) -> Self {
        Self {
            http,
            namespace_path: format!("accounts/{account_id}/storage/kv/namespaces/{namespace_id}"),
            api_token,
        }
    }

    pub fn with_endpoint(
        endpoint: &str,
        account_id: &str,
        namespace_id: &str,
        api_token: String,
    ) -> Result<Self> {
        let http = HttpClient::new(endpoint)
            .map_err(|e| ThreadcountError::Config(format!("cloudflare endpoint: {e}")))?;
        Ok(Self::new(http, account_id, namespace_id, api_token))
    }

    fn value_path(&self, key: &str) -> String {
        format!("{}/values/{key}", self.namespace_path)
    }

    fn opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.api_token)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl KvStore for CloudflareKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.http.get_bytes(&self.value_path(key), self.opts()).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(ThreadcountError::Store(format!("cloudflare get {key}: {e}"))),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.http
            .put_bytes(
                &self.value_path(key),
                Bytes::from(value),
                "text/plain; charset=utf-8",
                self.opts(),
            )
            .await
            .map_err(|e| ThreadcountError::Store(format!("cloudflare put {key}: {e}")))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "cloudflare"
    }
}
