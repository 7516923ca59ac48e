use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request capability the pipeline needs from the exchange.
///
/// `Err` means the request never produced a response (DNS, TLS, timeout);
/// non-2xx answers come back as `Ok` with their status.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, url: &str) -> Result<HttpResponse>;

    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<HttpResponse>;
}
