use super::traits::{HttpResponse, Transport};
use crate::config::ExchangeConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// reqwest-backed transport; one cookie-keeping session per run.
pub struct TaifexTransport {
    client: reqwest::Client,
    referer: String,
}

impl TaifexTransport {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            referer: config.report_url.clone(),
        })
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for TaifexTransport {
    fn name(&self) -> &str {
        "taifex"
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        Self::into_response(response).await
    }

    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<HttpResponse> {
        tracing::debug!("POST {} ({} fields)", url, form.len());
        let response = self
            .client
            .post(url)
            .header(reqwest::header::REFERER, self.referer.as_str())
            .form(form)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        Self::into_response(response).await
    }
}
