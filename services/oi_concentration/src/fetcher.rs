//! Report query with a data-driven list of request-shape variants

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::ExchangeConfig;
use crate::error::ExtractError;
use crate::exchange::Transport;

/// One plausible form shape; values are templates over `{code}`,
/// `{query_type}` and `{date}` (YYYY/MM/DD).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadVariant {
    fields: Vec<(String, String)>,
}

impl PayloadVariant {
    pub fn new(fields: &BTreeMap<String, String>) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn render(&self, code: &str, query_type: &str, date: NaiveDate) -> Vec<(String, String)> {
        let date = date.format("%Y/%m/%d").to_string();
        self.fields
            .iter()
            .map(|(k, v)| {
                let value = v
                    .replace("{code}", code)
                    .replace("{query_type}", query_type)
                    .replace("{date}", &date);
                (k.clone(), value)
            })
            .collect()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(k, _)| k.as_str()).collect()
    }
}

pub struct ReportFetcher<'a> {
    transport: &'a dyn Transport,
    report_url: String,
    query_type: String,
    markers: Vec<String>,
    variants: Vec<PayloadVariant>,
}

impl<'a> ReportFetcher<'a> {
    pub fn new(transport: &'a dyn Transport, config: &ExchangeConfig) -> Self {
        Self {
            transport,
            report_url: config.report_url.clone(),
            query_type: config.query_type.clone(),
            markers: config.report_markers.clone(),
            variants: config
                .payload_variants
                .iter()
                .map(PayloadVariant::new)
                .collect(),
        }
    }

    fn recognizable(&self, body: &str) -> bool {
        self.markers.iter().any(|m| body.contains(m.as_str()))
    }

    /// Raw report for `code`.
    ///
    /// Returns the first successful response carrying a report marker. When
    /// no variant is recognized the last response body is returned as-is
    /// (possibly empty) for the parser to reject. `Err` only when no variant
    /// got any response at all.
    pub async fn fetch(&self, code: &str, date: NaiveDate) -> Result<String, ExtractError> {
        let mut last_body: Option<String> = None;
        let mut last_error: Option<String> = None;

        for (i, variant) in self.variants.iter().enumerate() {
            let form = variant.render(code, &self.query_type, date);
            debug!(
                "Querying {} with variant {} {:?}",
                code,
                i,
                variant.field_names()
            );

            match self.transport.post_form(&self.report_url, &form).await {
                Ok(response) => {
                    if response.is_success() && self.recognizable(&response.body) {
                        info!("Report for {} accepted on variant {}", code, i);
                        return Ok(response.body);
                    }
                    debug!(
                        "Variant {} for {} not recognized (HTTP {}, {} bytes)",
                        i,
                        code,
                        response.status,
                        response.body.len()
                    );
                    last_body = Some(response.body);
                }
                Err(e) => {
                    warn!("Variant {} for {} failed: {:#}", i, code, e);
                    last_error = Some(format!("{:#}", e));
                }
            }
        }

        match (last_body, last_error) {
            (Some(body), _) => Ok(body),
            (None, Some(error)) => Err(ExtractError::Fetch(error)),
            (None, None) => Err(ExtractError::fetch("no payload variants configured")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MockTransport;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()
    }

    #[test]
    fn test_render_substitutes_templates() {
        let mut fields = BTreeMap::new();
        fields.insert("commodityId".to_string(), "{code}".to_string());
        fields.insert("queryType".to_string(), "{query_type}".to_string());
        fields.insert("queryDate".to_string(), "{date}".to_string());
        fields.insert("goDay".to_string(), "".to_string());

        let form = PayloadVariant::new(&fields).render("CDF", "1", date());
        assert!(form.contains(&("commodityId".to_string(), "CDF".to_string())));
        assert!(form.contains(&("queryType".to_string(), "1".to_string())));
        assert!(form.contains(&("queryDate".to_string(), "2025/01/09".to_string())));
        assert!(form.contains(&("goDay".to_string(), "".to_string())));
    }

    #[tokio::test]
    async fn test_first_recognized_variant_wins() {
        let transport = MockTransport::new().with_report("CDF", "<table><tr><td>所有契約</td></tr></table>");
        let config = ExchangeConfig::default();
        let fetcher = ReportFetcher::new(&transport, &config);

        let body = fetcher.fetch("CDF", date()).await.unwrap();
        assert!(body.contains("所有契約"));
        assert_eq!(transport.posts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_falls_through_to_accepted_shape() {
        let transport = MockTransport::new()
            .with_report("CDF", "<p>所有契約</p>")
            .accepting_field("commodityId");
        let config = ExchangeConfig::default();
        let fetcher = ReportFetcher::new(&transport, &config);

        fetcher.fetch("CDF", date()).await.unwrap();
        let posts = transport.posts().await;
        assert_eq!(posts.len(), 2);
        assert!(posts[1].contains(&"commodityId".to_string()));
        assert!(!posts[0].contains(&"commodityId".to_string()));
    }

    #[tokio::test]
    async fn test_unrecognized_returns_last_body() {
        let transport = MockTransport::new()
            .with_report("CDF", "<p>所有契約</p>")
            .accepting_field("commodity_code");
        let config = ExchangeConfig::default();
        let fetcher = ReportFetcher::new(&transport, &config);

        let body = fetcher.fetch("CDF", date()).await.unwrap();
        assert!(!body.contains("契約"));
        assert_eq!(transport.posts().await.len(), config.payload_variants.len());
    }

    #[tokio::test]
    async fn test_network_failure_on_every_variant() {
        let transport = MockTransport::new().failing_report("CDF");
        let config = ExchangeConfig::default();
        let fetcher = ReportFetcher::new(&transport, &config);

        let err = fetcher.fetch("CDF", date()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Fetch(ref msg) if msg.contains("timed out")));
    }
}
