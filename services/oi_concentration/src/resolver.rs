//! Ticker → exchange contract code resolution from the listing page

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::exchange::Transport;
use crate::report::parse_rows;

/// Rows shorter than this are layout noise (titles, notes).
const MIN_LISTING_CELLS: usize = 3;

pub struct ContractCodeResolver<'a> {
    transport: &'a dyn Transport,
    listing_url: String,
    code_suffix: char,
}

impl<'a> ContractCodeResolver<'a> {
    pub fn new(transport: &'a dyn Transport, listing_url: &str, code_suffix: char) -> Self {
        Self {
            transport,
            listing_url: listing_url.to_string(),
            code_suffix,
        }
    }

    /// Mapping for the requested tickers only. A failed listing fetch yields
    /// an empty map; the run carries on and reports every ticker as unmapped.
    pub async fn resolve(&self, tickers: &[String]) -> HashMap<String, String> {
        match self.fetch_listing().await {
            Ok(html) => {
                let wanted: HashSet<&str> = tickers.iter().map(String::as_str).collect();
                let mapping: HashMap<String, String> = scan_listing(&html, self.code_suffix)
                    .into_iter()
                    .filter(|(ticker, _)| wanted.contains(ticker.as_str()))
                    .collect();
                info!(
                    "Resolved {}/{} tickers to contract codes",
                    mapping.len(),
                    tickers.len()
                );
                mapping
            }
            Err(e) => {
                warn!("Contract listing unavailable, no codes resolved: {:#}", e);
                HashMap::new()
            }
        }
    }

    async fn fetch_listing(&self) -> Result<String> {
        let response = self
            .transport
            .get(&self.listing_url)
            .await
            .context("Failed to fetch contract listing")?;
        if !response.is_success() {
            anyhow::bail!("Contract listing returned HTTP {}", response.status);
        }
        Ok(response.body)
    }
}

/// Every ticker/code pair found on the same listing row. The first row
/// naming a ticker wins, so the standard contract shadows later variants.
pub fn scan_listing(html: &str, code_suffix: char) -> HashMap<String, String> {
    let mut mapping = HashMap::new();
    let (Ok(ticker_re), Ok(code_re)) = (Regex::new(r"^\d{4}$"), Regex::new(r"^[A-Z0-9]{2,4}$"))
    else {
        return mapping;
    };

    for row in parse_rows(html) {
        let texts = row.texts();
        if texts.len() < MIN_LISTING_CELLS {
            continue;
        }

        let ticker = texts.iter().find(|t| ticker_re.is_match(t));
        let code = texts
            .iter()
            .find(|t| code_re.is_match(t) && t.ends_with(code_suffix));

        if let (Some(ticker), Some(code)) = (ticker, code) {
            mapping
                .entry(ticker.clone())
                .or_insert_with(|| code.clone());
        }
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::mock::listing_html;
    use crate::exchange::MockTransport;

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_scan_listing_pairs_on_same_row() {
        let html = listing_html(&[("2330", "CDF", "台積電"), ("2317", "DHF", "鴻海")]);
        let mapping = scan_listing(&html, 'F');
        assert_eq!(mapping.get("2330").map(String::as_str), Some("CDF"));
        assert_eq!(mapping.get("2317").map(String::as_str), Some("DHF"));
    }

    #[test]
    fn test_scan_listing_requires_both_tokens() {
        let html = r#"<table>
            <tr><td>2330</td><td>台積電</td><td>上市</td></tr>
            <tr><td>CKF</td><td>緯創</td><td>上市</td></tr>
            <tr><td>3231</td><td>CKX</td><td>緯創</td></tr>
            <tr><td>2382</td><td>CMF</td></tr>
        </table>"#;
        assert!(scan_listing(html, 'F').is_empty());
    }

    #[test]
    fn test_scan_listing_first_row_wins() {
        let html = listing_html(&[("2330", "CDF", "台積電"), ("2330", "QFF", "小型台積電")]);
        assert_eq!(scan_listing(&html, 'F')["2330"], "CDF");
    }

    #[test]
    fn test_scan_listing_alphanumeric_codes() {
        let html = listing_html(&[("6446", "Q1F", "藥華藥")]);
        assert_eq!(scan_listing(&html, 'F')["6446"], "Q1F");
    }

    #[tokio::test]
    async fn test_resolve_filters_to_requested_tickers() {
        let transport = MockTransport::new().with_listing(listing_html(&[
            ("2330", "CDF", "台積電"),
            ("2603", "CZF", "長榮"),
        ]));
        let resolver = ContractCodeResolver::new(&transport, "http://listing", 'F');
        let mapping = resolver.resolve(&tickers(&["2330", "2317"])).await;
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["2330"], "CDF");
    }

    #[tokio::test]
    async fn test_resolve_degrades_to_empty_on_failure() {
        let transport = MockTransport::new();
        let resolver = ContractCodeResolver::new(&transport, "http://listing", 'F');
        assert!(resolver.resolve(&tickers(&["2330"])).await.is_empty());
    }
}
