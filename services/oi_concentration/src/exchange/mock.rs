use super::traits::{HttpResponse, Transport};
use crate::schema::Target;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

const QUERY_FORM_PAGE: &str =
    "<html><body><form><select name=\"commodity\"></select></form></body></html>";

/// In-process exchange serving canned listing and report pages.
pub struct MockTransport {
    listing: Option<String>,
    reports: HashMap<String, String>,
    failing_codes: HashSet<String>,
    accepted_field: Option<String>,
    posts: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            listing: None,
            reports: HashMap::new(),
            failing_codes: HashSet::new(),
            accepted_field: None,
            posts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Listing plus one grouped-layout report per target; codes follow
    /// target order and figures the ticker, so every run sees the same page.
    pub fn synthetic(targets: &[Target], date: &str) -> Self {
        let mut rows = Vec::new();
        let mut transport = Self::new();

        for (i, target) in targets.iter().enumerate() {
            let code = synthetic_code(i);
            let base: i64 = target.ticker.parse().unwrap_or(1000);
            let buy5 = base * 3;
            let sell5 = base * 2 + 17 * i as i64;
            let buy10 = buy5 + base;
            let sell10 = sell5 + base / 2;
            let oi = buy10 + sell10 + base * 5;
            let cells = [
                "所有契約".to_string(),
                fmt_thousands(buy5),
                "12.3%".to_string(),
                fmt_thousands(buy10),
                "18.0%".to_string(),
                fmt_thousands(sell5),
                "9.1%".to_string(),
                fmt_thousands(sell10),
                "14.2%".to_string(),
                fmt_thousands(oi),
            ];
            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            transport
                .reports
                .insert(code.clone(), grouped_report_html(date, &target.name, &cells));
            rows.push((target.ticker.clone(), code, target.name.clone()));
        }

        let rows: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|(t, c, n)| (t.as_str(), c.as_str(), n.as_str()))
            .collect();
        transport.listing = Some(listing_html(&rows));
        transport
    }

    pub fn with_listing(mut self, html: impl Into<String>) -> Self {
        self.listing = Some(html.into());
        self
    }

    pub fn with_report(mut self, code: &str, html: impl Into<String>) -> Self {
        self.reports.insert(code.to_string(), html.into());
        self
    }

    /// Requests for `code` fail as if the network dropped.
    pub fn failing_report(mut self, code: &str) -> Self {
        self.failing_codes.insert(code.to_string());
        self
    }

    /// Only forms carrying the code under `field` get the report page;
    /// any other shape gets the bare query form back.
    pub fn accepting_field(mut self, field: &str) -> Self {
        self.accepted_field = Some(field.to_string());
        self
    }

    /// Field names of every POST received, in order.
    pub async fn posts(&self) -> Vec<Vec<String>> {
        self.posts.lock().await.clone()
    }

    fn requested_code<'a>(&self, form: &'a [(String, String)]) -> Option<&'a str> {
        form.iter()
            .filter(|(k, _)| match &self.accepted_field {
                Some(field) => k == field,
                None => true,
            })
            .map(|(_, v)| v.as_str())
            .find(|v| self.reports.contains_key(*v) || self.failing_codes.contains(*v))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        match &self.listing {
            Some(html) => Ok(HttpResponse::ok(html.clone())),
            None => anyhow::bail!("mock: connection refused for {}", url),
        }
    }

    async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<HttpResponse> {
        self.posts
            .lock()
            .await
            .push(form.iter().map(|(k, _)| k.clone()).collect());

        match self.requested_code(form) {
            Some(code) if self.failing_codes.contains(code) => {
                anyhow::bail!("mock: timed out posting {} for {}", url, code)
            }
            Some(code) => Ok(HttpResponse::ok(
                self.reports.get(code).cloned().unwrap_or_default(),
            )),
            None => Ok(HttpResponse::ok(QUERY_FORM_PAGE)),
        }
    }
}

fn synthetic_code(index: usize) -> String {
    let first = (b'C' + (index / 26) as u8) as char;
    let second = (b'A' + (index % 26) as u8) as char;
    format!("{}{}F", first, second)
}

fn fmt_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

fn row_html(cells: &[&str]) -> String {
    let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
    format!("<tr>{}</tr>", tds)
}

/// Listing page of `(ticker, code, name)` rows.
pub fn listing_html(rows: &[(&str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(ticker, code, name)| row_html(&[*code, *ticker, *name, "1", "2,000"]))
        .collect();
    format!(
        "<html><body><table><tr><th>股票期貨英文代碼</th><th>證券代號</th><th>標的證券簡稱</th><th>上市</th><th>契約乘數</th></tr>{}</table></body></html>",
        body
    )
}

/// Report page with the aggregate label and values in one self-contained row.
pub fn flat_report_html(date: &str, cells: &[&str]) -> String {
    format!(
        "<html><body><h3>期貨大額交易人未沖銷部位結構表</h3><p>日期：{}</p><table class=\"table_f\"><tr><th>契約</th><th>買方前五大</th></tr>{}</table></body></html>",
        date,
        row_html(cells)
    )
}

/// Report page where the contract name spans the following rows and the
/// aggregate label sits alone in a later row.
pub fn grouped_report_html(date: &str, contract: &str, aggregate_cells: &[&str]) -> String {
    let weekly: Vec<&str> = std::iter::once("202501W2")
        .chain(std::iter::repeat("0").take(aggregate_cells.len().saturating_sub(1)))
        .collect();
    let monthly: Vec<&str> = std::iter::once("202501")
        .chain(std::iter::repeat("0").take(aggregate_cells.len().saturating_sub(1)))
        .collect();
    let first_tds: String = monthly.iter().map(|c| format!("<td>{}</td>", c)).collect();
    format!(
        "<html><body><h3>期貨大額交易人未沖銷部位結構表</h3><p>日期：{}</p><table class=\"table_f\"><tr><th rowspan=\"2\">契約名稱</th><th rowspan=\"2\">到期月份</th></tr><tr><th>部位數</th></tr><tr><td rowspan=\"3\">{}</td>{}</tr>{}{}</table></body></html>",
        date,
        contract,
        first_tds,
        row_html(&weekly),
        row_html(aggregate_cells)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_thousands() {
        assert_eq!(fmt_thousands(0), "0");
        assert_eq!(fmt_thousands(999), "999");
        assert_eq!(fmt_thousands(1_234_567), "1,234,567");
        assert_eq!(fmt_thousands(-12_000), "-12,000");
    }

    #[test]
    fn test_synthetic_codes_are_code_shaped() {
        assert_eq!(synthetic_code(0), "CAF");
        assert_eq!(synthetic_code(27), "DBF");
    }

    #[tokio::test]
    async fn test_mock_records_posts_and_fails_on_request() {
        let transport = MockTransport::new()
            .with_report("CDF", "<p>所有契約</p>")
            .failing_report("DHF");

        let ok = transport
            .post_form("http://x", &[("commodity_id".into(), "CDF".into())])
            .await
            .unwrap();
        assert!(ok.body.contains("所有契約"));

        let err = transport
            .post_form("http://x", &[("commodity_id".into(), "DHF".into())])
            .await;
        assert!(err.is_err());

        let posts = transport.posts().await;
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0], vec!["commodity_id".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_listing_is_network_error() {
        let transport = MockTransport::new();
        assert!(transport.get("http://listing").await.is_err());
    }
}
