use anyhow::Result;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ExtractError;
use crate::exchange::Transport;
use crate::fetcher::ReportFetcher;
use crate::history::{merge, HistoryStore};
use crate::report::{band_inconsistencies, parse_report, ParsedReport};
use crate::resolver::ContractCodeResolver;
use crate::schema::{ContractSnapshot, DailyDocument, PersistedState, SnapshotData, Target};
use crate::text::yyyymmdd;

/// One batch run: resolve codes, query each target in turn, fold the day
/// into the persisted history.
pub struct Pipeline {
    config: Config,
    transport: Box<dyn Transport>,
}

impl Pipeline {
    pub fn new(config: Config, transport: Box<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub async fn run(&self, today: NaiveDate) -> Result<PersistedState> {
        let document = self.collect(today).await;

        let store = HistoryStore::new(&self.config.output_path);
        let state = merge(store.load(), document);
        store.save(&state)?;
        Ok(state)
    }

    /// Today's document; one item per target, in configured order.
    pub async fn collect(&self, today: NaiveDate) -> DailyDocument {
        info!(
            "Collecting {} targets via {}",
            self.config.targets.len(),
            self.transport.name()
        );

        let tickers: Vec<String> = self
            .config
            .targets
            .iter()
            .map(|t| t.ticker.clone())
            .collect();
        let resolver = ContractCodeResolver::new(
            self.transport.as_ref(),
            &self.config.exchange.listing_url,
            self.config.exchange.code_suffix,
        );
        let codes = resolver.resolve(&tickers).await;

        let fetcher = ReportFetcher::new(self.transport.as_ref(), &self.config.exchange);
        let mut items = Vec::with_capacity(self.config.targets.len());
        let mut report_date: Option<String> = None;

        for target in &self.config.targets {
            let Some(code) = codes.get(&target.ticker) else {
                warn!("{} ({}): no contract code", target.name, target.ticker);
                let err = ExtractError::CodeMissing {
                    ticker: target.ticker.clone(),
                };
                items.push(ContractSnapshot::new(target, None, err.into()));
                continue;
            };

            self.pause().await;

            let data = match self.extract(&fetcher, target, code, today).await {
                Ok(report) => {
                    report_date.get_or_insert(report.date);
                    SnapshotData::Normalized(report.data)
                }
                Err(e) => {
                    warn!("{} ({} / {}): {}", target.name, target.ticker, code, e);
                    e.into()
                }
            };
            items.push(ContractSnapshot::new(target, Some(code.clone()), data));
        }

        let date = report_date.unwrap_or_else(|| yyyymmdd(today));
        info!(
            "Collected {} items for {} ({} failed)",
            items.len(),
            date,
            items.iter().filter(|i| i.data.is_error()).count()
        );
        DailyDocument { date, items }
    }

    async fn extract(
        &self,
        fetcher: &ReportFetcher<'_>,
        target: &Target,
        code: &str,
        today: NaiveDate,
    ) -> Result<ParsedReport, ExtractError> {
        let html = fetcher.fetch(code, today).await?;
        let report = parse_report(
            &html,
            &self.config.exchange.aggregate_label,
            &self.config.exchange.no_data_marker,
            today,
        )?;

        for issue in band_inconsistencies(&report.aggregate) {
            warn!("{} ({}): {}", target.name, code, issue);
        }
        info!(
            "{} ({}): {:?} row, top5 net {}, top10 net {}, oi {}",
            target.name,
            code,
            report.row.dialect,
            report.data.top5.net,
            report.data.top10.net,
            report.data.oi
        );
        Ok(report)
    }

    async fn pause(&self) {
        if self.config.politeness_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.politeness_delay_ms)).await;
        }
    }
}
