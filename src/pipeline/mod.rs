//! Pipeline orchestrator: login → per-company scrape → reshape → clean → CSV.
//!
//! ## Scrape run
//!
//!   1. Log in once. A missing token or a wrong landing page aborts the run
//!      before any company page is requested.
//!   2. For each configured company, in order: fetch the statement page,
//!      extract the "Profit & Loss" table, transpose it into one record per
//!      period and clean every cell. A failure only skips that company.
//!   3. Write every collected record to the CSV artifact, overwriting it.
//!
//! Loading the artifact into the database is a separate invocation
//! (`crate::loader::load`).

pub mod reshape;

use crate::config::{AppConfig, Credentials};
use crate::loader::csv_sink::write_csv;
use crate::models::{Company, Dataset, PeriodRecord};
use crate::scraper::cleaner::clean_record;
use crate::scraper::http_client::Authenticator;
use crate::scraper::{ScreenerScraper, StatementSource};
use crate::utils::error::ScrapeError;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use self::reshape::reshape;

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, credentials: &Credentials, csv_path: &Path) -> Result<PipelineStats> {
        // ── 1. Log in ─────────────────────────────────────────────────────────
        info!("=== Step 1: Logging in ===");
        let session = Authenticator::new(&self.config.scraper)
            .context("Failed to build HTTP client")?
            .login(credentials)
            .await
            .context("Login failed, aborting run")?;
        let source = ScreenerScraper::new(session, &self.config.scraper);

        // ── 2. Scrape every company ───────────────────────────────────────────
        info!("=== Step 2: Scraping {} companies ===", self.config.companies.len());
        let delay = Duration::from_millis(self.config.scraper.request_delay_ms);
        let outcomes = scrape_companies(&source, &self.config.companies, delay).await;

        // ── 3. Write the artifact ─────────────────────────────────────────────
        info!("=== Step 3: Writing {:?} ===", csv_path);
        let (dataset, stats) = collect(outcomes);
        write_csv(&dataset, csv_path)
            .with_context(|| format!("Failed to write {:?}", csv_path))?;

        info!(
            "=== Done: {} companies | {} records | {} skipped {:?} ===",
            stats.companies,
            stats.records,
            stats.failed.len(),
            stats.failed
        );
        Ok(stats)
    }
}

/// What happened to one company during a run.
#[derive(Debug)]
pub struct CompanyOutcome {
    pub company_id: String,
    pub result: Result<Vec<PeriodRecord>, ScrapeError>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub companies: usize,
    pub records: usize,
    /// Ids of companies that yielded no records.
    pub failed: Vec<String>,
}

/// Scrape companies one after another; a failure is recorded, not propagated.
pub async fn scrape_companies<S: StatementSource + ?Sized>(
    source: &S,
    companies: &[Company],
    delay: Duration,
) -> Vec<CompanyOutcome> {
    let mut outcomes = Vec::with_capacity(companies.len());

    for (i, company) in companies.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            sleep(delay).await;
        }

        let result = scrape_company(source, company).await;
        match &result {
            Ok(records) => info!("{}: {} periods", company.id, records.len()),
            Err(e) => warn!("{}: skipped ({})", company.id, e),
        }
        outcomes.push(CompanyOutcome { company_id: company.id.clone(), result });
    }

    outcomes
}

async fn scrape_company<S: StatementSource + ?Sized>(
    source: &S,
    company: &Company,
) -> Result<Vec<PeriodRecord>, ScrapeError> {
    let table = source.fetch_statement(company).await?;
    let mut records = reshape(table, &company.id)?;
    records.iter_mut().for_each(clean_record);
    Ok(records)
}

/// Flatten outcomes into the dataset, in company order.
pub fn collect(outcomes: Vec<CompanyOutcome>) -> (Dataset, PipelineStats) {
    let mut dataset = Dataset::default();
    let mut stats = PipelineStats { companies: outcomes.len(), ..Default::default() };

    for outcome in outcomes {
        match outcome.result {
            Ok(records) => dataset.extend(records),
            Err(_) => stats.failed.push(outcome.company_id),
        }
    }
    stats.records = dataset.len();
    (dataset, stats)
}
