pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ScraperConfig;
use crate::models::{Company, ExtractedTable};
use crate::utils::error::ScrapeError;
use async_trait::async_trait;
use tracing::debug;

use self::http_client::Session;
use self::parsers::parse_statement;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable statement source abstraction.
#[async_trait]
pub trait StatementSource: Send + Sync {
    async fn fetch_statement(&self, company: &Company) -> Result<ExtractedTable, ScrapeError>;
}

// ── screener.in scraper ───────────────────────────────────────────────────────

pub struct ScreenerScraper {
    session: Session,
    heading_tag: String,
    section_title: String,
}

impl ScreenerScraper {
    pub fn new(session: Session, config: &ScraperConfig) -> Self {
        Self {
            session,
            heading_tag: config.heading_tag.clone(),
            section_title: config.section_title.clone(),
        }
    }
}

#[async_trait]
impl StatementSource for ScreenerScraper {
    async fn fetch_statement(&self, company: &Company) -> Result<ExtractedTable, ScrapeError> {
        let html = self.session.get_text(&company.url).await?;
        let table = parse_statement(&html, &self.heading_tag, &self.section_title)?;
        debug!(
            "{}: {} periods x {} rows",
            company.id,
            table.periods.len(),
            table.rows.len()
        );
        Ok(table)
    }
}
