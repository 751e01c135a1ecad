use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("session: {0}")]
    Session(String),
    #[error("navigation to page {page} failed: {reason}")]
    Navigation { page: u32, reason: String },
    #[error("card {index} on page {page} went stale: {reason}")]
    StaleCard {
        page: u32,
        index: usize,
        reason: String,
    },
    #[error("write to {path} failed: {reason}")]
    Write { path: String, reason: String },
    #[error("early_termination")]
    EarlyTermination,
}

/// One extracted listing card. Fields serialize in the sink's column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRecord {
    pub picture: String,
    pub link: String,
    pub name: String,
    pub title: String,
    pub rating_score: Option<String>,
    pub rating_count: Option<String>,
    pub price: Option<String>,
}

/// Summary of a finished run.
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub pages_crawled: u32,
    pub failed_pages: Vec<u32>,
    pub records_written: usize,
    pub cards_skipped: usize,
}
