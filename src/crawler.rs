use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    browser_controller::BrowserController,
    extractor,
    runner::CrawlOptions,
    scroll::{ScrollDirection, ScrollOptions, ScrollSpeed},
    sink::CsvSink,
    types::{CrawlReport, CrawlerError},
    utils::listing_page_url,
};

/// Walks the listing pages in ascending order against one browser session,
/// handing each page's records to the sink before the next page starts.
pub struct Crawler {
    browser: BrowserController,
    sink: CsvSink,
    options: CrawlOptions,
}

struct PageOutcome {
    records: usize,
    skipped: usize,
}

impl Crawler {
    pub fn new(browser: BrowserController, sink: CsvSink, options: CrawlOptions) -> Crawler {
        Crawler {
            browser,
            sink,
            options,
        }
    }

    pub fn crawl(mut self, should_terminate: Arc<AtomicBool>) -> Result<CrawlReport, CrawlerError> {
        let mut report = CrawlReport::default();

        for page in 1..=self.options.total_pages {
            if should_terminate.load(Ordering::Relaxed) {
                info!(
                    "termination requested, stopping with {} pages crawled",
                    report.pages_crawled
                );
                return Err(CrawlerError::EarlyTermination);
            }

            info!("crawling page {}...", page);
            match self.crawl_page(page, &should_terminate) {
                Ok(outcome) => {
                    report.pages_crawled += 1;
                    report.cards_skipped += outcome.skipped;
                    debug!(
                        "page {}: {} records written, {} cards skipped",
                        page, outcome.records, outcome.skipped
                    );
                }
                Err(CrawlerError::Navigation { page, reason }) => {
                    // one bad page must not cost the pages already written
                    warn!("skipping page {}: {}", page, reason);
                    report.failed_pages.push(page);
                }
                Err(fatal) => return Err(fatal),
            }
        }

        report.records_written = self.sink.rows_written();
        info!(
            "crawl complete: {} rows across {} pages written to {}",
            report.records_written,
            report.pages_crawled,
            self.sink.path().display()
        );
        Ok(report)
    }

    fn crawl_page(
        &mut self,
        page: u32,
        should_terminate: &AtomicBool,
    ) -> Result<PageOutcome, CrawlerError> {
        let url = listing_page_url(&self.options.category, page);

        self.browser
            .goto(&url)
            .map_err(|e| CrawlerError::Navigation {
                page,
                reason: e.to_string(),
            })?;
        self.browser.settle_wait(
            self.options.min_wait_after_navigation,
            self.options.max_wait_after_navigation,
        );

        // cards further down only render once the viewport has passed them
        self.browser
            .scroll(&ScrollOptions {
                direction: ScrollDirection::Down,
                speed: ScrollSpeed::Slow,
                step_px: self.options.scroll_step_px,
                delay_slow_ms: self.options.scroll_delay_slow_ms,
                delay_fast_ms: self.options.scroll_delay_fast_ms,
                max_iterations: self.options.scroll_max_iterations,
            })
            .map_err(|e| CrawlerError::Navigation {
                page,
                reason: format!("scroll failed: {}", e),
            })?;

        let cards = self.browser.cards(&self.options.card_selector);
        if cards.is_empty() {
            info!("page {} has no card nodes", page);
        }

        let mut batch = Vec::with_capacity(cards.len());
        let mut skipped = 0;
        for (index, card) in cards.iter().enumerate() {
            if should_terminate.load(Ordering::Relaxed) {
                // keep what this page already produced before bailing out
                self.sink.append(&batch)?;
                return Err(CrawlerError::EarlyTermination);
            }
            match extractor::extract_record(card, page, index) {
                Ok(record) => batch.push(record),
                Err(CrawlerError::StaleCard {
                    page,
                    index,
                    reason,
                }) => {
                    warn!("skipping card {} on page {}: {}", index, page, reason);
                    skipped += 1;
                }
                Err(other) => return Err(other),
            }
        }

        let records = batch.len();
        self.sink.append(&batch)?;
        Ok(PageOutcome { records, skipped })
    }
}
