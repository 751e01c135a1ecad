use std::{
    path::PathBuf,
    sync::{atomic::AtomicBool, Arc},
};

use signal_hook::consts::{SIGINT, SIGTERM};
use tokio::task::{self, JoinHandle};

use crate::{
    browser_controller::BrowserController,
    crawler::Crawler,
    sink::CsvSink,
    types::{CrawlReport, CrawlerError},
    utils::{CARD_SELECTOR, DEFAULT_OUTPUT_PATH},
};

/// Owns the run's lifecycle: signal wiring, session setup (browser + sink)
/// and the crawl task itself.
pub struct Runner {
    options: CrawlOptions,
    should_terminate: Arc<AtomicBool>,
}

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct CrawlOptions {
    /// category segment identifying the listing to crawl
    pub category: String,
    // the site paginates a known, fixed number of pages; end-of-results is
    // not detected
    #[builder(default = "20")]
    pub total_pages: u32,
    #[builder(default = "self.default_output_path()")]
    pub output_path: PathBuf,
    #[builder(default = "self.default_card_selector()")]
    pub card_selector: String,
    #[builder(default = "true")]
    pub headless: bool,
    // maximum time in seconds the browser will wait for an event
    #[builder(default = "45")]
    pub browser_timeout: u64,
    // bounds in seconds for the randomized settle wait after navigation
    #[builder(default = "3")]
    pub min_wait_after_navigation: u64,
    #[builder(default = "6")]
    pub max_wait_after_navigation: u64,
    #[builder(default = "100")]
    pub scroll_step_px: u32,
    #[builder(default = "150")]
    pub scroll_delay_slow_ms: u64,
    #[builder(default = "10")]
    pub scroll_delay_fast_ms: u64,
    #[builder(default = "2000")]
    pub scroll_max_iterations: u32,
    #[builder(default = "true")]
    pub with_request_filtering: bool,
}

impl CrawlOptions {
    pub fn default_builder() -> CrawlOptionsBuilder {
        CrawlOptionsBuilder::default()
    }
}

impl CrawlOptionsBuilder {
    fn default_output_path(&self) -> PathBuf {
        PathBuf::from(DEFAULT_OUTPUT_PATH)
    }
    fn default_card_selector(&self) -> String {
        CARD_SELECTOR.into()
    }
}

impl Runner {
    pub fn new(options: CrawlOptions) -> anyhow::Result<Self> {
        let should_terminate = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGTERM, Arc::clone(&should_terminate))?;
        signal_hook::flag::register(SIGINT, Arc::clone(&should_terminate))?;

        Ok(Runner {
            options,
            should_terminate,
        })
    }

    /// Starts the crawl as its own task and hands back the join handle, so
    /// the caller decides whether to await or detach it; either way the
    /// outcome stays observable.
    pub fn spawn_crawl(&self) -> JoinHandle<anyhow::Result<CrawlReport>> {
        let options = self.options.clone();
        let should_terminate = self.should_terminate.clone();
        // headless_chrome drives the tab synchronously, so the whole crawl
        // runs on a blocking thread
        task::spawn_blocking(move || Self::run(options, should_terminate))
    }

    fn run(
        options: CrawlOptions,
        should_terminate: Arc<AtomicBool>,
    ) -> anyhow::Result<CrawlReport> {
        info!(
            "initializing crawl of {:?}: {} pages into {}",
            options.category,
            options.total_pages,
            options.output_path.display()
        );

        let browser = BrowserController::new(options.headless, options.browser_timeout)
            .map_err(|e| CrawlerError::Session(e.to_string()))?;
        if options.with_request_filtering {
            browser.enable_request_filtering();
        }

        let sink = CsvSink::open(&options.output_path)?;

        let report = Crawler::new(browser, sink, options).crawl(should_terminate)?;
        Ok(report)
    }
}
