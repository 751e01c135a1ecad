use std::path::PathBuf;

use clap::Parser;
use gigcrawl::{
    runner::{CrawlOptions, Runner},
    types::CrawlerError,
};
use log::info;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Paginated listing crawler", long_about = None)]
struct Args {
    /// Category segment of the listing to fetch, e.g. "portfolio"
    category: String,
    /// Total number of listing pages to crawl
    #[arg(short = 'p', long, default_value_t = 20)]
    pages: u32,
    /// Destination CSV file, created or truncated at startup
    #[arg(short = 'o', long, default_value = "results.csv")]
    output: PathBuf,
    /// Show the browser window instead of running headless
    #[arg(long, default_value_t = false)]
    headful: bool,
    /// Maximum time in seconds the browser will wait for an event
    #[arg(long, default_value_t = 45)]
    browser_timeout: u64,
    /// Skip attaching the ad/tracker request filter
    #[arg(long, default_value_t = false)]
    no_request_filtering: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let options = CrawlOptions::default_builder()
        .category(args.category)
        .total_pages(args.pages)
        .output_path(args.output)
        .headless(!args.headful)
        .browser_timeout(args.browser_timeout)
        .with_request_filtering(!args.no_request_filtering)
        .build()?;

    let runner = Runner::new(options)?;

    // the crawl is its own task; keeping the handle keeps its outcome observable
    let crawl = runner.spawn_crawl();

    match crawl.await? {
        Ok(report) => {
            info!(
                "done: {} rows from {} pages, {} pages failed, {} cards skipped",
                report.records_written,
                report.pages_crawled,
                report.failed_pages.len(),
                report.cards_skipped
            );
            Ok(())
        }
        Err(e) => match e.downcast_ref::<CrawlerError>() {
            Some(CrawlerError::EarlyTermination) => {
                info!("crawl interrupted, keeping the rows written so far");
                Ok(())
            }
            _ => Err(e),
        },
    }
}
