use anyhow::{anyhow, Context, Result};
use headless_chrome::protocol::cdp::Network;
use headless_chrome::{browser::default_executable, Browser, Element, LaunchOptions, Tab};
use rand::Rng;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};

use crate::scroll::{scroll_script, ScrollOptions};
use crate::utils::BLOCKED_URL_PATTERNS;

/// One browser process with a single tab, owned for the whole run. Pages and
/// cards are visited strictly in sequence, so one tab is all there is.
pub struct BrowserController {
    browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserController {
    pub fn new(headless: bool, timeout_secs: u64) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .path(Some(default_executable().map_err(|e| anyhow!(e))?))
            .headless(headless)
            .window_size(Some((1920, 1080)))
            .idle_browser_timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| anyhow!("could not assemble launch options: {}", e))?;
        let browser = Browser::new(options).context("browser launching error")?;

        let tab = browser.new_tab().context("could not create a tab")?;
        tab.set_default_timeout(Duration::from_secs(timeout_secs));

        Ok(BrowserController { browser, tab })
    }

    /// Attaches ad/tracker request blocking to the tab. Best effort: a
    /// failure here is logged and the crawl proceeds without it.
    pub fn enable_request_filtering(&self) {
        let result = self
            .tab
            .call_method(Network::Enable {
                max_total_buffer_size: None,
                max_resource_buffer_size: None,
                max_post_data_size: None,
                enable_durable_messages: None,
                report_direct_socket_traffic: None,
            })
            .and_then(|_| {
                self.tab
                    .call_method(Network::SetBlockedURLs {
                        urls: BLOCKED_URL_PATTERNS.clone(),
                    })
                    .map(|_| ())
            });
        match result {
            Ok(()) => debug!(
                "request filtering attached with {} patterns",
                BLOCKED_URL_PATTERNS.len()
            ),
            Err(e) => warn!("request filtering could not be attached, continuing: {}", e),
        }
    }

    pub fn goto(&self, url: &str) -> Result<()> {
        let nv = match self.tab.navigate_to(url) {
            Ok(t) => t,
            Err(e) => {
                warn!("could not navigate to {}, retrying: {}", url, e);
                self.tab.navigate_to(url)?
            }
        };
        if let Err(e) = nv.wait_until_navigated() {
            // we wait one more timeout
            warn!("error waiting for navigation, retrying: {}", e);
            nv.wait_until_navigated()?;
        }
        Ok(())
    }

    /// Lets the page settle after navigation for a randomized number of
    /// seconds within the given bounds.
    pub fn settle_wait(&self, min_secs: u64, max_secs: u64) {
        let secs = {
            let mut rng = rand::thread_rng();
            rng.gen_range(min_secs..=max_secs.max(min_secs))
        };
        debug!("sleeping for {} seconds", secs);
        thread::sleep(Duration::from_secs(secs));
    }

    /// Runs the scroll routine in the page and waits for it to signal
    /// completion. Retried once, matching navigation.
    pub fn scroll(&self, opts: &ScrollOptions) -> Result<()> {
        debug!("scrolling....");
        let script = scroll_script(opts);
        if let Err(e) = self.tab.evaluate(&script, true) {
            warn!("scrolling {} did not complete, retrying: {}", self.tab.get_url(), e);
            self.tab.evaluate(&script, true)?;
        }
        debug!("scrolling ended");
        Ok(())
    }

    /// All card nodes currently in the DOM, in document order. A failed
    /// query is logged and reads as an empty page.
    pub fn cards(&self, selector: &str) -> Vec<Element<'_>> {
        match self.tab.find_elements(selector) {
            Ok(elems) => elems,
            Err(e) => {
                warn!(
                    "no card nodes found with {:?} on {}: {}",
                    selector,
                    self.tab.get_url(),
                    e
                );
                vec![]
            }
        }
    }

    pub fn kill(&self) -> bool {
        let pid = match self.browser.get_process_id() {
            Some(pid) => pid,
            None => return false,
        };
        let s = System::new();
        if let Some(process) = s.process(Pid::from_u32(pid)) {
            debug!("killing browser process with id {}", pid);
            process.kill();
            return true;
        }
        false
    }
}

impl Drop for BrowserController {
    fn drop(&mut self) {
        debug!("killing browser process...");
        self.kill();
    }
}
