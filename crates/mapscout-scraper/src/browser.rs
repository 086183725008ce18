//! Stealth browser session over chromiumoxide.
//!
//! Launches Chrome with the automation fingerprint dialed down (blink
//! automation flag off, randomized desktop user agent and viewport), then
//! hardens every page at the CDP level: user-agent/timezone/geolocation
//! overrides, an init script masking the usual `navigator` tells, and
//! optional request blocking for images, fonts, and map tiles.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetGeolocationOverrideParams, SetTimezoneOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetBlockedUrLsParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;

use mapscout_core::AppConfig;

use crate::dom::{DomError, DomReader};
use crate::error::ScraperError;

/// Realistic desktop Chrome user agents (Windows and Mac).
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 11.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
];

/// Common desktop viewport sizes.
const VIEWPORTS: &[(u32, u32)] = &[
    (1920, 1080),
    (1366, 768),
    (1536, 864),
    (1440, 900),
    (1280, 720),
    (1600, 900),
    (1680, 1050),
    (2560, 1440),
];

/// Resource patterns blocked when `BLOCK_IMAGES` is on: image and font
/// payloads plus the Maps photo and tile services, which dominate transfer
/// size and contribute nothing to extraction.
const BLOCKED_URL_PATTERNS: &[&str] = &[
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.svg",
    "*.ico",
    "*.webp",
    "*.woff",
    "*.woff2",
    "*.ttf",
    "*.otf",
    "*maps.googleapis.com/maps/api/js/GeoPhotoService*",
    "*maps.googleapis.com/maps/vt*",
];

/// Init script masking the common automation tells. Runs before any page
/// script on every navigation.
const STEALTH_SCRIPT: &str = r#"
// Remove the webdriver property
Object.defineProperty(navigator, 'webdriver', {
    get: () => undefined
});

// Plausible plugin list
Object.defineProperty(navigator, 'plugins', {
    get: () => [
        { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer', description: 'Portable Document Format', length: 1 },
        { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai', description: 'Portable Document Format', length: 1 },
        { name: 'Native Client', filename: 'internal-nacl-plugin', description: 'Native Client Executable', length: 1 }
    ]
});

Object.defineProperty(navigator, 'languages', {
    get: () => ['en-US', 'en', 'es']
});

Object.defineProperty(navigator, 'platform', {
    get: () => 'Win32'
});

Object.defineProperty(navigator, 'hardwareConcurrency', {
    get: () => 8
});

Object.defineProperty(navigator, 'deviceMemory', {
    get: () => 8
});

// Headless Chrome answers 'denied' for notifications without a prompt
const originalQuery = window.navigator.permissions.query;
window.navigator.permissions.query = (parameters) => (
    parameters.name === 'notifications'
        ? Promise.resolve({ state: Notification.permission })
        : originalQuery(parameters)
);

// chrome runtime object exists on real Chrome
window.chrome = {
    runtime: {},
    loadTimes: function() {},
    csi: function() {},
    app: {}
};
"#;

/// How often [`ChromiumDom::wait_for_selector`] re-polls the document.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One launched browser with a fixed identity (user agent + viewport picked
/// at launch and applied to every page, so all tabs tell the same story).
pub struct StealthSession {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    user_agent: &'static str,
    block_images: bool,
}

impl StealthSession {
    /// Launches a hardened Chrome instance.
    ///
    /// # Errors
    ///
    /// [`ScraperError::Launch`] when the browser binary cannot be started or
    /// configured.
    pub async fn launch(config: &AppConfig) -> Result<Self, ScraperError> {
        let (width, height) = VIEWPORTS[rand::random_range(0..VIEWPORTS.len())];
        let user_agent = USER_AGENTS[rand::random_range(0..USER_AGENTS.len())];

        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .args(vec![
                "--disable-blink-features=AutomationControlled",
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-infobars",
                "--disable-extensions",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--lang=en-US",
            ]);
        builder = if config.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };

        let browser_config = builder.build().map_err(|e| ScraperError::Launch {
            reason: format!("browser config: {e}"),
        })?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            ScraperError::Launch {
                reason: e.to_string(),
            }
        })?;

        // Drain CDP events for the life of the browser; the stream ending
        // means Chrome is gone.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser event error");
                }
            }
            tracing::debug!("browser event handler ended");
        });

        tracing::info!(user_agent, width, height, headless = config.headless, "browser launched");

        Ok(Self {
            browser,
            handler_task,
            user_agent,
            block_images: config.block_images,
        })
    }

    /// Opens a new hardened page in this session.
    ///
    /// # Errors
    ///
    /// [`ScraperError::Launch`] when the page cannot be created or the CDP
    /// overrides cannot be applied.
    pub async fn new_page(&self) -> Result<ChromiumDom, ScraperError> {
        let page_err = |context: &str, e: CdpError| ScraperError::Launch {
            reason: format!("{context}: {e}"),
        };

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| page_err("new page", e))?;

        let ua_override = SetUserAgentOverrideParams::builder()
            .user_agent(self.user_agent)
            .accept_language("en-US,en")
            .platform("Win32")
            .build()
            .map_err(|e| ScraperError::Launch {
                reason: format!("user agent override: {e}"),
            })?;
        page.execute(ua_override)
            .await
            .map_err(|e| page_err("user agent override", e))?;

        page.execute(SetTimezoneOverrideParams::new("America/New_York"))
            .await
            .map_err(|e| page_err("timezone override", e))?;

        let geolocation = SetGeolocationOverrideParams::builder()
            .latitude(40.7128)
            .longitude(-74.0060)
            .accuracy(100.0)
            .build();
        page.execute(geolocation)
            .await
            .map_err(|e| page_err("geolocation override", e))?;

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(|e| page_err("stealth script", e))?;

        if self.block_images {
            let patterns = BLOCKED_URL_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect();
            page.execute(SetBlockedUrLsParams::new(patterns))
                .await
                .map_err(|e| page_err("resource blocking", e))?;
        }

        Ok(ChromiumDom { page })
    }

    /// Shuts the browser down. Must be called exactly once per launched
    /// session; the engine entry point guarantees it on every exit path.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "browser close failed");
        }
        self.handler_task.abort();
        tracing::debug!("browser session closed");
    }
}

/// [`DomReader`] over one chromiumoxide [`Page`].
pub struct ChromiumDom {
    page: Page,
}

/// Maps a CDP failure for `target` onto the engine's error taxonomy.
///
/// chromiumoxide does not expose structured node errors, so detachment and
/// lookup failures are classified by message. Unrecognized failures stay
/// protocol errors (non-transient).
fn classify_cdp(target: &str, err: &CdpError) -> DomError {
    if matches!(err, CdpError::Timeout) {
        return DomError::Timeout {
            target: target.to_owned(),
            waited_ms: 0,
        };
    }
    let message = err.to_string();
    if message.contains("detached") {
        DomError::Detached {
            selector: target.to_owned(),
        }
    } else if message.contains("Could not find node") || message.contains("No node") {
        DomError::NotFound {
            selector: target.to_owned(),
        }
    } else {
        DomError::Protocol(message)
    }
}

#[async_trait]
impl DomReader for ChromiumDom {
    async fn goto(&self, url: &str) -> Result<(), DomError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| classify_cdp(url, &e))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| classify_cdp(url, &e))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), DomError> {
        let start = std::time::Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(DomError::Timeout {
                    target: selector.to_owned(),
                    waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn query_selector_all(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<String>, DomError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| classify_cdp(selector, &e))?;

        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            // A node can detach between the query and the read while the
            // feed re-renders; skip it and let the next scroll pick it up.
            if let Ok(Some(value)) = element.attribute(attribute).await {
                values.push(value);
            }
        }
        Ok(values)
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>, DomError> {
        let Ok(element) = self.page.find_element(selector).await else {
            return Ok(None);
        };
        match element.inner_text().await {
            Ok(text) => Ok(text),
            Err(e) => Err(classify_cdp(selector, &e)),
        }
    }

    async fn attribute_of(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, DomError> {
        let Ok(element) = self.page.find_element(selector).await else {
            return Ok(None);
        };
        match element.attribute(attribute).await {
            Ok(value) => Ok(value),
            Err(e) => Err(classify_cdp(selector, &e)),
        }
    }

    async fn scroll_by(&self, container: &str, delta_y: f64) -> Result<(), DomError> {
        let selector_js =
            serde_json::to_string(container).map_err(|e| DomError::Protocol(e.to_string()))?;
        let script = format!(
            "(() => {{ const el = document.querySelector({selector_js}); if (el) {{ el.scrollTop += {delta_y}; }} }})()"
        );
        self.page
            .evaluate(script)
            .await
            .map_err(|e| classify_cdp(container, &e))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), DomError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| classify_cdp(selector, &e))?;
        element
            .click()
            .await
            .map_err(|e| classify_cdp(selector, &e))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<Option<String>, DomError> {
        self.page
            .url()
            .await
            .map_err(|e| DomError::Protocol(e.to_string()))
    }
}
