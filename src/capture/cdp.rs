//! Chrome DevTools Protocol session (uses the `headless_chrome` crate)

use super::{BrowserSession, SessionLauncher};
use crate::{codec, CaptureConfig, Error, RasterImage, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// Measures the document; `body` can be missing on non-HTML documents.
const CONTENT_HEIGHT_SCRIPT: &str = r#"
(function() {
    const el = document.body || document.documentElement;
    return el ? el.scrollHeight : 0;
})()
"#;

/// `Emulation.setDeviceMetricsOverride` with only the required fields set.
///
/// Built from its protocol JSON: the optional field list grows with every
/// Chrome protocol revision, and absent fields deserialize to `None`.
fn viewport_command(width: u32, height: u32, device_scale_factor: f64) -> Result<Emulation::SetDeviceMetricsOverride> {
    serde_json::from_value(serde_json::json!({
        "width": width,
        "height": height,
        "deviceScaleFactor": device_scale_factor,
        "mobile": false,
    }))
    .map_err(|e| Error::CaptureFailed(format!("Failed to build viewport command: {}", e)))
}

/// Launches one headless Chrome per session.
#[derive(Debug, Default, Clone, Copy)]
pub struct CdpLauncher;

impl SessionLauncher for CdpLauncher {
    type Session = CdpSession;

    fn launch(&self, config: &CaptureConfig) -> Result<CdpSession> {
        CdpSession::open(config)
    }
}

/// A headless Chrome process with a single tab.
pub struct CdpSession {
    browser: Browser,
    tab: Arc<Tab>,
}

impl CdpSession {
    pub fn open(config: &CaptureConfig) -> Result<Self> {
        let args: Vec<&OsStr> = config.browser_args.iter().map(OsStr::new).collect();
        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((crate::DEFAULT_WIDTH, config.seed_height)))
            .args(args)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        // Bounds navigation waits; there is no other timeout on the load event
        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        if let Some(ua) = &config.user_agent {
            tab.set_user_agent(ua, None, None)
                .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))?;
        }

        Ok(Self { browser, tab })
    }
}

impl BrowserSession for CdpSession {
    fn set_viewport(&mut self, width: u32, height: u32, device_scale_factor: f64) -> Result<()> {
        debug!("setting viewport to {}x{} @{}", width, height, device_scale_factor);
        self.tab
            .call_method(viewport_command(width, height, device_scale_factor)?)
            .map_err(|e| Error::CaptureFailed(format!("Failed to set viewport: {}", e)))?;
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::NavigationFailed(format!("{}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::NavigationFailed(format!("Wait for navigation of {} failed: {}", url, e)))?;
        Ok(())
    }

    fn content_height(&mut self) -> Result<u32> {
        let eval = self
            .tab
            .evaluate(CONTENT_HEIGHT_SCRIPT, false)
            .map_err(|e| Error::CaptureFailed(format!("Failed to measure content height: {}", e)))?;

        let value = eval
            .value
            .ok_or_else(|| Error::CaptureFailed("No value returned from content height query".into()))?;

        // scrollHeight is an integer, but don't trust the JSON number kind
        let height = value
            .as_f64()
            .ok_or_else(|| Error::CaptureFailed(format!("Content height is not a number: {}", value)))?;
        Ok(height.max(0.0).ceil() as u32)
    }

    fn screenshot(&mut self) -> Result<RasterImage> {
        let png_data = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| Error::CaptureFailed(format!("Screenshot failed: {}", e)))?;

        codec::decode(&png_data)
    }

    fn close(self) -> Result<()> {
        let closed = self.tab.close(false);
        // Dropping the browser terminates the child process
        drop(self.browser);
        closed.map_err(|e| Error::CaptureFailed(format!("Failed to close tab: {}", e)))?;
        Ok(())
    }
}
