//! Adaptive full-page capture.
//!
//! Content height is unknown until the page has been laid out, so a capture
//! runs in two passes over one session: load at a seed viewport, measure the
//! document, resize the viewport to the content height and screenshot it.

#[cfg(feature = "cdp")]
pub mod cdp;

use crate::{CaptureConfig, CaptureRequest, Error, Height, RasterImage, Result};
use log::{debug, info, warn};

/// Height of the throwaway viewport used for the first layout pass.
pub const SEED_HEIGHT: u32 = 600;

/// One exclusively owned page session in a headless browser.
///
/// Calls are made strictly in sequence; an implementation never sees two
/// navigations at once.
pub trait BrowserSession {
    /// Set the viewport size in CSS pixels
    fn set_viewport(&mut self, width: u32, height: u32, device_scale_factor: f64) -> Result<()>;

    /// Navigate and block until the load event fires (or the session's timeout expires)
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Total scrollable height of the rendered document in CSS pixels
    fn content_height(&mut self) -> Result<u32>;

    /// Screenshot of the current viewport
    fn screenshot(&mut self) -> Result<RasterImage>;

    /// Close the session and release browser resources
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Opens fresh browser sessions.
pub trait SessionLauncher {
    type Session: BrowserSession;

    fn launch(&self, config: &CaptureConfig) -> Result<Self::Session>;
}

/// Launch a session and capture `request` with it.
pub fn capture<L: SessionLauncher>(launcher: &L, request: &CaptureRequest, config: &CaptureConfig) -> Result<RasterImage> {
    let session = launcher.launch(config)?;
    capture_with(session, request, config)
}

/// Capture `request` using an already open session. The session is closed on
/// every path, including failures.
pub fn capture_with<S: BrowserSession>(mut session: S, request: &CaptureRequest, config: &CaptureConfig) -> Result<RasterImage> {
    let outcome = run_protocol(&mut session, request, config);

    match (outcome, session.close()) {
        (Ok(image), Ok(())) => Ok(image),
        (Ok(image), Err(e)) => {
            warn!("failed to close browser session after capturing {}: {}", request.url, e);
            Ok(image)
        }
        (Err(e), close_res) => {
            if let Err(close_err) = close_res {
                warn!("failed to close browser session after error: {}", close_err);
            }
            Err(e)
        }
    }
}

fn run_protocol<S: BrowserSession>(session: &mut S, request: &CaptureRequest, config: &CaptureConfig) -> Result<RasterImage> {
    request.validate()?;
    let width = request.width;

    session.set_viewport(width, config.seed_height, 1.0)?;
    debug!("navigating to {} at {}x{}", request.url, width, config.seed_height);
    session.navigate(&request.url)?;

    let height = match request.height {
        Height::Fixed(h) => h,
        Height::Auto => {
            let measured = session.content_height()?;
            debug!("measured content height {} for {}", measured, request.url);
            if measured == 0 {
                warn!("{} reported zero content height, keeping seed height", request.url);
                config.seed_height
            } else {
                measured
            }
        }
    };

    session.set_viewport(width, height, 1.0)?;
    let image = session.screenshot()?;
    if image.dimensions() != (width, height) {
        // HiDPI or a clamped viewport; the caller's dimension check will catch it
        warn!(
            "screenshot of {} is {}x{}, requested viewport was {}x{}",
            request.url, image.width, image.height, width, height
        );
    }
    info!("captured {} at {}x{}", request.url, image.width, image.height);
    Ok(image)
}

impl CaptureRequest {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(Error::InvalidOptions("capture width must be greater than zero".into()));
        }
        if self.height == Height::Fixed(0) {
            return Err(Error::InvalidOptions("capture height must be greater than zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// A scripted session that records every call it receives.
    pub(crate) struct ScriptedSession {
        pub log: Arc<Mutex<Vec<String>>>,
        pub content_height: u32,
        pub fail_navigation: bool,
        pub fail_close: bool,
        viewport: (u32, u32),
    }

    impl ScriptedSession {
        pub(crate) fn new(log: Arc<Mutex<Vec<String>>>, content_height: u32) -> Self {
            Self {
                log,
                content_height,
                fail_navigation: false,
                fail_close: false,
                viewport: (0, 0),
            }
        }

        fn record(&self, entry: String) {
            self.log.lock().unwrap().push(entry);
        }
    }

    impl BrowserSession for ScriptedSession {
        fn set_viewport(&mut self, width: u32, height: u32, dsf: f64) -> Result<()> {
            self.record(format!("viewport {}x{}@{}", width, height, dsf));
            self.viewport = (width, height);
            Ok(())
        }

        fn navigate(&mut self, url: &str) -> Result<()> {
            self.record(format!("navigate {}", url));
            if self.fail_navigation {
                return Err(Error::NavigationFailed(format!("net::ERR_CONNECTION_REFUSED at {}", url)));
            }
            Ok(())
        }

        fn content_height(&mut self) -> Result<u32> {
            self.record("measure".to_string());
            Ok(self.content_height)
        }

        fn screenshot(&mut self) -> Result<RasterImage> {
            self.record("screenshot".to_string());
            Ok(RasterImage::filled(self.viewport.0, self.viewport.1, [0, 0, 255, 255]))
        }

        fn close(self) -> Result<()> {
            self.record("close".to_string());
            if self.fail_close {
                return Err(Error::CaptureFailed("browser already gone".into()));
            }
            Ok(())
        }
    }

    pub(crate) struct ScriptedLauncher {
        pub log: Arc<Mutex<Vec<String>>>,
        pub content_height: u32,
    }

    impl SessionLauncher for ScriptedLauncher {
        type Session = ScriptedSession;

        fn launch(&self, _config: &CaptureConfig) -> Result<ScriptedSession> {
            self.log.lock().unwrap().push("launch".to_string());
            Ok(ScriptedSession::new(self.log.clone(), self.content_height))
        }
    }

    fn calls(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn auto_height_measures_then_resizes() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let launcher = ScriptedLauncher { log: log.clone(), content_height: 2400 };
        let req = CaptureRequest::new("http://localhost/page");
        let img = capture(&launcher, &req, &CaptureConfig::default()).unwrap();

        assert_eq!(img.dimensions(), (1280, 2400));
        assert_eq!(
            calls(&log),
            vec![
                "launch",
                "viewport 1280x600@1",
                "navigate http://localhost/page",
                "measure",
                "viewport 1280x2400@1",
                "screenshot",
                "close",
            ]
        );
    }

    #[test]
    fn fixed_height_wins_over_measurement() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let session = ScriptedSession::new(log.clone(), 2400);
        let req = CaptureRequest {
            width: 800,
            height: Height::Fixed(300),
            ..CaptureRequest::new("http://localhost/")
        };
        let img = capture_with(session, &req, &CaptureConfig::default()).unwrap();

        assert_eq!(img.dimensions(), (800, 300));
        let log = calls(&log);
        assert!(!log.contains(&"measure".to_string()));
        assert!(log.contains(&"viewport 800x300@1".to_string()));
    }

    #[test]
    fn navigation_failure_still_closes_session() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut session = ScriptedSession::new(log.clone(), 100);
        session.fail_navigation = true;
        session.fail_close = true;
        let err = capture_with(session, &CaptureRequest::new("http://nowhere/"), &CaptureConfig::default()).unwrap_err();

        assert!(matches!(err, Error::NavigationFailed(_)));
        let log = calls(&log);
        assert_eq!(log.last().map(String::as_str), Some("close"));
        assert!(!log.contains(&"screenshot".to_string()));
    }

    #[test]
    fn zero_content_height_keeps_seed_viewport() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let session = ScriptedSession::new(log.clone(), 0);
        let img = capture_with(session, &CaptureRequest::new("about:blank"), &CaptureConfig::default()).unwrap();
        assert_eq!(img.dimensions(), (1280, SEED_HEIGHT));
    }

    #[test]
    fn close_failure_after_success_is_not_fatal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut session = ScriptedSession::new(log, 50);
        session.fail_close = true;
        assert!(capture_with(session, &CaptureRequest::new("about:blank"), &CaptureConfig::default()).is_ok());
    }

    #[test]
    fn zero_width_is_rejected_and_session_closed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let session = ScriptedSession::new(log.clone(), 10);
        let req = CaptureRequest { width: 0, ..CaptureRequest::new("about:blank") };
        let err = capture_with(session, &req, &CaptureConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidOptions(_)));
        assert_eq!(calls(&log), vec!["close"]);
    }

    #[test]
    fn zero_fixed_height_is_rejected_through_launcher() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let launcher = ScriptedLauncher { log: log.clone(), content_height: 10 };
        let req = CaptureRequest { height: Height::Fixed(0), ..CaptureRequest::new("about:blank") };
        assert!(matches!(capture(&launcher, &req, &CaptureConfig::default()), Err(Error::InvalidOptions(_))));
        assert_eq!(calls(&log), vec!["launch", "close"]);
    }
}
