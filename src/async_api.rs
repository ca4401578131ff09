//! Async-friendly capture, backed by dedicated worker threads.
//!
//! The CDP session is blocking and not `Send`, so each capture runs start to
//! finish on its own thread and the result is handed back over a oneshot
//! channel. Independent captures run concurrently, one browser each.

use crate::capture::{capture, SessionLauncher};
use crate::{CaptureConfig, CaptureRequest, CdpLauncher, Error, RasterImage, Result};
use std::thread;
use tokio::sync::oneshot;

/// Async capture facade.
#[derive(Clone, Debug, Default)]
pub struct Capturer {
    config: CaptureConfig,
}

impl Capturer {
    pub fn new(config: Option<CaptureConfig>) -> Self {
        Self {
            config: config.unwrap_or_default(),
        }
    }

    /// Capture `request` in a fresh headless Chrome.
    pub async fn capture(&self, request: CaptureRequest) -> Result<RasterImage> {
        self.capture_with(CdpLauncher, request).await
    }

    /// Capture `request` with a custom launcher.
    pub async fn capture_with<L>(&self, launcher: L, request: CaptureRequest) -> Result<RasterImage>
    where
        L: SessionLauncher + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let config = self.config.clone();

        thread::Builder::new()
            .name(format!("pagediff-capture-{}", request.width))
            .spawn(move || {
                let res = capture(&launcher, &request, &config);
                // The receiver may have been dropped by a cancelled caller
                let _ = tx.send(res);
            })
            .map_err(|e| Error::InitializationError(format!("Failed to spawn capture worker: {}", e)))?;

        rx.await
            .map_err(|e| Error::CaptureFailed(format!("Capture worker exited early: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::ScriptedLauncher;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn concurrent_captures_use_separate_sessions() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let capturer = Capturer::new(None);

        let a = capturer.capture_with(
            ScriptedLauncher { log: log.clone(), content_height: 100 },
            CaptureRequest { width: 10, ..CaptureRequest::new("http://a/") },
        );
        let b = capturer.capture_with(
            ScriptedLauncher { log: log.clone(), content_height: 200 },
            CaptureRequest { width: 20, ..CaptureRequest::new("http://b/") },
        );
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.unwrap().dimensions(), (10, 100));
        assert_eq!(b.unwrap().dimensions(), (20, 200));
        let log = log.lock().unwrap();
        assert_eq!(log.iter().filter(|e| *e == "launch").count(), 2);
        assert_eq!(log.iter().filter(|e| *e == "close").count(), 2);
    }
}
