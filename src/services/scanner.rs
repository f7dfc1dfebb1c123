//! Code scanning component
//!
//! `CodeScanner` drives a `CameraDevice` in a background frame loop and hands
//! every decoded string to a callback. Decoding itself belongs to the device;
//! frames without a code are skipped silently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ScannerConfig;
use crate::utils::errors::{GearError, Result, ScannerError, ScannerResult};

/// Which camera to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Rear camera on phones and tablets
    Environment,
    Any,
}

/// Outcome of reading one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Decoded(String),
    /// No code in this frame
    Miss,
    /// The device has no more frames
    Closed,
}

#[async_trait]
pub trait CameraDevice: Send {
    async fn start(&mut self, facing: Facing, fps: u32) -> ScannerResult<()>;
    async fn next_frame(&mut self) -> ScannerResult<Frame>;
    async fn stop(&mut self) -> ScannerResult<()>;
    fn is_scanning(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerState {
    Idle,
    Running,
    Stopped,
    /// Start failed; the message is shown with a retry affordance
    Failed(String),
}

pub type ScanCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Suppresses repeats of the same code.
///
/// A code is delivered when it has not been seen for `cooldown`. Every
/// sighting restarts the window, so a label held in front of the camera is
/// reported once.
#[derive(Debug)]
pub struct ScanDebouncer {
    cooldown: Duration,
    last_seen: HashMap<String, Instant>,
}

impl ScanDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_seen: HashMap::new(),
        }
    }

    /// Record a sighting; true if it should be delivered
    pub fn accept(&mut self, code: &str, now: Instant) -> bool {
        if self.cooldown.is_zero() {
            return true;
        }

        let cooldown = self.cooldown;
        self.last_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) < cooldown);

        let fresh = !self.last_seen.contains_key(code);
        self.last_seen.insert(code.to_string(), now);
        fresh
    }
}

/// Camera-driven scanner delivering decoded codes to a callback
pub struct CodeScanner {
    device: Arc<Mutex<Box<dyn CameraDevice>>>,
    config: ScannerConfig,
    callback: ScanCallback,
    state: Arc<StdMutex<ScannerState>>,
    task: Option<JoinHandle<()>>,
}

impl CodeScanner {
    pub fn new(device: Box<dyn CameraDevice>, config: ScannerConfig, callback: ScanCallback) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
            config,
            callback,
            state: Arc::new(StdMutex::new(ScannerState::Idle)),
            task: None,
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|_| ScannerState::Failed("scanner state poisoned".to_string()))
    }

    pub fn is_running(&self) -> bool {
        self.state() == ScannerState::Running
    }

    /// Open the camera (rear-facing first, then any) and start the frame loop
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let outcome = {
            let mut device = self.device.lock().await;
            open_device(device.as_mut(), &self.config).await
        };

        match outcome {
            Ok(()) => {
                set_state(&self.state, ScannerState::Running);
                self.spawn_loop();
                info!(fps = self.config.fps, "Scanner started");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Scanner failed to start");
                set_state(&self.state, ScannerState::Failed(e.to_string()));
                Err(GearError::Scanner(e))
            }
        }
    }

    /// Manual retry after a failed start
    pub async fn retry(&mut self) -> Result<()> {
        self.stop_loop();
        self.start().await
    }

    /// Stop the frame loop and release the camera
    pub async fn stop(&mut self) -> Result<()> {
        self.stop_loop();

        let mut device = self.device.lock().await;
        if device.is_scanning() {
            device.stop().await?;
        }
        set_state(&self.state, ScannerState::Stopped);
        info!("Scanner stopped");
        Ok(())
    }

    fn stop_loop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if self.is_running() {
            set_state(&self.state, ScannerState::Stopped);
        }
    }

    fn spawn_loop(&mut self) {
        let device = Arc::clone(&self.device);
        let callback = Arc::clone(&self.callback);
        let state = Arc::clone(&self.state);
        let mut debouncer = ScanDebouncer::new(Duration::from_millis(self.config.cooldown_ms));

        self.task = Some(tokio::spawn(async move {
            loop {
                let frame = {
                    let mut device = device.lock().await;
                    device.next_frame().await
                };

                match frame {
                    Ok(Frame::Decoded(text)) => {
                        if debouncer.accept(&text, Instant::now()) {
                            callback(text);
                        } else {
                            debug!(code = %text, "Repeated code suppressed");
                        }
                    }
                    Ok(Frame::Miss) => continue,
                    Ok(Frame::Closed) => {
                        debug!("Camera closed");
                        set_state(&state, ScannerState::Stopped);
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Frame loop ended");
                        set_state(&state, ScannerState::Failed(e.to_string()));
                        break;
                    }
                }
            }
        }));
    }
}

impl Drop for CodeScanner {
    fn drop(&mut self) {
        self.stop_loop();
    }
}

fn set_state(state: &StdMutex<ScannerState>, value: ScannerState) {
    if let Ok(mut guard) = state.lock() {
        *guard = value;
    }
}

fn started(result: ScannerResult<()>) -> ScannerResult<()> {
    match result {
        Err(ScannerError::AlreadyScanning) => Ok(()),
        other => other,
    }
}

async fn open_device(device: &mut dyn CameraDevice, config: &ScannerConfig) -> ScannerResult<()> {
    if !config.prefer_environment {
        return started(device.start(Facing::Any, config.fps).await);
    }

    match started(device.start(Facing::Environment, config.fps).await) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(error = %e, "Rear camera unavailable, falling back to any camera");
            started(device.start(Facing::Any, config.fps).await)
        }
    }
}

/// Reads newline-terminated codes from an async reader.
///
/// Keyboard-wedge barcode scanners, stdin and pipes all look like this.
pub struct LineCamera<R> {
    reader: R,
    scanning: bool,
    buffer: String,
}

impl<R> LineCamera<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            scanning: false,
            buffer: String::new(),
        }
    }
}

#[async_trait]
impl<R> CameraDevice for LineCamera<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn start(&mut self, _facing: Facing, _fps: u32) -> ScannerResult<()> {
        if self.scanning {
            return Err(ScannerError::AlreadyScanning);
        }
        self.scanning = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> ScannerResult<Frame> {
        if !self.scanning {
            return Err(ScannerError::NotRunning);
        }

        self.buffer.clear();
        let read = self
            .reader
            .read_line(&mut self.buffer)
            .await
            .map_err(|e| ScannerError::DeviceUnavailable(e.to_string()))?;

        if read == 0 {
            self.scanning = false;
            return Ok(Frame::Closed);
        }

        let text = self.buffer.trim();
        if text.is_empty() {
            Ok(Frame::Miss)
        } else {
            Ok(Frame::Decoded(text.to_string()))
        }
    }

    async fn stop(&mut self) -> ScannerResult<()> {
        self.scanning = false;
        Ok(())
    }

    fn is_scanning(&self) -> bool {
        self.scanning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debouncer_suppresses_within_cooldown() {
        let mut debouncer = ScanDebouncer::new(Duration::from_millis(1500));
        let t0 = Instant::now();

        assert!(debouncer.accept("CAM-001-AB12", t0));
        assert!(!debouncer.accept("CAM-001-AB12", t0 + Duration::from_millis(500)));
        assert!(debouncer.accept("MIC-001-ZZ99", t0 + Duration::from_millis(600)));
    }

    #[test]
    fn test_debouncer_window_slides() {
        let mut debouncer = ScanDebouncer::new(Duration::from_millis(1500));
        let t0 = Instant::now();

        assert!(debouncer.accept("A", t0));
        assert!(!debouncer.accept("A", t0 + Duration::from_millis(1000)));
        assert!(!debouncer.accept("A", t0 + Duration::from_millis(2000)));
        assert!(debouncer.accept("A", t0 + Duration::from_millis(3600)));
    }

    #[test]
    fn test_zero_cooldown_disables_debounce() {
        let mut debouncer = ScanDebouncer::new(Duration::ZERO);
        let t0 = Instant::now();
        assert!(debouncer.accept("A", t0));
        assert!(debouncer.accept("A", t0));
    }

    #[tokio::test]
    async fn test_line_camera_frames() {
        let input: &[u8] = b"CAM-001-AB12\n\n  MIC-002-CD34  \n";
        let mut camera = LineCamera::new(tokio::io::BufReader::new(input));

        assert!(matches!(camera.next_frame().await, Err(ScannerError::NotRunning)));
        camera.start(Facing::Environment, 10).await.unwrap();
        assert!(matches!(camera.start(Facing::Any, 10).await, Err(ScannerError::AlreadyScanning)));

        assert_eq!(camera.next_frame().await.unwrap(), Frame::Decoded("CAM-001-AB12".to_string()));
        assert_eq!(camera.next_frame().await.unwrap(), Frame::Miss);
        assert_eq!(camera.next_frame().await.unwrap(), Frame::Decoded("MIC-002-CD34".to_string()));
        assert_eq!(camera.next_frame().await.unwrap(), Frame::Closed);
        assert!(!camera.is_scanning());
    }
}
