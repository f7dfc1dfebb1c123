//! Code scanner frame loop

mod helpers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use helpers::*;
use tokio::io::BufReader;

use studio_gear::config::ScannerConfig;
use studio_gear::services::scanner::ScanCallback;
use studio_gear::services::{CameraDevice, CodeScanner, Facing, Frame, LineCamera, ScannerState};
use studio_gear::utils::errors::{ScannerError, ScannerResult};

fn config(cooldown_ms: u64) -> ScannerConfig {
    ScannerConfig {
        fps: 10,
        cooldown_ms,
        prefer_environment: true,
    }
}

fn collector() -> (ScanCallback, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ScanCallback = Arc::new(move |code| sink.lock().unwrap().push(code));
    (callback, seen)
}

async fn wait_until_stopped(scanner: &CodeScanner) {
    for _ in 0..100 {
        if scanner.state() != ScannerState::Running {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("scanner did not stop");
}

#[tokio::test]
async fn test_repeated_codes_are_delivered_once() {
    init_test_logging();
    let input: &'static [u8] = b"CAM-001-AB12\nCAM-001-AB12\n\nMIC-002-CD34\nCAM-001-AB12\n";
    let (callback, seen) = collector();
    let mut scanner = CodeScanner::new(
        Box::new(LineCamera::new(BufReader::new(input))),
        config(1500),
        callback,
    );

    scanner.start().await.unwrap();
    wait_until_stopped(&scanner).await;

    assert_eq!(scanner.state(), ScannerState::Stopped);
    assert_eq!(*seen.lock().unwrap(), vec!["CAM-001-AB12".to_string(), "MIC-002-CD34".to_string()]);
}

#[tokio::test]
async fn test_zero_cooldown_delivers_everything() {
    let input: &'static [u8] = b"A\nA\nA\n";
    let (callback, seen) = collector();
    let mut scanner = CodeScanner::new(Box::new(LineCamera::new(BufReader::new(input))), config(0), callback);

    scanner.start().await.unwrap();
    wait_until_stopped(&scanner).await;
    assert_eq!(seen.lock().unwrap().len(), 3);

    scanner.stop().await.unwrap();
    assert_eq!(scanner.state(), ScannerState::Stopped);
}

/// Camera whose permission prompt was declined
struct DeniedCamera {
    attempts: Arc<Mutex<Vec<Facing>>>,
}

#[async_trait]
impl CameraDevice for DeniedCamera {
    async fn start(&mut self, facing: Facing, _fps: u32) -> ScannerResult<()> {
        self.attempts.lock().unwrap().push(facing);
        Err(ScannerError::PermissionDenied("NotAllowedError".to_string()))
    }

    async fn next_frame(&mut self) -> ScannerResult<Frame> {
        Err(ScannerError::NotRunning)
    }

    async fn stop(&mut self) -> ScannerResult<()> {
        Ok(())
    }

    fn is_scanning(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn test_denied_camera_reports_failure() {
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let (callback, seen) = collector();
    let mut scanner = CodeScanner::new(
        Box::new(DeniedCamera { attempts: Arc::clone(&attempts) }),
        config(1500),
        callback,
    );

    let err = scanner.start().await.unwrap_err();
    assert_eq!(
        err.user_message(),
        "Camera access was denied. Grant camera permission and try again."
    );
    assert!(matches!(scanner.state(), ScannerState::Failed(_)));
    // Rear camera first, then any camera
    assert_eq!(*attempts.lock().unwrap(), vec![Facing::Environment, Facing::Any]);

    assert!(scanner.retry().await.is_err());
    assert!(seen.lock().unwrap().is_empty());
}

/// Camera fed from a shared queue that stays open until stopped
struct QueueCamera {
    queue: Arc<Mutex<Vec<String>>>,
    scanning: bool,
}

#[async_trait]
impl CameraDevice for QueueCamera {
    async fn start(&mut self, _facing: Facing, _fps: u32) -> ScannerResult<()> {
        if self.scanning {
            return Err(ScannerError::AlreadyScanning);
        }
        self.scanning = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> ScannerResult<Frame> {
        let next = {
            let mut queue = self.queue.lock().unwrap();
            if queue.is_empty() {
                None
            } else {
                Some(queue.remove(0))
            }
        };
        match next {
            Some(code) => Ok(Frame::Decoded(code)),
            None => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Frame::Miss)
            }
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

async fn wait_for_codes(seen: &Arc<Mutex<Vec<String>>>, count: usize) {
    for _ in 0..200 {
        if seen.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} codes, got {:?}", count, seen.lock().unwrap());
}

#[tokio::test]
async fn test_retry_while_running_restarts_frame_loop() {
    init_test_logging();
    let queue = Arc::new(Mutex::new(vec!["CAM-001-AB12".to_string()]));
    let (callback, seen) = collector();
    let mut scanner = CodeScanner::new(
        Box::new(QueueCamera {
            queue: Arc::clone(&queue),
            scanning: false,
        }),
        config(0),
        callback,
    );

    scanner.start().await.unwrap();
    wait_for_codes(&seen, 1).await;

    scanner.retry().await.unwrap();
    assert_eq!(scanner.state(), ScannerState::Running);

    queue.lock().unwrap().push("CAM-002-CD34".to_string());
    wait_for_codes(&seen, 2).await;
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["CAM-001-AB12".to_string(), "CAM-002-CD34".to_string()]
    );

    scanner.stop().await.unwrap();
    assert_eq!(scanner.state(), ScannerState::Stopped);
}
