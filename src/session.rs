// THEORY:
// `FishingSession` is the consumer of the scanning core: a single blocking
// thread that sequences cast -> wait -> detect -> click cycles. It is glue by
// design — all decisions reduce to "what did the pixels say" — and its main
// obligations are the threading and failure contracts:
//
// - Cancellation is cooperative. Every sleep is chunked into slices of at
//   most `CANCEL_SLICE` and the stop flag is checked at each slice boundary,
//   so a multi-second wait never delays a stop request by more than that.
//   Cancellation surfaces as `VisionError::Cancelled`, distinguishable from
//   real failures and never logged as one.
// - The screen buffer is owned exclusively by this thread. Observers (log
//   lines, bobber scans for the calibration view, splash counters) receive
//   value-copied structs over an mpsc channel and never touch the live
//   buffer.
// - Transient conditions (anchors not on screen, no bobber found, cast flag
//   never set) are logged and retried after a backoff sleep. Capture
//   failures are fatal and end the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::core_modules::region_scanner::ScanResult;
use crate::core_modules::scene_reader::{DataColors, SceneReader};
use crate::error::{Result, VisionError};
use crate::input::ActionSink;
use crate::settings::SettingsData;

/// Upper bound on one cancellation-check slice of any sleep.
const CANCEL_SLICE: Duration = Duration::from_millis(250);
/// Backoff after a transient failure (anchors missing, nothing detected).
const RETRY_BACKOFF: Duration = Duration::from_secs(2);
/// Hold time between key press and release.
const KEY_HOLD: Duration = Duration::from_millis(50);
/// Hold time between mouse press and release when reeling in.
const CLICK_HOLD: Duration = Duration::from_millis(80);
/// Time to let a lure application finish before casting.
const LURE_APPLY_TIME: Duration = Duration::from_secs(3);
/// How long to wait for the casting data pixel after sending the cast key.
const CAST_START_TIMEOUT: Duration = Duration::from_secs(3);
/// Poll interval while watching for the splash.
const SPLASH_POLL: Duration = Duration::from_millis(100);
/// Pause between completed catch cycles.
const CYCLE_PAUSE: Duration = Duration::from_secs(1);

/// Value-copied observation handed to the UI side of the channel.
#[derive(Debug)]
pub enum SessionEvent {
    Log(String),
    /// A bobber scan finished; carries the regions and the scanned image for
    /// calibration display.
    BobberScan {
        regions: Vec<ScanResult>,
        snapshot: RgbaImage,
    },
    /// Splash counter progress for the current wait.
    SplashUpdate {
        pixels_found: u32,
        threshold: u32,
        max_found: u32,
    },
    Finished,
}

pub struct FishingSession {
    scene: SceneReader,
    actions: Box<dyn ActionSink>,
    settings: Arc<SettingsData>,
    events: Sender<SessionEvent>,
    cancel: Arc<AtomicBool>,
}

impl FishingSession {
    pub fn new(
        scene: SceneReader,
        actions: Box<dyn ActionSink>,
        settings: Arc<SettingsData>,
        events: Sender<SessionEvent>,
    ) -> Self {
        Self {
            scene,
            actions,
            settings,
            events,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for requesting a stop from another thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run cast/detect cycles until cancelled or a fatal error occurs.
    /// Returns `Err(Cancelled)` on a stop request; callers must not report
    /// that as a failure.
    pub fn run(&mut self) -> Result<()> {
        info!("session starting");
        let result = self.run_inner();
        let _ = self.events.send(SessionEvent::Finished);
        match &result {
            Err(e) if e.is_cancelled() => info!("session stopped on request"),
            Err(e) => warn!(error = %e, "session ended with failure"),
            Ok(()) => info!("session finished"),
        }
        result
    }

    fn run_inner(&mut self) -> Result<()> {
        loop {
            self.check_cancelled()?;

            if !self.scene.have_anchor_positions() || !self.scene.anchors_visible()? {
                if !self.scene.setup_anchors()? {
                    self.log("anchor markers not on screen, waiting");
                    self.sleep(RETRY_BACKOFF)?;
                    continue;
                }
                self.log("anchor markers located");
            }

            match self.fish_one_cycle() {
                Ok(true) => {
                    self.sleep(CYCLE_PAUSE)?;
                }
                Ok(false) => {
                    self.sleep(RETRY_BACKOFF)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One full cast/detect/catch attempt. `Ok(false)` is a transient miss
    /// worth retrying; errors are fatal or cancellation.
    fn fish_one_cycle(&mut self) -> Result<bool> {
        if self.scene.check_data_pixel(DataColors::IN_COMBAT, false)? {
            self.log("in combat, holding the cast");
            return Ok(false);
        }

        if self.settings.use_lure.get() && !self.scene.check_data_pixel(DataColors::LURE_ACTIVE, false)? {
            let lure = self.settings.lure_key.get();
            if lure.is_set() {
                self.log("applying lure");
                self.actions.send_key_sequence(&lure.vkey_sequence(), KEY_HOLD)?;
                self.sleep(LURE_APPLY_TIME)?;
            }
        }

        let fishing = self.settings.fishing_key.get();
        if !fishing.is_set() {
            return Err(VisionError::InvalidArgument(
                "no fishing key bound".into(),
            ));
        }
        self.actions.send_key_sequence(&fishing.vkey_sequence(), KEY_HOLD)?;

        if !self.wait_for_flag(DataColors::CASTING, CAST_START_TIMEOUT)? {
            self.log("cast did not start, retrying");
            return Ok(false);
        }

        let bobber = match self.locate_bobber()? {
            Some(b) => b,
            None => {
                self.log("no bobber found, recasting");
                return Ok(false);
            }
        };

        debug!(
            x = bobber.x,
            y = bobber.y,
            pixels = bobber.connected_pixels,
            "bobber located"
        );
        if self.watch_for_splash(&bobber)? {
            let (cx, cy) = bobber.center();
            self.actions.move_mouse(cx, cy)?;
            self.actions.click(true, CLICK_HOLD)?;
            self.log("splash detected, reeled in");
            return Ok(true);
        }

        self.log("cast ended without a splash");
        Ok(false)
    }

    /// Scan the anchor region for candidate bobbers and keep the first find.
    fn locate_bobber(&mut self) -> Result<Option<ScanResult>> {
        let regions = self.scene.find_bobber_positions(
            self.settings.min_connected.get(),
            self.settings.target_hue.get(),
            self.settings.hue_tolerance.get(),
        )?;

        if let Ok(snapshot) = self.scene.anchor_region_image() {
            let _ = self.events.send(SessionEvent::BobberScan {
                regions: regions.clone(),
                snapshot,
            });
        }

        Ok(regions.into_iter().next())
    }

    /// Poll the splash counter over the bobber until it trips the
    /// sensitivity threshold or the casting flag drops.
    fn watch_for_splash(&mut self, bobber: &ScanResult) -> Result<bool> {
        let threshold = self.settings.sensitivity.get();
        let area = self.settings.splash_area.get();
        let channel_floor = self.settings.splash_threshold.get();
        let (cx, cy) = bobber.center();
        let mut max_found = 0;

        while self.scene.check_data_pixel(DataColors::CASTING, false)? {
            self.check_cancelled()?;

            let found = self
                .scene
                .count_area_pixels_above(cx, cy, area, channel_floor, false)?;
            max_found = max_found.max(found);
            let _ = self.events.send(SessionEvent::SplashUpdate {
                pixels_found: found,
                threshold,
                max_found,
            });

            if found >= threshold {
                return Ok(true);
            }
            self.sleep(SPLASH_POLL)?;
        }

        Ok(false)
    }

    /// Poll a data pixel until it reads set, up to `timeout`.
    fn wait_for_flag(&mut self, flag: DataColors, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.scene.check_data_pixel(flag, false)? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            self.sleep(SPLASH_POLL)?;
        }
    }

    fn log(&self, message: &str) {
        debug!("{message}");
        let _ = self.events.send(SessionEvent::Log(message.to_string()));
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(VisionError::Cancelled);
        }
        Ok(())
    }

    /// Blocking sleep in cancellation-checked slices.
    fn sleep(&self, total: Duration) -> Result<()> {
        let mut remaining = total;
        while !remaining.is_zero() {
            self.check_cancelled()?;
            let slice = remaining.min(CANCEL_SLICE);
            std::thread::sleep(slice);
            remaining -= slice;
        }
        self.check_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::StillCaptureSource;
    use crate::core_modules::screen_buffer::ScreenBuffer;
    use crate::input::RecordingActionSink;
    use image::Rgba;
    use std::sync::mpsc;

    fn blank_session() -> (FishingSession, mpsc::Receiver<SessionEvent>) {
        let frame = RgbaImage::from_pixel(64, 64, Rgba([5, 5, 5, 0xFF]));
        let buffer = ScreenBuffer::new(Box::new(StillCaptureSource::new(frame))).unwrap();
        let scene = SceneReader::new(buffer);
        let (tx, rx) = mpsc::channel();
        let session = FishingSession::new(
            scene,
            Box::new(RecordingActionSink::new()),
            Arc::new(SettingsData::default()),
            tx,
        );
        (session, rx)
    }

    #[test]
    fn pre_set_cancellation_stops_the_run_immediately() {
        let (mut session, rx) = blank_session();
        session.cancel_flag().store(true, Ordering::Relaxed);

        let err = session.run().unwrap_err();
        assert!(err.is_cancelled());
        // The finish event still fires so observers can tear down.
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Finished)));
    }

    #[test]
    fn cancellation_interrupts_a_long_sleep_within_a_slice() {
        let (session, _rx) = blank_session();
        let flag = session.cancel_flag();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(60));
            flag.store(true, Ordering::Relaxed);
        });

        let started = Instant::now();
        let err = session.sleep(Duration::from_secs(30)).unwrap_err();
        handle.join().unwrap();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn missing_anchors_back_off_instead_of_failing() {
        let (mut session, rx) = blank_session();
        let flag = session.cancel_flag();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(120));
            flag.store(true, Ordering::Relaxed);
        });
        let err = session.run().unwrap_err();
        handle.join().unwrap();

        assert!(err.is_cancelled());
        let mut saw_anchor_log = false;
        while let Ok(event) = rx.try_recv() {
            if let SessionEvent::Log(line) = event {
                saw_anchor_log |= line.contains("anchor markers not on screen");
            }
        }
        assert!(saw_anchor_log);
    }
}
