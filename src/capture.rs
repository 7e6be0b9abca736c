// THEORY:
// The engine treats the screen as an opaque pixel provider. `CaptureSource` is
// the only contract: report the primary display's mode once, and copy a
// requested rectangle of current pixels into a caller-owned buffer. Whether
// those pixels come from a real OS screen grab or from a static image is
// irrelevant to every scanning algorithm above this seam.
//
// Two implementations ship here:
// - `StillCaptureSource`: serves a fixed `RgbaImage`. Used by unit tests and
//   the calibration path, and mutable so a test can swap frames between
//   refreshes.
// - `PrimaryDisplaySource` (feature `live-capture`): grabs the primary monitor
//   through `xcap`. Display enumeration failure is fatal to the enclosing run,
//   not a retryable condition.

use image::RgbaImage;

use crate::error::{Result, VisionError};

/// Resolution and refresh rate of the display being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: i32,
    pub height: i32,
    pub refresh_rate: u32,
}

/// An opaque provider of screen pixels.
pub trait CaptureSource: Send {
    /// The capture dimensions. Queried once when the screen buffer is built;
    /// the value is invalid if display settings change afterwards.
    fn display_mode(&mut self) -> Result<DisplayMode>;

    /// Copy the pixels of the given rectangle into `dest` as packed 24-bit
    /// RGB values, row-major with rows of length `width`. The rectangle is
    /// guaranteed by the caller to fit the advertised display mode, and
    /// `dest.len()` equals `width * height`.
    fn capture_region(&mut self, x: i32, y: i32, width: i32, height: i32, dest: &mut [u32])
    -> Result<()>;
}

/// Serves frames from an in-memory image instead of a live display.
pub struct StillCaptureSource {
    frame: RgbaImage,
    refresh_rate: u32,
}

impl StillCaptureSource {
    pub fn new(frame: RgbaImage) -> Self {
        Self {
            frame,
            refresh_rate: 60,
        }
    }

    /// Replace the frame served by subsequent captures. The new frame must
    /// keep the original dimensions, since the buffer built on top of this
    /// source sized itself from them.
    pub fn set_frame(&mut self, frame: RgbaImage) -> Result<()> {
        if frame.dimensions() != self.frame.dimensions() {
            return Err(VisionError::InvalidArgument(format!(
                "replacement frame is {}x{}, source is {}x{}",
                frame.width(),
                frame.height(),
                self.frame.width(),
                self.frame.height()
            )));
        }
        self.frame = frame;
        Ok(())
    }
}

impl CaptureSource for StillCaptureSource {
    fn display_mode(&mut self) -> Result<DisplayMode> {
        Ok(DisplayMode {
            width: self.frame.width() as i32,
            height: self.frame.height() as i32,
            refresh_rate: self.refresh_rate,
        })
    }

    fn capture_region(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        dest: &mut [u32],
    ) -> Result<()> {
        debug_assert_eq!(dest.len(), (width * height) as usize);
        for row in 0..height {
            for col in 0..width {
                let px = self.frame.get_pixel((x + col) as u32, (y + row) as u32);
                let packed =
                    ((px.0[0] as u32) << 16) | ((px.0[1] as u32) << 8) | px.0[2] as u32;
                dest[(row * width + col) as usize] = packed;
            }
        }
        Ok(())
    }
}

/// Live capture of the primary monitor.
#[cfg(feature = "live-capture")]
pub struct PrimaryDisplaySource {
    monitor: xcap::Monitor,
}

#[cfg(feature = "live-capture")]
impl PrimaryDisplaySource {
    pub fn new() -> Result<Self> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| VisionError::CaptureFailed(format!("monitor enumeration: {e}")))?;
        let monitor = monitors
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .ok_or_else(|| VisionError::CaptureFailed("no primary monitor found".into()))?;
        Ok(Self { monitor })
    }
}

#[cfg(feature = "live-capture")]
impl CaptureSource for PrimaryDisplaySource {
    fn display_mode(&mut self) -> Result<DisplayMode> {
        let width = self
            .monitor
            .width()
            .map_err(|e| VisionError::CaptureFailed(e.to_string()))?;
        let height = self
            .monitor
            .height()
            .map_err(|e| VisionError::CaptureFailed(e.to_string()))?;
        let frequency = self
            .monitor
            .frequency()
            .map_err(|e| VisionError::CaptureFailed(e.to_string()))?;
        Ok(DisplayMode {
            width: width as i32,
            height: height as i32,
            refresh_rate: frequency.round() as u32,
        })
    }

    fn capture_region(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        dest: &mut [u32],
    ) -> Result<()> {
        // xcap hands back the full frame; crop the requested rectangle out of it.
        let frame = self
            .monitor
            .capture_image()
            .map_err(|e| VisionError::CaptureFailed(e.to_string()))?;
        if (x + width) as u32 > frame.width() || (y + height) as u32 > frame.height() {
            return Err(VisionError::CaptureFailed(format!(
                "captured frame is {}x{}, smaller than the advertised display mode",
                frame.width(),
                frame.height()
            )));
        }
        for row in 0..height {
            for col in 0..width {
                let px = frame.get_pixel((x + col) as u32, (y + row) as u32);
                let packed =
                    ((px.0[0] as u32) << 16) | ((px.0[1] as u32) << 8) | px.0[2] as u32;
                dest[(row * width + col) as usize] = packed;
            }
        }
        Ok(())
    }
}
