// THEORY:
// `ScreenBuffer` owns the raster every scan reads from and keeps it
// synchronized with an external capture source on demand. It exists because a
// full-frame grab is expensive: callers that only need a few pixels of state
// (the data pixels) refresh a 1x1 rectangle instead, and the bobber search
// refreshes just the anchor region. Between refreshes the raster is stable,
// which is exactly what the visited-grid flood counter requires.
//
// Layout: top-down, row-major, one packed 24-bit RGB value per pixel. The
// stride arithmetic stays inside this module; the public surface is entirely
// bounds-checked accessors. Every geometry violation is an immediate
// `OutOfRange` error — silent clamping would corrupt scan results, so there is
// none. One writer at a time; the buffer has no internal synchronization by
// design (see the session loop for the threading contract).

use image::{Rgba, RgbaImage};

use crate::capture::{CaptureSource, DisplayMode};
use crate::core_modules::pixel_color::PixelColor;
use crate::core_modules::surface::{PixelSurface, Rect};
use crate::error::{Result, VisionError};

pub struct ScreenBuffer {
    source: Box<dyn CaptureSource>,
    mode: DisplayMode,
    pixels: Vec<u32>,
    scratch: Vec<u32>,
}

impl ScreenBuffer {
    /// Build a buffer sized to the source's display mode and fill it with an
    /// initial full capture.
    pub fn new(mut source: Box<dyn CaptureSource>) -> Result<Self> {
        let mode = source.display_mode()?;
        if mode.width <= 0 || mode.height <= 0 {
            return Err(VisionError::CaptureFailed(format!(
                "display mode reports degenerate dimensions {}x{}",
                mode.width, mode.height
            )));
        }
        let len = (mode.width as usize) * (mode.height as usize);
        let mut buffer = Self {
            source,
            mode,
            pixels: vec![0; len],
            scratch: Vec::new(),
        };
        buffer.refresh_full()?;
        Ok(buffer)
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    /// Replace the entire raster with a fresh frame from the source.
    pub fn refresh_full(&mut self) -> Result<()> {
        let (w, h) = (self.mode.width, self.mode.height);
        self.source.capture_region(0, 0, w, h, &mut self.pixels)
    }

    /// Replace only the declared sub-rectangle with fresh pixels.
    pub fn refresh_region(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        self.validate_rect(x, y, width, height)?;
        if width == 0 || height == 0 {
            return Ok(());
        }

        let len = (width as usize) * (height as usize);
        self.scratch.clear();
        self.scratch.resize(len, 0);
        let mut scratch = std::mem::take(&mut self.scratch);
        let res = self.source.capture_region(x, y, width, height, &mut scratch);
        if res.is_ok() {
            for row in 0..height {
                let src_start = (row * width) as usize;
                let dst_start = ((y + row) * self.mode.width + x) as usize;
                self.pixels[dst_start..dst_start + width as usize]
                    .copy_from_slice(&scratch[src_start..src_start + width as usize]);
            }
        }
        self.scratch = scratch;
        res
    }

    /// Draw a caller-supplied image into the raster at an offset. Feeds
    /// synthetic content (calibration stills, test fixtures) in place of a
    /// live capture; alpha is discarded.
    pub fn set_still_image(&mut self, image: &RgbaImage, x: i32, y: i32) -> Result<()> {
        let (w, h) = (image.width() as i32, image.height() as i32);
        self.validate_rect(x, y, w, h)?;
        for row in 0..h {
            for col in 0..w {
                let px = image.get_pixel(col as u32, row as u32);
                let packed =
                    ((px.0[0] as u32) << 16) | ((px.0[1] as u32) << 8) | px.0[2] as u32;
                self.pixels[((y + row) * self.mode.width + x + col) as usize] = packed;
            }
        }
        Ok(())
    }

    /// Bounds-checked read of one pixel.
    pub fn get_pixel(&self, x: i32, y: i32) -> Result<PixelColor> {
        self.validate_point(x, y)?;
        Ok(PixelColor::from_value(
            self.pixels[(y * self.mode.width + x) as usize],
        ))
    }

    /// Cheap existence check: compare the pixel at (x, y) against a packed
    /// color without constructing a `PixelColor`. Masks to 24-bit RGB.
    pub fn color_at(&self, x: i32, y: i32, value: u32) -> Result<bool> {
        self.validate_point(x, y)?;
        Ok(self.pixels[(y * self.mode.width + x) as usize] == value & 0x00FF_FFFF)
    }

    /// Linear row-major scan for the first pixel exactly matching `value`,
    /// starting at the 1-D `offset`. Used to locate fixed marker colors.
    /// Results over a partially refreshed buffer reflect whatever mix of
    /// frames the raster currently holds.
    pub fn find_first(&self, value: u32, offset: usize) -> Option<(i32, i32)> {
        let value = value & 0x00FF_FFFF;
        let width = self.mode.width as usize;
        self.pixels[offset.min(self.pixels.len())..]
            .iter()
            .position(|&px| px == value)
            .map(|pos| {
                let index = offset + pos;
                ((index % width) as i32, (index / width) as i32)
            })
    }

    /// `find_first` with the offset given as a starting coordinate.
    pub fn find_first_from(&self, value: u32, x: i32, y: i32) -> Option<(i32, i32)> {
        self.find_first(value, (y * self.mode.width + x) as usize)
    }

    /// Materialize a sub-rectangle into a standalone image for display or
    /// debugging, optionally downsampled by an integer stride. `pixel_ratio`
    /// must be 1 or even.
    pub fn extract_sub_image(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pixel_ratio: i32,
    ) -> Result<RgbaImage> {
        self.validate_rect(x, y, width, height)?;
        if pixel_ratio < 1 || (pixel_ratio != 1 && pixel_ratio % 2 != 0) {
            return Err(VisionError::InvalidArgument(format!(
                "pixel ratio {pixel_ratio} must be 1 or divisible by 2"
            )));
        }

        let out_w = width / pixel_ratio;
        let out_h = height / pixel_ratio;
        let mut out = RgbaImage::new(out_w as u32, out_h as u32);
        for oy in 0..out_h {
            for ox in 0..out_w {
                let src =
                    self.pixels[((y + oy * pixel_ratio) * self.mode.width + x + ox * pixel_ratio)
                        as usize];
                out.put_pixel(
                    ox as u32,
                    oy as u32,
                    Rgba([
                        ((src >> 16) & 0xFF) as u8,
                        ((src >> 8) & 0xFF) as u8,
                        (src & 0xFF) as u8,
                        0xFF,
                    ]),
                );
            }
        }
        Ok(out)
    }

    /// `extract_sub_image` over a `Rect`.
    pub fn extract_rect(&self, rect: Rect, pixel_ratio: i32) -> Result<RgbaImage> {
        self.extract_sub_image(rect.x, rect.y, rect.width, rect.height, pixel_ratio)
    }

    fn validate_point(&self, x: i32, y: i32) -> Result<()> {
        if x < 0 || x >= self.mode.width || y < 0 || y >= self.mode.height {
            return Err(self.out_of_range(x, y));
        }
        Ok(())
    }

    fn validate_rect(&self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        if x < 0 || y < 0 || width < 0 || height < 0 {
            return Err(self.out_of_range(x, y));
        }
        if x + width > self.mode.width || y + height > self.mode.height {
            return Err(self.out_of_range(x + width, y + height));
        }
        Ok(())
    }

    fn out_of_range(&self, x: i32, y: i32) -> VisionError {
        VisionError::OutOfRange {
            x,
            y,
            width: self.mode.width,
            height: self.mode.height,
        }
    }
}

impl PixelSurface for ScreenBuffer {
    fn width(&self) -> i32 {
        self.mode.width
    }

    fn height(&self) -> i32 {
        self.mode.height
    }

    fn pixel(&self, x: i32, y: i32) -> PixelColor {
        assert!(
            x >= 0 && x < self.mode.width && y >= 0 && y < self.mode.height,
            "pixel read at ({x}, {y}) outside {}x{} screen buffer",
            self.mode.width,
            self.mode.height
        );
        PixelColor::from_value(self.pixels[(y * self.mode.width + x) as usize])
    }
}
