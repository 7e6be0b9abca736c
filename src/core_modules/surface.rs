// THEORY:
// The flood-count engine does not care whether its pixels come from a live
// screen grab or from a bitmap a calibration window is painting into. The
// `PixelSurface` trait is that seam: a read-only, fixed-dimension raster with
// random pixel access. `ScreenBuffer` implements it for the live path and
// `StillSurface` wraps an `image::RgbaImage` for calibration and tests.
//
// Coordinates are signed integers everywhere; the single canonical contract is
// that (x, y) must lie within [0, width) x [0, height). The trait read is the
// hot path of the scanner and therefore infallible: an out-of-bounds access is
// a contract violation and fails fast by panicking, it is never clamped.

use image::RgbaImage;

use crate::core_modules::pixel_color::PixelColor;

/// An axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// A fixed-size raster the scanning engine can read pixels from.
pub trait PixelSurface {
    fn width(&self) -> i32;

    fn height(&self) -> i32;

    /// Read one pixel. Contract: (x, y) must be inside the surface;
    /// implementations panic on violation rather than clamping.
    fn pixel(&self, x: i32, y: i32) -> PixelColor;
}

/// A standalone image viewed as a scan surface. Used to run the engine over
/// injected content (calibration stills, unit-test fixtures) instead of a
/// live capture buffer.
pub struct StillSurface<'a> {
    image: &'a RgbaImage,
}

impl<'a> StillSurface<'a> {
    pub fn new(image: &'a RgbaImage) -> Self {
        Self { image }
    }
}

impl PixelSurface for StillSurface<'_> {
    fn width(&self) -> i32 {
        self.image.width() as i32
    }

    fn height(&self) -> i32 {
        self.image.height() as i32
    }

    fn pixel(&self, x: i32, y: i32) -> PixelColor {
        assert!(
            x >= 0 && x < self.width() && y >= 0 && y < self.height(),
            "pixel read at ({x}, {y}) outside {}x{} still surface",
            self.width(),
            self.height()
        );
        let px = self.image.get_pixel(x as u32, y as u32);
        PixelColor::new(px.0[0], px.0[1], px.0[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn still_surface_reads_rgb_and_ignores_alpha() {
        let mut img = RgbaImage::new(4, 3);
        img.put_pixel(2, 1, Rgba([10, 20, 30, 0]));
        let surface = StillSurface::new(&img);
        assert_eq!(surface.width(), 4);
        assert_eq!(surface.height(), 3);
        assert_eq!(surface.pixel(2, 1), PixelColor::new(10, 20, 30));
    }

    #[test]
    #[should_panic]
    fn still_surface_rejects_out_of_bounds_reads() {
        let img = RgbaImage::new(4, 3);
        StillSurface::new(&img).pixel(4, 0);
    }

    #[test]
    fn rect_edges() {
        let r = Rect::new(10, 20, 5, 7);
        assert_eq!(r.right(), 15);
        assert_eq!(r.bottom(), 27);
    }
}
