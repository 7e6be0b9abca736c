// THEORY:
// `SceneReader` is the stateful facade between the raw screen buffer and the
// automation loop. The target application paints a handful of fixed markers
// into its frame, and everything this module does derives from locating them:
//
// - Anchors: four 2x2 marker blocks (red/green over blue/white) at the
//   corners of a reference rectangle. Finding them pins down the application's
//   on-screen placement without any window-position knowledge. A structural
//   constraint validates the find: the top-right block must share the
//   top-left's row and the bottom-right must share the bottom-left's row —
//   if either fails, the whole anchor search reports failure.
// - Data pixels: single pixels at fixed offsets from anchor corner 0 whose
//   color encodes boolean state flags via bitmask. Checking one refreshes a
//   1x1 region instead of the whole frame, which is what keeps the poll loop
//   cheap.
// - Splash counting: a brightness-threshold counter over a small square,
//   the secondary detector the sensitivity setting feeds.
// - Bobber search: refresh the anchor region, then hand it to the region
//   enumerator.
//
// Anchor-dependent operations called before `setup_anchors` succeeds are a
// contract violation (`AnchorsNotSet`), the same fail-fast stance the buffer
// takes on geometry.

use bitflags::bitflags;
use image::RgbaImage;
use tracing::debug;

use crate::core_modules::pixel_color::PixelColor;
use crate::core_modules::region_enumerator::RegionEnumerator;
use crate::core_modules::region_scanner::ScanResult;
use crate::core_modules::screen_buffer::ScreenBuffer;
use crate::core_modules::surface::Rect;
use crate::error::{Result, VisionError};

bitflags! {
    /// Application state flags encoded in a data pixel's color channels.
    /// Bits 24..31 select which data-pixel column carries the flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DataColors: u32 {
        const IN_COMBAT = 0x0000_0040;
        const LURE_ACTIVE = 0x0000_0080;
        const CASTING = 0x0000_8000;
        const TOOLTIP_SHOWN = 0x0080_0000;
    }
}

/// The 2x2 anchor marker: red top-left, green top-right, blue bottom-left,
/// white bottom-right.
const ANCHOR_COLORS: [PixelColor; 4] = [
    PixelColor::from_value(0xFF0000),
    PixelColor::from_value(0x00FF00),
    PixelColor::from_value(0x0000FF),
    PixelColor::from_value(0xFFFFFF),
];

/// Data pixels sit at multiples of this offset from anchor corner 0.
const DATA_PX_OFFSET: (i32, i32) = (5, 5);

/// Horizontal stride used to jump the search cursor once a left-side anchor
/// is found; the matching right-side anchor is at least this far away.
const ANCHOR_ROW_SKIP: i32 = 100;

pub struct SceneReader {
    buffer: ScreenBuffer,
    anchor_positions: [(i32, i32); 4],
    anchor_region: Rect,
    have_anchors: bool,
}

impl SceneReader {
    pub fn new(buffer: ScreenBuffer) -> Self {
        Self {
            buffer,
            anchor_positions: [(0, 0); 4],
            anchor_region: Rect::new(0, 0, 0, 0),
            have_anchors: false,
        }
    }

    pub fn buffer(&self) -> &ScreenBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ScreenBuffer {
        &mut self.buffer
    }

    /// Anchor positions are set.
    pub fn have_anchor_positions(&self) -> bool {
        self.have_anchors
    }

    /// The region spanned by anchor corners 0 and 3.
    pub fn anchor_region(&self) -> Result<Rect> {
        self.require_anchors()?;
        Ok(self.anchor_region)
    }

    /// Attempt to locate all four anchor markers on screen. Everything else
    /// here requires this to have succeeded.
    pub fn setup_anchors(&mut self) -> Result<bool> {
        self.anchor_positions = [(0, 0); 4];
        self.have_anchors = false;
        self.buffer.refresh_full()?;

        let width = self.buffer.display_mode().width;
        let height = self.buffer.display_mode().height;

        let mut next_anchor = 0;
        let mut offset: usize = 0;

        while next_anchor < 4 {
            let Some((x, y)) = self.buffer.find_first(ANCHOR_COLORS[0].value(), offset) else {
                break;
            };

            // The red pixel must be the top-left of a full 2x2 marker.
            let is_marker = x + 1 < width
                && y + 1 < height
                && self.buffer.color_at(x + 1, y, ANCHOR_COLORS[1].value())?
                && self.buffer.color_at(x, y + 1, ANCHOR_COLORS[2].value())?
                && self.buffer.color_at(x + 1, y + 1, ANCHOR_COLORS[3].value())?;
            if !is_marker {
                offset = (y * width + x + 1) as usize;
                continue;
            }

            match next_anchor {
                // Left side: continue the same row further right.
                0 | 2 => {
                    self.anchor_positions[next_anchor] = (x, y);
                    let skip_x = self.anchor_positions[0].0 + ANCHOR_ROW_SKIP;
                    offset = (y * width + skip_x) as usize;
                }
                // Right side: must share its left partner's row.
                _ => {
                    if self.anchor_positions[next_anchor - 1].1 != y {
                        return Ok(false);
                    }
                    self.anchor_positions[next_anchor] = (x, y);
                    let next_y = y + ANCHOR_ROW_SKIP;
                    offset = (next_y * width + self.anchor_positions[0].0) as usize;
                }
            }
            next_anchor += 1;
        }

        if next_anchor == self.anchor_positions.len() {
            let (x0, y0) = self.anchor_positions[0];
            let (x3, y3) = self.anchor_positions[3];
            self.anchor_region = Rect::new(x0, y0, x3 - x0, y3 - y0);
            self.have_anchors = true;
            debug!(
                x = x0,
                y = y0,
                width = self.anchor_region.width,
                height = self.anchor_region.height,
                "anchor region established"
            );
        }

        Ok(self.have_anchors)
    }

    /// Re-check that all four anchor markers are still on screen, refreshing
    /// the anchor region first.
    pub fn anchors_visible(&mut self) -> Result<bool> {
        self.require_anchors()?;
        let r = self.anchor_region;
        self.buffer.refresh_region(r.x, r.y, r.width, r.height)?;

        for (x, y) in self.anchor_positions {
            if !self.buffer.color_at(x, y, ANCHOR_COLORS[0].value())? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Check a data-pixel state flag. Refreshes only the 1x1 data-pixel
    /// region unless `reuse_buffer` asks to reuse the current raster.
    pub fn check_data_pixel(&mut self, colors: DataColors, reuse_buffer: bool) -> Result<bool> {
        self.require_anchors()?;

        let column = ((colors.bits() & 0xFF00_0000) >> 24) as i32;
        let (x0, y0) = self.anchor_positions[0];
        let data_x = x0 + DATA_PX_OFFSET.0 * (1 + column);
        let data_y = y0 + DATA_PX_OFFSET.1;

        if !reuse_buffer {
            self.buffer.refresh_region(data_x, data_y, 1, 1)?;
        }

        let pixel = self.buffer.get_pixel(data_x, data_y)?;
        Ok(pixel.contains(colors.bits() & 0x00FF_FFFF))
    }

    /// Count pixels whose R, G and B channels all meet `threshold` inside a
    /// square of `side_length` centered on (x, y). The splash detector.
    pub fn count_area_pixels_above(
        &mut self,
        x: i32,
        y: i32,
        side_length: i32,
        threshold: u8,
        reuse_buffer: bool,
    ) -> Result<u32> {
        let x0 = x - side_length / 2;
        let y0 = y - side_length / 2;

        if !reuse_buffer {
            self.buffer.refresh_region(x0, y0, side_length, side_length)?;
        }

        let mut count = 0;
        for yy in y0..y0 + side_length {
            for xx in x0..x0 + side_length {
                let pixel = self.buffer.get_pixel(xx, yy)?;
                if pixel.red() >= threshold
                    && pixel.green() >= threshold
                    && pixel.blue() >= threshold
                {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Buffered image of the anchor region, for calibration display.
    pub fn anchor_region_image(&self) -> Result<RgbaImage> {
        self.require_anchors()?;
        self.buffer.extract_rect(self.anchor_region, 1)
    }

    /// Refresh the anchor region and enumerate candidate bobber regions
    /// inside it.
    pub fn find_bobber_positions(
        &mut self,
        min_connected: u32,
        hue: i32,
        hue_tolerance: i32,
    ) -> Result<Vec<ScanResult>> {
        self.require_anchors()?;
        let r = self.anchor_region;
        self.buffer.refresh_region(r.x, r.y, r.width, r.height)?;

        RegionEnumerator::new(&self.buffer).find_regions(min_connected, hue, hue_tolerance, r)
    }

    fn require_anchors(&self) -> Result<()> {
        if !self.have_anchors {
            return Err(VisionError::AnchorsNotSet);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::StillCaptureSource;
    use image::Rgba;

    fn paint_marker(img: &mut RgbaImage, x: u32, y: u32) {
        img.put_pixel(x, y, Rgba([0xFF, 0, 0, 0xFF]));
        img.put_pixel(x + 1, y, Rgba([0, 0xFF, 0, 0xFF]));
        img.put_pixel(x, y + 1, Rgba([0, 0, 0xFF, 0xFF]));
        img.put_pixel(x + 1, y + 1, Rgba([0xFF, 0xFF, 0xFF, 0xFF]));
    }

    /// A frame with a valid anchor rectangle at (20, 10) - (180, 150).
    fn anchored_frame() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(256, 200, Rgba([5, 5, 5, 0xFF]));
        paint_marker(&mut img, 20, 10);
        paint_marker(&mut img, 180, 10);
        paint_marker(&mut img, 20, 150);
        paint_marker(&mut img, 180, 150);
        img
    }

    fn reader_over(frame: RgbaImage) -> SceneReader {
        let buffer = ScreenBuffer::new(Box::new(StillCaptureSource::new(frame))).unwrap();
        SceneReader::new(buffer)
    }

    #[test]
    fn setup_finds_a_consistent_anchor_rectangle() {
        let mut reader = reader_over(anchored_frame());
        assert!(reader.setup_anchors().unwrap());
        assert!(reader.have_anchor_positions());

        let region = reader.anchor_region().unwrap();
        assert_eq!(region, Rect::new(20, 10, 160, 140));
        assert!(reader.anchors_visible().unwrap());
    }

    #[test]
    fn stray_red_pixels_do_not_fool_the_search() {
        let mut img = anchored_frame();
        // Lone red pixels without the 2x2 companions, before the real anchor.
        img.put_pixel(3, 2, Rgba([0xFF, 0, 0, 0xFF]));
        img.put_pixel(10, 5, Rgba([0xFF, 0, 0, 0xFF]));

        let mut reader = reader_over(img);
        assert!(reader.setup_anchors().unwrap());
        assert_eq!(reader.anchor_region().unwrap(), Rect::new(20, 10, 160, 140));
    }

    #[test]
    fn misaligned_right_anchor_fails_the_whole_search() {
        let mut img = RgbaImage::from_pixel(256, 200, Rgba([5, 5, 5, 0xFF]));
        paint_marker(&mut img, 20, 10);
        paint_marker(&mut img, 180, 11); // one row off
        paint_marker(&mut img, 20, 150);
        paint_marker(&mut img, 180, 150);

        let mut reader = reader_over(img);
        assert!(!reader.setup_anchors().unwrap());
        assert!(!reader.have_anchor_positions());
    }

    #[test]
    fn missing_anchor_reports_failure_not_error() {
        let mut img = RgbaImage::from_pixel(256, 200, Rgba([5, 5, 5, 0xFF]));
        paint_marker(&mut img, 20, 10);

        let mut reader = reader_over(img);
        assert!(!reader.setup_anchors().unwrap());
    }

    #[test]
    fn anchor_dependent_calls_require_setup() {
        let mut reader = reader_over(anchored_frame());
        assert!(matches!(
            reader.check_data_pixel(DataColors::CASTING, false),
            Err(VisionError::AnchorsNotSet)
        ));
        assert!(matches!(
            reader.anchors_visible(),
            Err(VisionError::AnchorsNotSet)
        ));
        assert!(matches!(
            reader.find_bobber_positions(1, 90, 10),
            Err(VisionError::AnchorsNotSet)
        ));
    }

    #[test]
    fn data_pixel_flags_are_bitmask_subset_tests() {
        let mut img = anchored_frame();
        // Data pixel at anchor0 + (5, 5): casting and lure bits set.
        let bits = DataColors::CASTING.bits() | DataColors::LURE_ACTIVE.bits();
        img.put_pixel(
            25,
            15,
            Rgba([
                ((bits >> 16) & 0xFF) as u8,
                ((bits >> 8) & 0xFF) as u8,
                (bits & 0xFF) as u8,
                0xFF,
            ]),
        );

        let mut reader = reader_over(img);
        assert!(reader.setup_anchors().unwrap());
        assert!(reader.check_data_pixel(DataColors::CASTING, false).unwrap());
        assert!(reader
            .check_data_pixel(DataColors::LURE_ACTIVE, true)
            .unwrap());
        assert!(reader
            .check_data_pixel(DataColors::CASTING | DataColors::LURE_ACTIVE, true)
            .unwrap());
        assert!(!reader.check_data_pixel(DataColors::IN_COMBAT, true).unwrap());
        assert!(!reader
            .check_data_pixel(DataColors::TOOLTIP_SHOWN, true)
            .unwrap());
    }

    #[test]
    fn splash_counter_counts_bright_pixels_in_the_area() {
        let mut img = anchored_frame();
        // Five bright pixels around (100, 100), one dim outlier.
        for (x, y) in [(100, 100), (101, 100), (99, 100), (100, 99), (100, 101)] {
            img.put_pixel(x, y, Rgba([0xF0, 0xF0, 0xF0, 0xFF]));
        }
        img.put_pixel(102, 102, Rgba([0xF0, 0x40, 0xF0, 0xFF]));

        let mut reader = reader_over(img);
        let count = reader
            .count_area_pixels_above(100, 100, 10, 0xE0, false)
            .unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn splash_counter_rejects_areas_leaving_the_screen() {
        let mut reader = reader_over(anchored_frame());
        assert!(matches!(
            reader.count_area_pixels_above(2, 2, 10, 0xE0, false),
            Err(VisionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn find_bobber_positions_scans_the_anchor_region() {
        let mut img = anchored_frame();
        // A 6x6 block at hue ~90 inside the anchor region.
        for y in 60..66 {
            for x in 80..86 {
                img.put_pixel(x, y, Rgba([128, 255, 0, 0xFF]));
            }
        }
        // Same hue outside the anchor region: must not be reported.
        for y in 160..166 {
            for x in 200..206 {
                img.put_pixel(x, y, Rgba([128, 255, 0, 0xFF]));
            }
        }

        let mut reader = reader_over(img);
        assert!(reader.setup_anchors().unwrap());
        let regions = reader.find_bobber_positions(10, 90, 10).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].connected_pixels, 36);
        assert_eq!(
            (regions[0].x, regions[0].y, regions[0].width, regions[0].height),
            (80, 60, 5, 5)
        );
    }
}
