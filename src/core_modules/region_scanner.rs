// THEORY:
// `RegionScanner` is the core of the engine: connected-component counting of
// classifier-matching pixels, reported as a pixel count plus an axis-aligned
// bounding box instead of a filled mask. The implementation is the span-filling
// "combined scan and fill" flood fill, stack-based rather than recursive:
// regions can run to tens of thousands of pixels and naive recursion would
// overflow the call stack.
//
// Each stack entry is a horizontal run already known to need scanning on row
// `y`, expanding in `dy` (+1/-1) from the row that discovered it. Popped spans
// are extended left and right along their row while pixels match and are
// unvisited; every maximal run then pushes a candidate span for the next row
// in its direction, and — when the run grew past the original x-range — also
// for the opposite direction, which is what lets a single pass cover irregular
// shapes without revisiting rows. The visited grid guarantees no pixel is
// counted twice and that the scan terminates. Directional pushes check the
// target row stays within the surface, so no out-of-bounds row is ever
// enqueued.
//
// The visited grid is sized to the full working surface, allocated once per
// scanner, and cleared at the start of every call: this routine runs many
// times per second during active scanning and a fresh allocation per call
// would be pure churn. Each call therefore sees a fresh grid; results are
// deterministic and repeatable for an unchanged surface.

use crate::core_modules::hue_classifier::HueClassifier;
use crate::core_modules::surface::PixelSurface;
use crate::error::{Result, VisionError};

/// Immutable record of one flood count: pixel total plus bounding box.
///
/// Bounding extents are inclusive min/max coordinates converted to a
/// width/height of `max - min`; a single-pixel region has width and height 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanResult {
    pub connected_pixels: u32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScanResult {
    fn from_extents(count: u32, x_left: i32, x_right: i32, y_top: i32, y_bottom: i32) -> Self {
        Self {
            connected_pixels: count,
            x: x_left,
            y: y_top,
            width: x_right - x_left,
            height: y_bottom - y_top,
        }
    }

    /// The bounding-box centroid, integer-truncated.
    pub const fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// The x-coordinate of the right edge (x + width).
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// The y-coordinate of the bottom edge (y + height).
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// True if the coordinate is inside the bounding box of this result,
    /// edges inclusive. Inclusive matters: the extents are min/max pixel
    /// coordinates, and an enumeration that treated the bottom row or right
    /// column as outside would rediscover the same region from there.
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        self.x <= x && x <= self.x + self.width && self.y <= y && y <= self.y + self.height
    }
}

/// A horizontal run on row `y` queued for scanning, expanding in `dy`.
struct Span {
    x1: i32,
    x2: i32,
    y: i32,
    dy: i32,
}

/// Counts connected pixels in a configured hue window over any pixel surface.
pub struct RegionScanner<'a, S: PixelSurface> {
    surface: &'a S,
    classifier: HueClassifier,
    width: i32,
    height: i32,
    visited: Vec<bool>,
}

impl<'a, S: PixelSurface> RegionScanner<'a, S> {
    pub fn new(surface: &'a S, classifier: HueClassifier) -> Self {
        let width = surface.width();
        let height = surface.height();
        Self {
            surface,
            classifier,
            width,
            height,
            visited: vec![false; (width as usize) * (height as usize)],
        }
    }

    pub fn classifier(&self) -> &HueClassifier {
        &self.classifier
    }

    /// Check if the pixel is in the configured hue window, ignoring the
    /// visited grid. Callers use this to pre-filter seeds.
    pub fn is_candidate(&self, x: i32, y: i32) -> bool {
        self.classifier.matches(self.surface.pixel(x, y))
    }

    /// Count all connected in-window pixels reachable from the seed.
    ///
    /// Precondition: the seed must be inside the surface and match the
    /// classifier; a non-matching seed is a caller bug and fails with
    /// `InvalidSeed`. The visited grid is cleared on entry, so every call
    /// counts against a fresh grid.
    pub fn count_from(&mut self, x: i32, y: i32) -> Result<ScanResult> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return Err(VisionError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.visited.fill(false);
        self.combined_scan_and_fill(x, y)
    }

    fn in_range_and_unvisited(&self, x: i32, y: i32) -> bool {
        if self.visited[(y * self.width + x) as usize] {
            return false;
        }
        self.classifier.matches(self.surface.pixel(x, y))
    }

    fn confirm(&mut self, x: i32, y: i32) {
        self.visited[(y * self.width + x) as usize] = true;
    }

    // Span-filling combined-scan-and-fill flood fill, modified to count the
    // pixels it confirms and to track the bounding extents instead of
    // producing a filled mask.
    fn combined_scan_and_fill(&mut self, seed_x: i32, seed_y: i32) -> Result<ScanResult> {
        if !self.in_range_and_unvisited(seed_x, seed_y) {
            return Err(VisionError::InvalidSeed {
                x: seed_x,
                y: seed_y,
            });
        }

        let mut count: u32 = 0;
        let mut x_min = self.width;
        let mut x_max = 0;
        let mut y_min = self.height;
        let mut y_max = 0;

        let mut stack: Vec<Span> = Vec::new();
        stack.push(Span {
            x1: seed_x,
            x2: seed_x,
            y: seed_y,
            dy: 1,
        });
        if seed_y > 0 {
            stack.push(Span {
                x1: seed_x,
                x2: seed_x,
                y: seed_y - 1,
                dy: -1,
            });
        }

        while let Some(span) = stack.pop() {
            let Span { mut x1, x2, y, dy } = span;
            let mut x = x1;

            if self.in_range_and_unvisited(x, y) {
                // Extend leftward past the span's start.
                x -= 1;
                while x >= 0 && self.in_range_and_unvisited(x, y) {
                    self.confirm(x, y);
                    x_min = x_min.min(x);
                    x_max = x_max.max(x);
                    y_min = y_min.min(y);
                    y_max = y_max.max(y);
                    count += 1;
                    x -= 1;
                }
                x += 1;

                // The run grew left of the original span: the opposite row
                // may hold a branch the initial direction would miss.
                let new_y = y - dy;
                if x < x1 && new_y >= 0 && new_y < self.height {
                    stack.push(Span {
                        x1: x,
                        x2: x1 - 1,
                        y: new_y,
                        dy: -dy,
                    });
                }
            }

            while x1 <= x2 {
                // Extend rightward through the current maximal run.
                while x1 < self.width && self.in_range_and_unvisited(x1, y) {
                    self.confirm(x1, y);
                    x_min = x_min.min(x1);
                    x_max = x_max.max(x1);
                    y_min = y_min.min(y);
                    y_max = y_max.max(y);
                    count += 1;
                    x1 += 1;
                }

                let new_y = y + dy;
                if x1 > x && new_y >= 0 && new_y < self.height {
                    stack.push(Span {
                        x1: x,
                        x2: x1 - 1,
                        y: new_y,
                        dy,
                    });
                }

                let new_y = y - dy;
                if x1 - 1 > x2 && new_y >= 0 && new_y < self.height {
                    stack.push(Span {
                        x1: x2 + 1,
                        x2: x1 - 1,
                        y: new_y,
                        dy: -dy,
                    });
                }

                // Skip the gap to the next run inside the original x-range.
                x1 += 1;
                while x1 < x2 && !self.in_range_and_unvisited(x1, y) {
                    x1 += 1;
                }
                x = x1;
            }
        }

        Ok(ScanResult::from_extents(count, x_min, x_max, y_min, y_max))
    }
}
