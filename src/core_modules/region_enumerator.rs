// THEORY:
// `RegionEnumerator` turns the single-region flood counter into "find every
// distinct region inside this window". It walks the search rectangle in
// row-major order, and for each candidate pixel either skips it (it falls
// inside a bounding box already on the result list — the column cursor then
// jumps straight to that region's right edge, an optimization the row-major
// order makes safe) or flood-counts from it. Regions below the caller's
// minimum pixel count are counted but not recorded; either way the cursor
// advances past the region's width so the same row never rescans it.
//
// Row enumeration stops once more than `SANITY_CHECK_AMOUNT` regions have been
// recorded. That cap is a cost bound, not a correctness rule: a misconfigured
// hue window can match most of the frame, and without the cap the enumeration
// would flood-count its way across all of it. Results come back in discovery
// order — callers that care about position or size sort for themselves.

use crate::core_modules::hue_classifier::HueClassifier;
use crate::core_modules::region_scanner::{RegionScanner, ScanResult};
use crate::core_modules::surface::{PixelSurface, Rect};
use crate::error::{Result, VisionError};

/// Stop scanning further rows after this many regions have been found.
const SANITY_CHECK_AMOUNT: usize = 10;

pub struct RegionEnumerator<'a, S: PixelSurface> {
    surface: &'a S,
}

impl<'a, S: PixelSurface> RegionEnumerator<'a, S> {
    pub fn new(surface: &'a S) -> Self {
        Self { surface }
    }

    /// Enumerate distinct regions of connected in-window pixels inside
    /// `search`, in discovery order. Only regions with at least
    /// `min_connected` pixels are recorded.
    pub fn find_regions(
        &self,
        min_connected: u32,
        target_hue: i32,
        hue_tolerance: i32,
        search: Rect,
    ) -> Result<Vec<ScanResult>> {
        if search.x < 0
            || search.y < 0
            || search.width < 0
            || search.height < 0
            || search.right() > self.surface.width()
            || search.bottom() > self.surface.height()
        {
            return Err(VisionError::OutOfRange {
                x: search.x,
                y: search.y,
                width: self.surface.width(),
                height: self.surface.height(),
            });
        }

        let classifier = HueClassifier::new(target_hue, hue_tolerance);
        let mut scanner = RegionScanner::new(self.surface, classifier);
        let mut found: Vec<ScanResult> = Vec::new();

        let mut y = search.y;
        while y < search.bottom() {
            if found.len() > SANITY_CHECK_AMOUNT {
                break;
            }

            let mut x = search.x;
            while x < search.right() {
                if !classifier.matches(self.surface.pixel(x, y)) {
                    x += 1;
                    continue;
                }

                // Inside a known region: jump to its right edge.
                if let Some(area) = found.iter().find(|area| area.contains(x, y)) {
                    x = area.right();
                    x += 1;
                    continue;
                }

                let result = scanner.count_from(x, y)?;
                if result.connected_pixels >= min_connected {
                    found.push(result);
                }

                // Skip what we just counted on this row.
                x += result.width;
                x += 1;
            }

            y += 1;
        }

        Ok(found)
    }
}
