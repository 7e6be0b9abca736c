// THEORY:
// `HueClassifier` is the stateless membership test the flood counter is built
// on: given a target hue and a tolerance, decide whether a pixel belongs to
// the class. Both edges of the window are clipped into [0, 360); when the
// addition or subtraction crossed the 0-degree boundary the clipped max ends
// up below the clipped min, and the window is interpreted as wrapping through
// 0 (min=350, max=10 means "350..360 or 0..10").
//
// A pixel whose derived hue is exactly 0 never matches, whatever the window.
// Achromatic pixels (black, white, every gray) all report hue 0, and excluding
// them wholesale is what keeps the counter from flooding across unlit
// background. The cost is that a true hue of 0 is unmatchable; callers pick
// target hues accordingly.

use crate::core_modules::pixel_color::PixelColor;

/// Clip a hue rotation into the 360-degree range.
pub fn clip_hue(hue: i32) -> i32 {
    hue.rem_euclid(360)
}

#[derive(Debug, Clone, Copy)]
pub struct HueClassifier {
    min_hue: i32,
    max_hue: i32,
}

impl HueClassifier {
    pub fn new(target_hue: i32, tolerance: i32) -> Self {
        let target = clip_hue(target_hue);
        Self {
            min_hue: clip_hue(target - tolerance),
            max_hue: clip_hue(target + tolerance),
        }
    }

    /// The window edges, inclusive. `max < min` means the window wraps
    /// through 0 degrees.
    pub fn window(&self) -> (i32, i32) {
        (self.min_hue, self.max_hue)
    }

    pub fn matches(&self, pixel: PixelColor) -> bool {
        let hue = pixel.hue();
        if hue == 0 {
            return false;
        }

        if self.max_hue < self.min_hue {
            hue <= self.max_hue || hue >= self.min_hue
        } else {
            hue >= self.min_hue && hue <= self.max_hue
        }
    }
}
