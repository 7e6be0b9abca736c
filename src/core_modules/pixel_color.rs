// THEORY:
// `PixelColor` is the most fundamental unit of the engine: a "dumb" data
// container for one 24-bit RGB sample plus its packed representation
// (R<<16 | G<<8 | B). Everything downstream — equality probes, bitmask data
// pixels, hue classification — is defined on this one type, so it stays
// copyable, immutable, and free of any knowledge about where the sample came
// from.
//
// The hue derivation is the standard HSV angle in degrees [0, 360). A fully
// achromatic sample (R == G == B) has no defined hue and reports 0. Callers in
// the classification path treat hue 0 as "never matches": a real hue of
// exactly 0 (pure red family) is therefore unmatchable by design. This is a
// documented degenerate case carried through the whole engine, not a bug to
// paper over.

/// A packed RGB color sample. Alpha is ignored throughout the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelColor {
    r: u8,
    g: u8,
    b: u8,
    value: u32,
}

impl PixelColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        let value = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
        Self { r, g, b, value }
    }

    /// Build from a packed value. Bits above the low 24 are discarded.
    pub const fn from_value(value: u32) -> Self {
        let value = value & 0x00FF_FFFF;
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
            value,
        }
    }

    pub const fn red(&self) -> u8 {
        self.r
    }

    pub const fn green(&self) -> u8 {
        self.g
    }

    pub const fn blue(&self) -> u8 {
        self.b
    }

    /// The packed 24-bit value (R<<16 | G<<8 | B).
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Bitmask subset test: true if every bit set in `value` is set here.
    /// Data pixels encode boolean state flags this way.
    pub const fn contains(&self, value: u32) -> bool {
        self.value & value == value
    }

    /// `contains` against another color's packed value.
    pub const fn contains_color(&self, other: PixelColor) -> bool {
        self.contains(other.value)
    }

    /// HSV hue in whole degrees [0, 360). Achromatic samples report 0.
    pub fn hue(&self) -> i32 {
        let r = self.r as f32;
        let g = self.g as f32;
        let b = self.b as f32;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        if max == min {
            return 0;
        }

        let delta = max - min;
        let hue = if max == r {
            60.0 * (g - b) / delta
        } else if max == g {
            60.0 * (b - r) / delta + 120.0
        } else {
            60.0 * (r - g) / delta + 240.0
        };

        (hue.round() as i32).rem_euclid(360)
    }
}

impl std::fmt::Display for PixelColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} (#{:06X})", self.r, self.g, self.b, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_channels_into_value() {
        let px = PixelColor::new(0x12, 0x34, 0x56);
        assert_eq!(px.value(), 0x123456);
        assert_eq!(px, PixelColor::from_value(0x123456));
        assert_eq!(px.red(), 0x12);
        assert_eq!(px.green(), 0x34);
        assert_eq!(px.blue(), 0x56);
    }

    #[test]
    fn from_value_discards_alpha_bits() {
        assert_eq!(PixelColor::from_value(0xFF123456).value(), 0x123456);
    }

    #[test]
    fn contains_is_a_subset_test() {
        let px = PixelColor::from_value(0x00F0F0);
        assert!(px.contains(0x00F000));
        assert!(px.contains(0x0000F0));
        assert!(px.contains(0x00F0F0));
        assert!(!px.contains(0x010000));
        assert!(px.contains_color(PixelColor::from_value(0x000010)));
    }

    #[test]
    fn hue_of_primaries() {
        assert_eq!(PixelColor::new(255, 0, 0).hue(), 0);
        assert_eq!(PixelColor::new(0, 255, 0).hue(), 120);
        assert_eq!(PixelColor::new(0, 0, 255).hue(), 240);
        assert_eq!(PixelColor::new(255, 255, 0).hue(), 60);
    }

    #[test]
    fn achromatic_hue_is_zero() {
        assert_eq!(PixelColor::new(0, 0, 0).hue(), 0);
        assert_eq!(PixelColor::new(128, 128, 128).hue(), 0);
        assert_eq!(PixelColor::new(255, 255, 255).hue(), 0);
    }

    #[test]
    fn hue_wraps_into_positive_range() {
        // r max, strong blue tint: 60 * (0 - 60) / 240 = -15 -> 345.
        assert_eq!(PixelColor::new(240, 0, 60).hue(), 345);
        // Small positive hue: 60 * 20 / 240 = 5.
        assert_eq!(PixelColor::new(240, 20, 0).hue(), 5);
    }
}
