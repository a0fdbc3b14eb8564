//! Rank-percentile display colors.

use serde::{Serialize, Serializer};
use std::fmt;

/// An sRGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert HSV components (all in 0.0..=1.0) to RGB.
    pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Self {
        let h = (hue.rem_euclid(1.0)) * 6.0;
        let s = saturation.clamp(0.0, 1.0);
        let v = value.clamp(0.0, 1.0);

        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match sector as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };

        let to_byte = |c: f64| (c * 255.0).round() as u8;
        Self::new(to_byte(r), to_byte(g), to_byte(b))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::RED
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Maps a rank percentile (1.0 = best, 0.0 = worst) to a color.
pub type ColorScale = fn(f64) -> Rgb;

const GREEN_HUE: f64 = 100.0 / 360.0;

/// Red-to-green gradient, darkening slightly toward green.
pub fn hsv_gradient(percentile: f64) -> Rgb {
    let hue = percentile.clamp(0.0, 1.0) * GREEN_HUE;
    let shade = 1.0 - 0.5 * hue;
    Rgb::from_hsv(hue, shade, shade)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb::new(255, 0, 16).to_string(), "#ff0010");
    }

    #[test]
    fn test_from_hsv_primaries() {
        assert_eq!(Rgb::from_hsv(0.0, 1.0, 1.0), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsv(1.0 / 3.0, 1.0, 1.0), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hsv(2.0 / 3.0, 1.0, 1.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_gradient_worst_is_red() {
        assert_eq!(hsv_gradient(0.0), Rgb::RED);
    }

    #[test]
    fn test_gradient_best_is_greenish() {
        let best = hsv_gradient(1.0);
        assert!(best.g > best.r);
        assert!(best.g > best.b);
    }

    #[test]
    fn test_gradient_is_ordered() {
        // Red fades monotonically as the percentile rises.
        let mut last = u8::MAX;
        for step in 0..=10 {
            let color = hsv_gradient(step as f64 / 10.0);
            assert!(color.r <= last);
            last = color.r;
        }
    }

    #[test]
    fn test_rgb_serializes_as_hex() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
    }
}
