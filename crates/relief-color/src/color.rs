//! Color types and conversions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ColorError, ColorResult};

/// An 8-bit RGB color. Equality is exact per channel.
///
/// Serializes as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceptual brightness, `0.299·R + 0.587·G + 0.114·B`.
    #[inline]
    pub fn luminance(self) -> f64 {
        0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b)
    }

    /// Lower-case `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#RRGGBB` or `RRGGBB`, case-insensitive.
    pub fn from_hex(value: &str) -> ColorResult<Self> {
        let invalid = || ColorError::InvalidHex {
            value: value.to_string(),
        };

        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    #[inline]
    pub fn to_f64(self) -> RgbF {
        RgbF::new(f64::from(self.r), f64::from(self.g), f64::from(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> ColorResult<Self> {
        Rgb::from_hex(s)
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_hex()
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorError;

    fn try_from(s: String) -> ColorResult<Self> {
        Rgb::from_hex(&s)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

/// A continuous RGB point on the 0–255 scale, used for cluster math.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RgbF {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbF {
    #[inline]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn dist_sq(self, other: RgbF) -> f64 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        dr * dr + dg * dg + db * db
    }

    #[inline]
    pub fn dist(self, other: RgbF) -> f64 {
        self.dist_sq(other).sqrt()
    }

    /// Round to the nearest 8-bit color.
    pub fn to_rgb(self) -> Rgb {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Rgb::new(channel(self.r), channel(self.g), channel(self.b))
    }
}

impl std::ops::Add for RgbF {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.r + o.r, self.g + o.g, self.b + o.b)
    }
}

impl std::ops::Mul<f64> for RgbF {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip_is_lower_case() {
        let c = Rgb::from_hex("#FFA500").unwrap();
        assert_eq!(c, Rgb::new(255, 165, 0));
        assert_eq!(c.to_hex(), "#ffa500");
    }

    #[test]
    fn test_hex_accepts_missing_hash() {
        assert_eq!(Rgb::from_hex("ff00ff").unwrap(), Rgb::new(255, 0, 255));
    }

    #[test]
    fn test_hex_rejects_malformed() {
        for bad in ["", "#fff", "#gg0000", "#1234567", "red", "#12 456"] {
            assert!(Rgb::from_hex(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_luminance_orders_black_below_white() {
        assert_eq!(Rgb::BLACK.luminance(), 0.0);
        assert!((Rgb::WHITE.luminance() - 255.0).abs() < 1e-9);
        assert!(Rgb::new(255, 0, 0).luminance() < Rgb::new(0, 255, 0).luminance());
    }

    #[test]
    fn test_rounding_clamps_to_byte_range() {
        assert_eq!(RgbF::new(-3.0, 127.5, 300.0).to_rgb(), Rgb::new(0, 128, 255));
    }

    #[test]
    fn test_serde_uses_hex_strings() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 255)).unwrap();
        assert_eq!(json, "\"#0102ff\"");
        let back: Rgb = serde_json::from_str("\"#0102FF\"").unwrap();
        assert_eq!(back, Rgb::new(1, 2, 255));
    }
}
