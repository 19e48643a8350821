//! Core data structs for the Radcliffe Wave animation driver.
//!
//! Covers the 3-D point type produced by projection, the typed dataset
//! row extracted from a tabular layer, and the RGBA color applied to
//! layers and annotations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Point3
// ---------------------------------------------------------------------------

/// A point in the engine's 3-D scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Point3 {
    /// Create a point from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance from the origin.
    pub fn magnitude(&self) -> f64 {
        self.z
            .mul_add(self.z, self.x.mul_add(self.x, self.y * self.y))
            .sqrt()
    }
}

// ---------------------------------------------------------------------------
// DataRow
// ---------------------------------------------------------------------------

/// A typed row extracted from a tabular layer.
///
/// Rows are immutable once produced by the layer host. The phase bucket
/// is only present for the best-fit dataset; the validity window is only
/// present for time-series datasets (and may be half-open when a cell
/// fails to parse -- ingestion treats that as unbounded, not an error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    /// Longitude (right ascension) in degrees.
    pub lng: f64,
    /// Latitude (declination) in degrees.
    pub lat: f64,
    /// Altitude (distance from the observer) in parsecs.
    pub alt: f64,
    /// Oscillation phase bucket in `[0, 360)`, best-fit rows only.
    pub phase: Option<u32>,
    /// Start of the row's validity window, if bounded.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the row's validity window, if bounded.
    pub valid_until: Option<DateTime<Utc>>,
}

impl DataRow {
    /// Whether the row is visible at the given simulated time.
    ///
    /// A missing window bound is treated as unbounded on that side.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        let after_start = self.valid_from.is_none_or(|from| now >= from);
        let before_end = self.valid_until.is_none_or(|until| now < until);
        after_start && before_end
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An RGBA color applied to layers and annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Create an opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a `#rrggbb` or `#rrggbbaa` hex string.
    ///
    /// Returns `None` when the string is not one of those two shapes.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        let channel = |range: core::ops::Range<usize>| {
            digits
                .get(range)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        };
        match digits.len() {
            6 => Some(Self {
                r: channel(0..2)?,
                g: channel(2..4)?,
                b: channel(4..6)?,
                a: 255,
            }),
            8 => Some(Self {
                r: channel(0..2)?,
                g: channel(2..4)?,
                b: channel(4..6)?,
                a: channel(6..8)?,
            }),
            _ => None,
        }
    }

    /// Render the color as a lowercase `#rrggbb` or `#rrggbbaa` string.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_dust_layer_color() {
        let color = Color::from_hex("#ec0018").unwrap();
        assert_eq!(color, Color::rgb(0xec, 0x00, 0x18));
        assert_eq!(color.to_hex(), "#ec0018");
    }

    #[test]
    fn parse_color_with_alpha() {
        let color = Color::from_hex("#83befb80").unwrap();
        assert_eq!(color.a, 0x80);
        assert_eq!(color.to_hex(), "#83befb80");
    }

    #[test]
    fn reject_malformed_hex() {
        assert!(Color::from_hex("ec0018").is_none());
        assert!(Color::from_hex("#ec001").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
        assert!(Color::from_hex("#").is_none());
    }

    #[test]
    fn magnitude_of_unit_axes() {
        assert!((Point3::new(1.0, 0.0, 0.0).magnitude() - 1.0).abs() < 1e-12);
        assert!((Point3::new(0.0, 3.0, 4.0).magnitude() - 5.0).abs() < 1e-12);
    }

    fn utc(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn row_visibility_window() {
        let row = DataRow {
            lng: 10.0,
            lat: 20.0,
            alt: 300.0,
            phase: None,
            valid_from: Some(utc(2024, 1, 1)),
            valid_until: Some(utc(2024, 2, 1)),
        };
        assert!(!row.is_visible_at(utc(2023, 12, 31)));
        assert!(row.is_visible_at(utc(2024, 1, 1)));
        assert!(row.is_visible_at(utc(2024, 1, 15)));
        assert!(!row.is_visible_at(utc(2024, 2, 1)));
    }

    #[test]
    fn row_without_window_is_always_visible() {
        let row = DataRow {
            lng: 0.0,
            lat: 0.0,
            alt: 0.0,
            phase: Some(5),
            valid_from: None,
            valid_until: None,
        };
        assert!(row.is_visible_at(utc(1990, 1, 1)));
        assert!(row.is_visible_at(utc(2100, 1, 1)));
    }
}
