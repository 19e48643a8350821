//! Enumeration types for the Radcliffe Wave animation driver.
//!
//! These mirror the configuration surface the planetarium engine exposes
//! for tabular layers: the reference frame a layer is registered under,
//! the units its coordinate columns carry, and how markers are scaled.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reference frames
// ---------------------------------------------------------------------------

/// The coordinate reference frame a layer is registered under.
///
/// The Radcliffe Wave datasets all live in the sky frame; the other
/// variants exist because the engine's layer manager accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReferenceFrame {
    /// Equatorial sky coordinates (RA/Dec).
    Sky,
    /// Ecliptic coordinates.
    Ecliptic,
    /// Galactic coordinates.
    Galactic,
}

impl ReferenceFrame {
    /// The frame name the engine's layer manager expects.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sky => "Sky",
            Self::Ecliptic => "Ecliptic",
            Self::Galactic => "Galactic",
        }
    }
}

// ---------------------------------------------------------------------------
// Column units
// ---------------------------------------------------------------------------

/// Units of the longitude (right ascension) column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RaUnits {
    /// Right ascension expressed in hours (0-24).
    Hours,
    /// Right ascension expressed in degrees (0-360).
    Degrees,
}

/// Units of the altitude (distance) column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AltUnit {
    /// Meters.
    Meters,
    /// Kilometers.
    Kilometers,
    /// Astronomical units.
    AstronomicalUnits,
    /// Light-years.
    LightYears,
    /// Parsecs. The Radcliffe Wave datasets use this unit.
    Parsecs,
}

/// Interpretation of the altitude column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AltType {
    /// Height above a reference surface.
    Altitude,
    /// Radial distance from the observer. Used for all four datasets.
    Distance,
    /// Height relative to sea level.
    SeaLevel,
}

// ---------------------------------------------------------------------------
// Marker rendering
// ---------------------------------------------------------------------------

/// How marker sizes respond to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarkerScale {
    /// Markers keep a fixed on-screen size regardless of zoom.
    Screen,
    /// Markers scale with world-space distance.
    World,
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// The four Radcliffe Wave datasets the driver loads at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    /// Dust cloud positions along the wave.
    Dust,
    /// Stellar cluster positions along the wave.
    Cluster,
    /// The Sun's position, for visual reference.
    Sun,
    /// The best-fit wave model. Drives the polyline annotation rather
    /// than a time-series layer.
    BestFit,
}

impl DatasetKind {
    /// Human-readable layer name registered with the engine.
    pub const fn layer_name(self) -> &'static str {
        match self {
            Self::Dust => "Radcliffe Wave Dust",
            Self::Cluster => "Radcliffe Wave Cluster",
            Self::Sun => "Radcliffe Wave Sun",
            Self::BestFit => "Radcliffe Wave Best Fit",
        }
    }

    /// Whether this dataset carries a phase-bucket column (column 3).
    pub const fn has_phase_column(self) -> bool {
        matches!(self, Self::BestFit)
    }

    /// Whether this dataset is rendered as a time-series layer whose rows
    /// carry validity windows.
    pub const fn is_time_series(self) -> bool {
        !matches!(self, Self::BestFit)
    }

    /// All four dataset kinds in setup order.
    pub const fn all() -> [Self; 4] {
        [Self::Dust, Self::Cluster, Self::Sun, Self::BestFit]
    }
}
