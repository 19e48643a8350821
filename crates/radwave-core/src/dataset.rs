//! Dataset descriptors and layer settings for the four wave datasets.
//!
//! Each dataset ships as a delimited text file with a fixed column
//! layout: longitude, latitude, altitude, then (best-fit only) the phase
//! bucket, then the validity-window start and end dates. The descriptors
//! here resolve per-dataset presentation (color, marker scale factor,
//! line-ending normalization) into the [`LayerSettings`] handed to the
//! engine's layer host.

use std::borrow::Cow;

use radwave_types::{AltType, AltUnit, Color, DatasetKind, MarkerScale, RaUnits};

/// Column index of the longitude (right ascension) value.
pub const LNG_COLUMN: usize = 0;

/// Column index of the latitude (declination) value.
pub const LAT_COLUMN: usize = 1;

/// Column index of the altitude (distance) value.
pub const ALT_COLUMN: usize = 2;

/// Column index of the phase bucket (best-fit dataset only).
pub const PHASE_COLUMN: usize = 3;

/// Column index of the validity-window start date.
pub const START_DATE_COLUMN: usize = 4;

/// Column index of the validity-window end date.
pub const END_DATE_COLUMN: usize = 5;

/// Column bindings and presentation settings for a tabular layer.
///
/// This is the driver-side mirror of the engine's per-layer setters:
/// which columns carry which roles, how the coordinate columns are
/// interpreted, and how markers are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSettings {
    /// Column carrying longitude values.
    pub lng_column: usize,
    /// Column carrying latitude values.
    pub lat_column: usize,
    /// Column carrying altitude values.
    pub alt_column: usize,
    /// Column carrying the phase bucket, when the dataset has one.
    pub phase_column: Option<usize>,
    /// Column carrying the validity-window start date, for time series.
    pub start_date_column: Option<usize>,
    /// Column carrying the validity-window end date, for time series.
    pub end_date_column: Option<usize>,
    /// Whether rows carry validity windows the engine should honor.
    pub time_series: bool,
    /// Units of the longitude column.
    pub ra_units: RaUnits,
    /// Units of the altitude column.
    pub alt_unit: AltUnit,
    /// Interpretation of the altitude column.
    pub alt_type: AltType,
    /// Marker color.
    pub color: Color,
    /// Whether markers on the far side of the view sphere are drawn.
    pub show_far_side: bool,
    /// Marker size multiplier.
    pub scale_factor: f64,
    /// How marker sizes respond to the camera.
    pub marker_scale: MarkerScale,
}

/// A resolved dataset descriptor: where the data lives and how its layer
/// is presented.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    /// Which of the four datasets this is.
    pub kind: DatasetKind,
    /// File name of the delimited text source (relative to the data dir).
    pub file_name: String,
    /// Marker / line color for the layer.
    pub color: Color,
    /// Marker size multiplier for the layer.
    pub scale_factor: f64,
}

impl DatasetSpec {
    /// Create a descriptor for `kind` backed by `file_name`.
    pub const fn new(kind: DatasetKind, file_name: String, color: Color, scale_factor: f64) -> Self {
        Self {
            kind,
            file_name,
            color,
            scale_factor,
        }
    }

    /// Whether the raw text needs CRLF normalization before ingestion.
    ///
    /// The sun and best-fit files ship with bare LF line endings that the
    /// upstream spreadsheet parser does not split on.
    pub const fn needs_newline_normalization(&self) -> bool {
        matches!(self.kind, DatasetKind::Sun | DatasetKind::BestFit)
    }

    /// Prepare raw file text for the layer host, normalizing line
    /// endings when this dataset requires it.
    pub fn prepare_text<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.needs_newline_normalization() {
            Cow::Owned(normalize_line_endings(text))
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Build the layer settings for this dataset.
    ///
    /// All four datasets share the fixed column layout; the best-fit
    /// dataset additionally binds the phase column and is *not* a time
    /// series (its rows feed the annotation, not windowed rendering).
    pub fn layer_settings(&self) -> LayerSettings {
        let time_series = self.kind.is_time_series();
        LayerSettings {
            lng_column: LNG_COLUMN,
            lat_column: LAT_COLUMN,
            alt_column: ALT_COLUMN,
            phase_column: self.kind.has_phase_column().then_some(PHASE_COLUMN),
            start_date_column: time_series.then_some(START_DATE_COLUMN),
            end_date_column: time_series.then_some(END_DATE_COLUMN),
            time_series,
            ra_units: RaUnits::Degrees,
            alt_unit: AltUnit::Parsecs,
            alt_type: AltType::Distance,
            color: self.color,
            show_far_side: true,
            scale_factor: self.scale_factor,
            marker_scale: MarkerScale::Screen,
        }
    }
}

/// Normalize line endings to CRLF.
///
/// Mixed or bare-LF input comes out uniformly CRLF-terminated; already
/// normalized input passes through unchanged.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}
