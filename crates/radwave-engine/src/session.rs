//! Headless engine session standing in for the remote rendering engine.
//!
//! [`HeadlessSession`] implements the five collaborator traits the driver
//! consumes: a rate-scaled simulation clock, a tabular layer host with
//! fixed-layout delimited-text ingestion, spherical sky projection, an
//! annotation registry, and camera/scene state. There is no rendering --
//! the session tracks exactly the state the driver reads back and logs
//! the rest, which is enough to run the full animation cycle end to end.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use radwave_core::annotation::PolylineAnnotation;
use radwave_core::dataset::LayerSettings;
use radwave_core::engine::{
    AnnotationHost, CameraHost, EngineError, LayerHost, SceneSettings, SkyProjector,
    SpaceTimeClock, spherical_to_cartesian,
};
use radwave_types::{AnnotationId, DataRow, LayerId, Point3, ReferenceFrame};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Simulation clock
// ---------------------------------------------------------------------------

/// A simulated clock advancing at a fixed multiple of wall time.
///
/// The simulated value is derived from a base pair (simulated time,
/// wall instant); `set_now` and `set_rate` re-base so the derivation
/// never drifts across changes.
#[derive(Debug)]
struct RateClock {
    /// Simulated time at the base instant.
    base_sim: DateTime<Utc>,
    /// Wall instant the base was taken.
    base_wall: Instant,
    /// Simulated seconds per wall second.
    rate: f64,
}

impl RateClock {
    fn new(start: DateTime<Utc>, rate: f64) -> Self {
        Self {
            base_sim: start,
            base_wall: Instant::now(),
            rate,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed_ms = self.base_wall.elapsed().as_secs_f64() * self.rate * 1000.0;
        #[allow(clippy::cast_possible_truncation)]
        let delta = TimeDelta::milliseconds(elapsed_ms as i64);
        self.base_sim + delta
    }

    fn set_now(&mut self, now: DateTime<Utc>) {
        self.base_sim = now;
        self.base_wall = Instant::now();
    }

    fn set_rate(&mut self, rate: f64) {
        // Pin the current simulated value before the rate changes.
        let pinned = self.now();
        self.base_sim = pinned;
        self.base_wall = Instant::now();
        self.rate = rate;
    }
}

// ---------------------------------------------------------------------------
// Tabular layers
// ---------------------------------------------------------------------------

/// A registered tabular layer: raw cells plus bindings and typed rows.
#[derive(Debug)]
struct TableLayer {
    /// Layer name as registered.
    name: String,
    /// Reference frame the layer was registered under.
    frame: ReferenceFrame,
    /// Raw table cells, one inner vec per non-blank line.
    cells: Vec<Vec<String>>,
    /// Column bindings, once configured.
    settings: Option<LayerSettings>,
    /// Typed rows, extracted when the layer is configured.
    rows: Vec<DataRow>,
}

/// Split delimited text into trimmed cells.
///
/// The delimiter is guessed from the first line (tab when present,
/// comma otherwise), matching the upstream spreadsheet ingester. Blank
/// lines are dropped.
fn parse_cells(text: &str) -> Vec<Vec<String>> {
    let delimiter = if text.lines().next().is_some_and(|line| line.contains('\t')) {
        '\t'
    } else {
        ','
    };
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(delimiter)
                .map(|cell| cell.trim().to_owned())
                .collect()
        })
        .collect()
}

/// Fetch a cell by column index.
fn cell<'r>(row: &'r [String], column: usize) -> Option<&'r str> {
    row.get(column).map(String::as_str)
}

/// Parse a cell as a floating-point value.
fn cell_f64(row: &[String], column: usize) -> Option<f64> {
    cell(row, column)?.parse::<f64>().ok()
}

/// Parse a cell as a phase bucket.
///
/// Buckets are written as integers, but a few exports carry them as
/// floats; both parse, negative and non-finite values do not.
fn cell_phase(row: &[String], column: usize) -> Option<u32> {
    let raw = cell(row, column)?;
    raw.parse::<u32>().ok().or_else(|| {
        let value = raw.parse::<f64>().ok()?;
        if value.is_finite() && value >= 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let bucket = value.round() as u32;
            Some(bucket)
        } else {
            None
        }
    })
}

/// Parse a cell as a timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (with or without a trailing
/// `Z`), and bare `YYYY-MM-DD` dates. An unparseable cell yields `None`,
/// which ingestion treats as an unbounded window side.
fn cell_timestamp(row: &[String], column: usize) -> Option<DateTime<Utc>> {
    let raw = cell(row, column)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let trimmed = raw.strip_suffix('Z').unwrap_or(raw);
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
}

/// Extract typed rows from raw cells under the given bindings.
///
/// The first line is skipped when its longitude cell is non-numeric (a
/// header row). Later rows with unparseable coordinates are dropped --
/// data validation is the export pipeline's job, not the driver's.
fn extract_rows(cells: &[Vec<String>], settings: &LayerSettings) -> Vec<DataRow> {
    let mut rows = Vec::with_capacity(cells.len());
    for (index, line) in cells.iter().enumerate() {
        let coords = cell_f64(line, settings.lng_column)
            .zip(cell_f64(line, settings.lat_column))
            .zip(cell_f64(line, settings.alt_column));
        let Some(((lng, lat), alt)) = coords else {
            if index > 0 {
                trace!(line = index, "dropping row with non-numeric coordinates");
            }
            continue;
        };
        rows.push(DataRow {
            lng,
            lat,
            alt,
            phase: settings
                .phase_column
                .and_then(|column| cell_phase(line, column)),
            valid_from: settings
                .start_date_column
                .and_then(|column| cell_timestamp(line, column)),
            valid_until: settings
                .end_date_column
                .and_then(|column| cell_timestamp(line, column)),
        });
    }
    rows
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The camera target last applied to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Right ascension of the view center, in hours.
    pub ra_hours: f64,
    /// Declination of the view center, in degrees.
    pub dec_degrees: f64,
    /// Zoom level.
    pub zoom: f64,
    /// Whether the move was instant.
    pub instant: bool,
}

/// The in-process engine session the production driver runs against.
#[derive(Debug)]
pub struct HeadlessSession {
    /// The simulation clock.
    clock: RateClock,
    /// Registered tabular layers.
    layers: BTreeMap<LayerId, TableLayer>,
    /// Registered annotations.
    annotations: BTreeMap<AnnotationId, PolylineAnnotation>,
    /// Last applied camera target.
    camera: Option<CameraPose>,
    /// Last applied scene toggles.
    scene: Option<SceneSettings>,
    /// Selected imagery: (background, foreground).
    imagery: Option<(String, String)>,
}

impl HeadlessSession {
    /// Create a session with the clock at `start`, advancing at `rate`
    /// simulated seconds per wall second.
    pub fn new(start: DateTime<Utc>, rate: f64) -> Self {
        Self {
            clock: RateClock::new(start, rate),
            layers: BTreeMap::new(),
            annotations: BTreeMap::new(),
            camera: None,
            scene: None,
            imagery: None,
        }
    }

    /// Number of layers currently registered.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// The camera target last applied, if any.
    pub const fn camera(&self) -> Option<CameraPose> {
        self.camera
    }

    /// The scene toggles last applied, if any.
    pub const fn scene(&self) -> Option<SceneSettings> {
        self.scene
    }

    /// The annotation currently registered under `id`, if any.
    pub fn annotation(&self, id: AnnotationId) -> Option<&PolylineAnnotation> {
        self.annotations.get(&id)
    }

    fn layer(&self, id: LayerId) -> Result<&TableLayer, EngineError> {
        self.layers.get(&id).ok_or(EngineError::LayerNotFound(id))
    }
}

impl SpaceTimeClock for HeadlessSession {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn set_now(&mut self, now: DateTime<Utc>) {
        self.clock.set_now(now);
    }

    fn set_time_rate(&mut self, seconds_per_second: f64) {
        self.clock.set_rate(seconds_per_second);
    }
}

impl LayerHost for HeadlessSession {
    fn create_table_layer(
        &mut self,
        frame: ReferenceFrame,
        name: &str,
        text: &str,
    ) -> Result<LayerId, EngineError> {
        let cells = parse_cells(text);
        if cells.is_empty() {
            return Err(EngineError::Table {
                message: format!("layer {name:?}: no rows in table text"),
            });
        }
        let id = LayerId::new();
        debug!(layer = %id, name, frame = frame.name(), lines = cells.len(), "layer created");
        self.layers.insert(
            id,
            TableLayer {
                name: name.to_owned(),
                frame,
                cells,
                settings: None,
                rows: Vec::new(),
            },
        );
        Ok(id)
    }

    fn configure_layer(
        &mut self,
        layer: LayerId,
        settings: &LayerSettings,
    ) -> Result<(), EngineError> {
        let entry = self
            .layers
            .get_mut(&layer)
            .ok_or(EngineError::LayerNotFound(layer))?;
        entry.rows = extract_rows(&entry.cells, settings);
        entry.settings = Some(settings.clone());
        debug!(
            layer = %layer,
            name = entry.name,
            frame = entry.frame.name(),
            rows = entry.rows.len(),
            time_series = settings.time_series,
            "layer configured"
        );
        Ok(())
    }

    fn layer_rows(&self, layer: LayerId) -> Result<Vec<DataRow>, EngineError> {
        let entry = self.layer(layer)?;
        if entry.settings.is_none() {
            return Err(EngineError::LayerNotConfigured(layer));
        }
        Ok(entry.rows.clone())
    }

    fn visible_row_count(&self, layer: LayerId, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let entry = self.layer(layer)?;
        if entry.settings.is_none() {
            return Err(EngineError::LayerNotConfigured(layer));
        }
        Ok(entry
            .rows
            .iter()
            .filter(|row| row.is_visible_at(now))
            .count())
    }
}

impl SkyProjector for HeadlessSession {
    fn geo_to_point3d(&self, lat_deg: f64, lng_deg: f64, distance: f64) -> Point3 {
        spherical_to_cartesian(lat_deg, lng_deg, distance)
    }
}

impl AnnotationHost for HeadlessSession {
    fn add_annotation(&mut self, annotation: &PolylineAnnotation) -> Result<(), EngineError> {
        self.annotations.insert(annotation.id, annotation.clone());
        Ok(())
    }

    fn remove_annotation(&mut self, annotation: AnnotationId) -> Result<(), EngineError> {
        self.annotations.remove(&annotation);
        Ok(())
    }
}

impl CameraHost for HeadlessSession {
    fn goto_ra_dec_zoom(&mut self, ra_hours: f64, dec_deg: f64, zoom: f64, instant: bool) {
        debug!(ra_hours, dec_deg, zoom, instant, "camera moved");
        self.camera = Some(CameraPose {
            ra_hours,
            dec_degrees: dec_deg,
            zoom,
            instant,
        });
    }

    fn set_imagery(&mut self, background: &str, foreground: &str) {
        debug!(background, foreground, "imagery selected");
        self.imagery = Some((background.to_owned(), foreground.to_owned()));
    }

    fn apply_scene_settings(&mut self, settings: &SceneSettings) {
        debug!(?settings, "scene settings applied");
        self.scene = Some(*settings);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use radwave_core::dataset::DatasetSpec;
    use radwave_types::{Color, DatasetKind};

    use super::*;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 10, 17, 11, 55, 55).unwrap()
    }

    fn best_fit_settings() -> LayerSettings {
        DatasetSpec::new(
            DatasetKind::BestFit,
            "best_fit.csv".to_owned(),
            Color::rgb(0x83, 0xbe, 0xfb),
            50.0,
        )
        .layer_settings()
    }

    fn dust_settings() -> LayerSettings {
        DatasetSpec::new(
            DatasetKind::Dust,
            "dust.csv".to_owned(),
            Color::rgb(0xec, 0x00, 0x18),
            25.0,
        )
        .layer_settings()
    }

    #[test]
    fn frozen_clock_holds_at_start() {
        let session = HeadlessSession::new(epoch(), 0.0);
        assert_eq!(session.now(), epoch());
        assert_eq!(session.now(), epoch());
    }

    #[test]
    fn set_now_rebases_the_clock() {
        let mut session = HeadlessSession::new(epoch(), 0.0);
        let later = epoch() + TimeDelta::days(100);
        session.set_now(later);
        assert_eq!(session.now(), later);
    }

    #[test]
    fn running_clock_never_goes_backward() {
        let mut session = HeadlessSession::new(epoch(), 10_368_000.0);
        session.set_time_rate(10_368_000.0);
        let first = session.now();
        let second = session.now();
        assert!(second >= first);
        assert!(first >= epoch());
    }

    #[test]
    fn comma_table_with_header_binds_columns() {
        let mut session = HeadlessSession::new(epoch(), 0.0);
        let text = "ra,dec,distance,phase,start,end\r\n\
                    10.5,20.25,310.0,5,2023-10-17 11:55:55Z,2023-10-18 11:55:55Z\r\n\
                    11.5,21.25,311.0,6,2023-10-18 11:55:55Z,2023-10-19 11:55:55Z\r\n";
        let layer = session
            .create_table_layer(ReferenceFrame::Sky, "Radcliffe Wave Best Fit", text)
            .unwrap();
        session.configure_layer(layer, &best_fit_settings()).unwrap();

        let rows = session.layer_rows(layer).unwrap();
        assert_eq!(rows.len(), 2);
        let first = rows.first().unwrap();
        assert!((first.lng - 10.5).abs() < f64::EPSILON);
        assert!((first.lat - 20.25).abs() < f64::EPSILON);
        assert_eq!(first.phase, Some(5));
        // Best-fit bindings do not include the date columns.
        assert_eq!(first.valid_from, None);
        assert_eq!(first.valid_until, None);
    }

    #[test]
    fn tab_delimited_table_parses() {
        let mut session = HeadlessSession::new(epoch(), 0.0);
        let text = "1.0\t2.0\t3.0\t7\n4.0\t5.0\t6.0\t8\n";
        let layer = session
            .create_table_layer(ReferenceFrame::Sky, "tabbed", text)
            .unwrap();
        session.configure_layer(layer, &best_fit_settings()).unwrap();
        let rows = session.layer_rows(layer).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.first().unwrap().phase, Some(7));
    }

    #[test]
    fn time_series_rows_carry_validity_windows() {
        let mut session = HeadlessSession::new(epoch(), 0.0);
        let text = "lng,lat,alt,phase,start_date,end_date\n\
                    10.0,20.0,300.0,0,2023-10-17 11:55:55Z,2023-10-27 11:55:55Z\n\
                    11.0,21.0,301.0,0,2023-11-17 11:55:55Z,2023-11-27 11:55:55Z\n";
        let layer = session
            .create_table_layer(ReferenceFrame::Sky, "Radcliffe Wave Dust", text)
            .unwrap();
        session.configure_layer(layer, &dust_settings()).unwrap();

        let rows = session.layer_rows(layer).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows.first().unwrap().valid_from,
            Some(Utc.with_ymd_and_hms(2023, 10, 17, 11, 55, 55).unwrap())
        );
        // Dust bindings carry no phase column.
        assert_eq!(rows.first().unwrap().phase, None);

        assert_eq!(session.visible_row_count(layer, epoch()).unwrap(), 1);
        assert_eq!(
            session
                .visible_row_count(layer, epoch() + TimeDelta::days(60))
                .unwrap(),
            0
        );
    }

    #[test]
    fn malformed_rows_are_dropped_not_fatal() {
        let mut session = HeadlessSession::new(epoch(), 0.0);
        let text = "1.0,2.0,3.0,1\nnot,numeric,at all,2\n4.0,5.0,6.0,3\n";
        let layer = session
            .create_table_layer(ReferenceFrame::Sky, "partial", text)
            .unwrap();
        session.configure_layer(layer, &best_fit_settings()).unwrap();
        assert_eq!(session.layer_rows(layer).unwrap().len(), 2);
    }

    #[test]
    fn empty_table_text_is_an_ingestion_error() {
        let mut session = HeadlessSession::new(epoch(), 0.0);
        let result = session.create_table_layer(ReferenceFrame::Sky, "empty", "\n\n");
        assert!(matches!(result, Err(EngineError::Table { .. })));
    }

    #[test]
    fn rows_require_configuration_first() {
        let mut session = HeadlessSession::new(epoch(), 0.0);
        let layer = session
            .create_table_layer(ReferenceFrame::Sky, "unbound", "1,2,3\n")
            .unwrap();
        assert!(matches!(
            session.layer_rows(layer),
            Err(EngineError::LayerNotConfigured(_))
        ));
    }

    #[test]
    fn timestamp_formats() {
        let row = vec!["2023-10-17T11:55:55Z".to_owned(), "2023-10-17".to_owned()];
        assert_eq!(
            cell_timestamp(&row, 0),
            Some(Utc.with_ymd_and_hms(2023, 10, 17, 11, 55, 55).unwrap())
        );
        assert_eq!(
            cell_timestamp(&row, 1),
            Some(Utc.with_ymd_and_hms(2023, 10, 17, 0, 0, 0).unwrap())
        );
        let bad = vec!["yesterday".to_owned()];
        assert_eq!(cell_timestamp(&bad, 0), None);
    }

    #[test]
    fn phase_cell_accepts_float_exports() {
        let row = vec!["5".to_owned(), "6.0".to_owned(), "-1".to_owned()];
        assert_eq!(cell_phase(&row, 0), Some(5));
        assert_eq!(cell_phase(&row, 1), Some(6));
        assert_eq!(cell_phase(&row, 2), None);
    }

    #[test]
    fn camera_and_scene_state_are_recorded() {
        let mut session = HeadlessSession::new(epoch(), 0.0);
        session.goto_ra_dec_zoom(22.368, 22.68, 2_189_465_275.0, true);
        session.set_imagery("Solar System", "Solar System");
        session.apply_scene_settings(&SceneSettings {
            solar_system_stars: false,
            actual_planet_scale: true,
            constellation_figures: false,
            crosshairs: false,
        });

        let pose = session.camera().unwrap();
        assert!((pose.ra_hours - 22.368).abs() < f64::EPSILON);
        assert!(pose.instant);
        assert!(session.scene().unwrap().actual_planet_scale);
    }
}
