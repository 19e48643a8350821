//! Collaborator traits for the external visualization engine.
//!
//! The driver never talks to engine globals. Everything it needs from the
//! engine -- the simulation clock, tabular layer management, coordinate
//! projection, annotation registration, and camera control -- is expressed
//! as a trait here, and the whole bundle is passed to the driver as one
//! session value. [`StubEngine`] implements the bundle in memory so the
//! clock-phase cycle and annotation recomputation can be tested without a
//! live engine; the production adapter lives in the engine binary crate.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use radwave_types::{AnnotationId, DataRow, LayerId, Point3, ReferenceFrame};

use crate::annotation::PolylineAnnotation;
use crate::dataset::LayerSettings;

/// Mean obliquity of the ecliptic at J2000, in degrees.
pub const OBLIQUITY_OF_ECLIPTIC_DEG: f64 = 23.439_281;

/// Errors surfaced by an engine implementation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A layer handle did not resolve to a registered layer.
    #[error("layer not found: {0}")]
    LayerNotFound(LayerId),

    /// The layer exists but has not been configured with column bindings.
    #[error("layer {0} has no column bindings configured")]
    LayerNotConfigured(LayerId),

    /// Tabular text could not be ingested.
    #[error("table ingestion failed: {message}")]
    Table {
        /// Description of the ingestion failure.
        message: String,
    },
}

/// Accessors for the engine's simulation clock.
///
/// The engine advances the clock between frames at the configured rate;
/// the driver reads it every frame and occasionally snaps it back to the
/// window start.
pub trait SpaceTimeClock {
    /// Current simulated time.
    fn now(&self) -> DateTime<Utc>;

    /// Hard-set the simulated time.
    fn set_now(&mut self, now: DateTime<Utc>);

    /// Set the clock rate in simulated seconds per wall-clock second.
    fn set_time_rate(&mut self, seconds_per_second: f64);
}

/// Tabular layer management: ingestion, column binding, and row access.
pub trait LayerHost {
    /// Ingest raw delimited text as a new layer in `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Table`] when the text cannot be ingested.
    fn create_table_layer(
        &mut self,
        frame: ReferenceFrame,
        name: &str,
        text: &str,
    ) -> Result<LayerId, EngineError>;

    /// Apply column bindings and presentation settings to a layer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LayerNotFound`] for an unknown handle.
    fn configure_layer(&mut self, layer: LayerId, settings: &LayerSettings)
    -> Result<(), EngineError>;

    /// Typed rows of a configured layer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LayerNotFound`] for an unknown handle and
    /// [`EngineError::LayerNotConfigured`] before column binding.
    fn layer_rows(&self, layer: LayerId) -> Result<Vec<DataRow>, EngineError>;

    /// Number of rows of a time-series layer visible at `now`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`layer_rows`](Self::layer_rows).
    fn visible_row_count(&self, layer: LayerId, now: DateTime<Utc>) -> Result<usize, EngineError>;
}

/// Projection from geographic sky coordinates into scene space.
pub trait SkyProjector {
    /// Project latitude/longitude (degrees) at `distance` to a 3-D point.
    fn geo_to_point3d(&self, lat_deg: f64, lng_deg: f64, distance: f64) -> Point3;

    /// Rotate a projected point into the ecliptic-corrected frame.
    ///
    /// The default rotates about the x axis by the J2000 obliquity.
    fn rotate_to_ecliptic(&self, point: Point3) -> Point3 {
        rotate_about_x(point, OBLIQUITY_OF_ECLIPTIC_DEG)
    }
}

/// Scene registration for renderable annotations.
pub trait AnnotationHost {
    /// Register an annotation (or replace the registration with the same id).
    ///
    /// # Errors
    ///
    /// Implementations may reject annotations they cannot render.
    fn add_annotation(&mut self, annotation: &PolylineAnnotation) -> Result<(), EngineError>;

    /// Deregister an annotation. Removing an id that is not currently
    /// registered is a no-op, which makes the first-frame replace cycle
    /// well-defined.
    ///
    /// # Errors
    ///
    /// Implementations may surface scene-graph failures.
    fn remove_annotation(&mut self, annotation: AnnotationId) -> Result<(), EngineError>;
}

/// View configuration applied once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSettings {
    /// Whether background stars are drawn in solar-system mode.
    pub solar_system_stars: bool,
    /// Whether planets render at their true scale.
    pub actual_planet_scale: bool,
    /// Whether constellation figures are drawn.
    pub constellation_figures: bool,
    /// Whether the view crosshair is drawn.
    pub crosshairs: bool,
}

/// Camera and scene control.
pub trait CameraHost {
    /// Point the camera at the given RA (hours) / Dec (degrees) at `zoom`.
    fn goto_ra_dec_zoom(&mut self, ra_hours: f64, dec_deg: f64, zoom: f64, instant: bool);

    /// Select the background and foreground imagery sets by name.
    fn set_imagery(&mut self, background: &str, foreground: &str);

    /// Apply the startup view toggles.
    fn apply_scene_settings(&mut self, settings: &SceneSettings);
}

/// The full collaborator bundle the driver runs against.
///
/// Blanket-implemented for any type that provides all five seams, so an
/// engine adapter only implements the individual traits.
pub trait VisualizationEngine:
    SpaceTimeClock + LayerHost + SkyProjector + AnnotationHost + CameraHost
{
}

impl<T> VisualizationEngine for T where
    T: SpaceTimeClock + LayerHost + SkyProjector + AnnotationHost + CameraHost
{
}

/// Convert spherical sky coordinates to cartesian scene coordinates.
///
/// Standard spherical convention: x toward (lat 0, lng 0), z toward the
/// north pole.
pub fn spherical_to_cartesian(lat_deg: f64, lng_deg: f64, distance: f64) -> Point3 {
    let lat = lat_deg.to_radians();
    let lng = lng_deg.to_radians();
    Point3::new(
        distance * lat.cos() * lng.cos(),
        distance * lat.cos() * lng.sin(),
        distance * lat.sin(),
    )
}

/// Rotate a point about the x axis by `angle_deg`.
pub fn rotate_about_x(point: Point3, angle_deg: f64) -> Point3 {
    let angle = angle_deg.to_radians();
    let (sin, cos) = angle.sin_cos();
    Point3::new(
        point.x,
        point.y.mul_add(cos, -(point.z * sin)),
        point.y.mul_add(sin, point.z * cos),
    )
}

// ---------------------------------------------------------------------------
// Stub engine
// ---------------------------------------------------------------------------

/// A registered stub layer: identity plus injected rows.
#[derive(Debug, Clone, Default)]
struct StubLayer {
    /// Layer name as registered.
    name: String,
    /// Column bindings, once configured.
    settings: Option<LayerSettings>,
    /// Typed rows injected by tests.
    rows: Vec<DataRow>,
}

/// An in-memory engine double with a manually-advanced clock.
///
/// The stub does not ingest text -- tests inject typed rows directly with
/// [`set_rows`]. Projection is the real spherical conversion so annotation
/// tests exercise genuine coordinates.
///
/// [`set_rows`]: StubEngine::set_rows
#[derive(Debug)]
pub struct StubEngine {
    /// Simulated time, advanced only by [`advance`](Self::advance) or
    /// [`set_now`](SpaceTimeClock::set_now).
    now: DateTime<Utc>,
    /// Last configured time rate, recorded for assertions.
    time_rate: f64,
    /// Registered layers.
    layers: BTreeMap<LayerId, StubLayer>,
    /// Registered annotations.
    annotations: BTreeMap<AnnotationId, PolylineAnnotation>,
    /// Last camera target: (RA hours, Dec degrees, zoom, instant).
    camera: Option<(f64, f64, f64, bool)>,
    /// Last applied scene settings.
    scene: Option<SceneSettings>,
    /// Last selected imagery: (background, foreground).
    imagery: Option<(String, String)>,
}

impl StubEngine {
    /// Create a stub whose clock starts at `now`.
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            time_rate: 1.0,
            layers: BTreeMap::new(),
            annotations: BTreeMap::new(),
            camera: None,
            scene: None,
            imagery: None,
        }
    }

    /// Advance the simulated clock by `delta`.
    pub fn advance(&mut self, delta: TimeDelta) {
        self.now += delta;
    }

    /// Inject typed rows into a registered layer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LayerNotFound`] for an unknown handle.
    pub fn set_rows(&mut self, layer: LayerId, rows: Vec<DataRow>) -> Result<(), EngineError> {
        let entry = self
            .layers
            .get_mut(&layer)
            .ok_or(EngineError::LayerNotFound(layer))?;
        entry.rows = rows;
        Ok(())
    }

    /// The annotation currently registered under `id`, if any.
    pub fn annotation(&self, id: AnnotationId) -> Option<&PolylineAnnotation> {
        self.annotations.get(&id)
    }

    /// Number of annotations currently registered.
    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    /// Name a layer was registered under, if it exists.
    pub fn layer_name(&self, layer: LayerId) -> Option<&str> {
        self.layers.get(&layer).map(|l| l.name.as_str())
    }

    /// Last configured time rate.
    pub const fn time_rate(&self) -> f64 {
        self.time_rate
    }

    /// Last camera target, if the camera was pointed.
    pub const fn camera(&self) -> Option<(f64, f64, f64, bool)> {
        self.camera
    }

    /// Last applied scene settings.
    pub const fn scene(&self) -> Option<SceneSettings> {
        self.scene
    }

    /// Last selected imagery pair.
    pub fn imagery(&self) -> Option<(&str, &str)> {
        self.imagery
            .as_ref()
            .map(|(bg, fg)| (bg.as_str(), fg.as_str()))
    }
}

impl SpaceTimeClock for StubEngine {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }

    fn set_time_rate(&mut self, seconds_per_second: f64) {
        self.time_rate = seconds_per_second;
    }
}

impl LayerHost for StubEngine {
    fn create_table_layer(
        &mut self,
        _frame: ReferenceFrame,
        name: &str,
        _text: &str,
    ) -> Result<LayerId, EngineError> {
        let id = LayerId::new();
        self.layers.insert(
            id,
            StubLayer {
                name: name.to_owned(),
                ..StubLayer::default()
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
        entry.settings = Some(settings.clone());
        Ok(())
    }

    fn layer_rows(&self, layer: LayerId) -> Result<Vec<DataRow>, EngineError> {
        let entry = self
            .layers
            .get(&layer)
            .ok_or(EngineError::LayerNotFound(layer))?;
        if entry.settings.is_none() {
            return Err(EngineError::LayerNotConfigured(layer));
        }
        Ok(entry.rows.clone())
    }

    fn visible_row_count(&self, layer: LayerId, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let rows = self.layer_rows(layer)?;
        Ok(rows.iter().filter(|row| row.is_visible_at(now)).count())
    }
}

impl SkyProjector for StubEngine {
    fn geo_to_point3d(&self, lat_deg: f64, lng_deg: f64, distance: f64) -> Point3 {
        spherical_to_cartesian(lat_deg, lng_deg, distance)
    }
}

impl AnnotationHost for StubEngine {
    fn add_annotation(&mut self, annotation: &PolylineAnnotation) -> Result<(), EngineError> {
        self.annotations.insert(annotation.id, annotation.clone());
        Ok(())
    }

    fn remove_annotation(&mut self, annotation: AnnotationId) -> Result<(), EngineError> {
        self.annotations.remove(&annotation);
        Ok(())
    }
}

impl CameraHost for StubEngine {
    fn goto_ra_dec_zoom(&mut self, ra_hours: f64, dec_deg: f64, zoom: f64, instant: bool) {
        self.camera = Some((ra_hours, dec_deg, zoom, instant));
    }

    fn set_imagery(&mut self, background: &str, foreground: &str) {
        self.imagery = Some((background.to_owned(), foreground.to_owned()));
    }

    fn apply_scene_settings(&mut self, settings: &SceneSettings) {
        self.scene = Some(*settings);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use radwave_types::Color;

    use super::*;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 10, 17, 11, 55, 55).unwrap()
    }

    fn approx(a: Point3, b: Point3) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9 && (a.z - b.z).abs() < 1e-9
    }

    #[test]
    fn spherical_conversion_axes() {
        assert!(approx(
            spherical_to_cartesian(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0)
        ));
        assert!(approx(
            spherical_to_cartesian(0.0, 90.0, 1.0),
            Point3::new(0.0, 1.0, 0.0)
        ));
        assert!(approx(
            spherical_to_cartesian(90.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0)
        ));
    }

    #[test]
    fn spherical_conversion_preserves_distance() {
        let p = spherical_to_cartesian(22.68, 335.5, 300.0);
        assert!((p.magnitude() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_about_x_quarter_turn() {
        let p = rotate_about_x(Point3::new(0.0, 1.0, 0.0), 90.0);
        assert!(approx(p, Point3::new(0.0, 0.0, 1.0)));
        let p = rotate_about_x(Point3::new(0.0, 0.0, 1.0), 90.0);
        assert!(approx(p, Point3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn rotation_leaves_x_axis_fixed() {
        let p = rotate_about_x(Point3::new(2.5, 0.0, 0.0), OBLIQUITY_OF_ECLIPTIC_DEG);
        assert!(approx(p, Point3::new(2.5, 0.0, 0.0)));
    }

    #[test]
    fn stub_clock_set_and_advance() {
        let mut engine = StubEngine::new(epoch());
        assert_eq!(engine.now(), epoch());
        engine.advance(TimeDelta::days(3));
        assert_eq!(engine.now(), epoch() + TimeDelta::days(3));
        engine.set_now(epoch());
        assert_eq!(engine.now(), epoch());
        engine.set_time_rate(10_368_000.0);
        assert!((engine.time_rate() - 10_368_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stub_layer_lifecycle() {
        let mut engine = StubEngine::new(epoch());
        let id = engine
            .create_table_layer(ReferenceFrame::Sky, "Test Layer", "1,2,3")
            .unwrap();
        assert_eq!(engine.layer_name(id), Some("Test Layer"));

        // Rows are not readable before configuration.
        assert!(matches!(
            engine.layer_rows(id),
            Err(EngineError::LayerNotConfigured(_))
        ));

        let spec = crate::dataset::DatasetSpec::new(
            radwave_types::DatasetKind::Dust,
            "dust.csv".to_owned(),
            Color::rgb(0xec, 0x00, 0x18),
            25.0,
        );
        engine.configure_layer(id, &spec.layer_settings()).unwrap();

        let row = DataRow {
            lng: 1.0,
            lat: 2.0,
            alt: 3.0,
            phase: None,
            valid_from: Some(epoch()),
            valid_until: Some(epoch() + TimeDelta::days(1)),
        };
        engine.set_rows(id, vec![row]).unwrap();
        assert_eq!(engine.layer_rows(id).unwrap().len(), 1);
        assert_eq!(engine.visible_row_count(id, epoch()).unwrap(), 1);
        assert_eq!(
            engine
                .visible_row_count(id, epoch() + TimeDelta::days(2))
                .unwrap(),
            0
        );
    }

    #[test]
    fn unknown_layer_is_an_error() {
        let engine = StubEngine::new(epoch());
        assert!(matches!(
            engine.layer_rows(LayerId::new()),
            Err(EngineError::LayerNotFound(_))
        ));
    }
}
