//! The best-fit polyline annotation and its per-frame recomputation.
//!
//! The best-fit dataset is not rendered as a time-series layer. Instead,
//! the driver owns one polyline annotation and rebuilds its point
//! sequence every frame from the rows whose phase bucket matches the
//! current phase, projecting each row through the engine and rotating it
//! into the ecliptic-corrected frame.

use radwave_types::{AnnotationId, Color, DataRow, Point3};
use tracing::trace;

use crate::engine::{AnnotationHost, EngineError, SkyProjector};

/// Default line width for the best-fit polyline.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// A renderable polyline annotation owned by the driver.
///
/// The point sequence is replaced wholesale every frame; identity (the
/// id, label, color, width) is stable for the lifetime of the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineAnnotation {
    /// Scene identifier, stable across replacements.
    pub id: AnnotationId,
    /// Human-readable label.
    pub label: String,
    /// Line color.
    pub color: Color,
    /// Line width in screen pixels.
    pub line_width: f64,
    /// Ordered 3-D points of the polyline. Empty when no row matches
    /// the current phase.
    pub points: Vec<Point3>,
}

impl PolylineAnnotation {
    /// Create an empty annotation with a fresh id.
    pub fn new(label: &str, color: Color) -> Self {
        Self {
            id: AnnotationId::new(),
            label: label.to_owned(),
            color,
            line_width: DEFAULT_LINE_WIDTH,
            points: Vec::new(),
        }
    }
}

/// Project the rows matching `phase` into scene points.
///
/// Selection is exact integer equality on the phase bucket -- rows
/// without a bucket never match. Row order is preserved, which is what
/// gives the polyline its shape.
pub fn project_phase_rows<P>(phase: u32, rows: &[DataRow], projector: &P) -> Vec<Point3>
where
    P: SkyProjector + ?Sized,
{
    rows.iter()
        .filter(|row| row.phase == Some(phase))
        .map(|row| {
            let point = projector.geo_to_point3d(row.lat, row.lng, row.alt);
            projector.rotate_to_ecliptic(point)
        })
        .collect()
}

/// Replace the annotation's points with the projection of the rows
/// matching `phase`, and swap the registration in the engine's scene.
///
/// The swap is remove-old-then-add-new; no partially-updated point
/// sequence is ever registered, though the scene may briefly hold
/// neither version between the two calls. Zero matching rows is not an
/// error: the annotation is re-registered with an empty point list.
///
/// Returns the number of points in the refreshed annotation.
pub fn refresh_annotation<E>(
    annotation: &mut PolylineAnnotation,
    phase: u32,
    rows: &[DataRow],
    engine: &mut E,
) -> Result<usize, EngineError>
where
    E: SkyProjector + AnnotationHost + ?Sized,
{
    let points = project_phase_rows(phase, rows, engine);
    engine.remove_annotation(annotation.id)?;
    annotation.points = points;
    engine.add_annotation(annotation)?;
    trace!(
        annotation = %annotation.id,
        phase,
        points = annotation.points.len(),
        "best-fit annotation refreshed"
    );
    Ok(annotation.points.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use radwave_types::DataRow;

    use super::*;
    use crate::engine::{StubEngine, spherical_to_cartesian};

    fn row(phase: u32, lng: f64, lat: f64, alt: f64) -> DataRow {
        DataRow {
            lng,
            lat,
            alt,
            phase: Some(phase),
            valid_from: None,
            valid_until: None,
        }
    }

    fn make_engine() -> StubEngine {
        StubEngine::new(Utc.with_ymd_and_hms(2023, 10, 17, 11, 55, 55).unwrap())
    }

    #[test]
    fn exact_phase_match_selects_single_row() {
        let engine = make_engine();
        let rows = vec![row(5, 10.0, 20.0, 300.0), row(6, 11.0, 21.0, 301.0)];
        let points = project_phase_rows(5, &rows, &engine);
        assert_eq!(points.len(), 1);

        let expected = engine.rotate_to_ecliptic(spherical_to_cartesian(20.0, 10.0, 300.0));
        let got = points.first().copied().unwrap();
        assert!((got.x - expected.x).abs() < 1e-12);
        assert!((got.y - expected.y).abs() < 1e-12);
        assert!((got.z - expected.z).abs() < 1e-12);
    }

    #[test]
    fn rows_without_bucket_never_match() {
        let engine = make_engine();
        let mut unbucketed = row(0, 1.0, 2.0, 3.0);
        unbucketed.phase = None;
        let points = project_phase_rows(0, &[unbucketed], &engine);
        assert!(points.is_empty());
    }

    #[test]
    fn row_order_is_preserved() {
        let engine = make_engine();
        let rows = vec![
            row(7, 0.0, 0.0, 1.0),
            row(7, 90.0, 0.0, 1.0),
            row(7, 180.0, 0.0, 1.0),
        ];
        let points = project_phase_rows(7, &rows, &engine);
        assert_eq!(points.len(), 3);
        // First row projects toward +x (before ecliptic rotation, which
        // leaves x untouched); last toward -x.
        assert!(points.first().unwrap().x > 0.9);
        assert!(points.last().unwrap().x < -0.9);
    }

    #[test]
    fn refresh_replaces_registration() {
        let mut engine = make_engine();
        let mut annotation =
            PolylineAnnotation::new("Radcliffe Wave Best Fit", Color::rgb(0x83, 0xbe, 0xfb));
        let rows = vec![row(5, 10.0, 20.0, 300.0), row(6, 11.0, 21.0, 301.0)];

        let count = refresh_annotation(&mut annotation, 5, &rows, &mut engine).unwrap();
        assert_eq!(count, 1);
        assert_eq!(engine.annotation_count(), 1);
        assert_eq!(engine.annotation(annotation.id).unwrap().points.len(), 1);

        // Next phase matches the other row; the registration is replaced,
        // not accumulated.
        let count = refresh_annotation(&mut annotation, 6, &rows, &mut engine).unwrap();
        assert_eq!(count, 1);
        assert_eq!(engine.annotation_count(), 1);
    }

    #[test]
    fn no_match_leaves_empty_annotation_registered() {
        let mut engine = make_engine();
        let mut annotation =
            PolylineAnnotation::new("Radcliffe Wave Best Fit", Color::rgb(0x83, 0xbe, 0xfb));
        let rows = vec![row(5, 10.0, 20.0, 300.0)];

        refresh_annotation(&mut annotation, 5, &rows, &mut engine).unwrap();
        assert_eq!(engine.annotation(annotation.id).unwrap().points.len(), 1);

        // Phase 9 matches nothing: the stale points must be gone from the
        // scene, replaced by an empty registration.
        let count = refresh_annotation(&mut annotation, 9, &rows, &mut engine).unwrap();
        assert_eq!(count, 0);
        assert_eq!(engine.annotation_count(), 1);
        assert!(engine.annotation(annotation.id).unwrap().points.is_empty());
    }

    #[test]
    fn first_refresh_tolerates_missing_registration() {
        let mut engine = make_engine();
        let mut annotation = PolylineAnnotation::new("fresh", Color::rgb(1, 2, 3));
        // Nothing registered yet; remove-then-add must still succeed.
        let count = refresh_annotation(&mut annotation, 0, &[], &mut engine).unwrap();
        assert_eq!(count, 0);
        assert_eq!(engine.annotation_count(), 1);
    }
}
