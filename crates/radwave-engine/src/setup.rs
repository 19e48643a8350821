//! Layer setup: turning loaded dataset text into configured engine layers.
//!
//! Runs once at startup, strictly after every dataset read has resolved
//! and strictly before the frame loop starts. The three time-series
//! datasets become windowed layers; the best-fit dataset's rows are
//! pulled back out to drive the polyline annotation.

use radwave_core::dataset::DatasetSpec;
use radwave_core::engine::VisualizationEngine;
use radwave_types::{DataRow, DatasetKind, LayerId, ReferenceFrame};
use tracing::info;

use crate::error::DriverError;
use crate::fetch::DatasetTexts;

/// The layers produced by setup.
#[derive(Debug)]
pub struct LayerSetup {
    /// The dust, cluster, and sun layers, in setup order.
    pub time_series_layers: Vec<LayerId>,
    /// The best-fit layer.
    pub best_fit_layer: LayerId,
    /// Typed rows of the best-fit dataset, in file order.
    pub best_fit_rows: Vec<DataRow>,
}

/// Create and configure the four layers from loaded dataset text.
///
/// # Errors
///
/// Returns [`DriverError::Engine`] when ingestion or configuration
/// fails, and [`DriverError::Setup`] when the spec list lacks the
/// best-fit dataset.
pub fn setup_layers<E>(
    engine: &mut E,
    specs: &[DatasetSpec],
    texts: &DatasetTexts,
) -> Result<LayerSetup, DriverError>
where
    E: VisualizationEngine + ?Sized,
{
    let mut time_series_layers = Vec::new();
    let mut best_fit: Option<(LayerId, Vec<DataRow>)> = None;

    for spec in specs {
        let text = texts.text_for(spec.kind);
        let prepared = spec.prepare_text(text);
        let layer = engine.create_table_layer(ReferenceFrame::Sky, spec.kind.layer_name(), &prepared)?;
        engine.configure_layer(layer, &spec.layer_settings())?;

        if spec.kind == DatasetKind::BestFit {
            let rows = engine.layer_rows(layer)?;
            let bucketed = rows.iter().filter(|row| row.phase.is_some()).count();
            info!(
                layer = %layer,
                name = spec.kind.layer_name(),
                rows = rows.len(),
                bucketed,
                "best-fit layer ready"
            );
            best_fit = Some((layer, rows));
        } else {
            info!(layer = %layer, name = spec.kind.layer_name(), "time-series layer ready");
            time_series_layers.push(layer);
        }
    }

    let (best_fit_layer, best_fit_rows) = best_fit.ok_or_else(|| DriverError::Setup {
        message: "dataset specs did not include the best-fit dataset".to_owned(),
    })?;

    Ok(LayerSetup {
        time_series_layers,
        best_fit_layer,
        best_fit_rows,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use radwave_core::config::VisualizationConfig;
    use radwave_core::engine::LayerHost as _;

    use super::*;
    use crate::session::HeadlessSession;

    fn make_texts() -> DatasetTexts {
        DatasetTexts {
            dust: "10.0,20.0,300.0,0,2023-10-17 11:55:55Z,2023-10-27 11:55:55Z\n".to_owned(),
            cluster: "11.0,21.0,301.0,0,2023-10-17 11:55:55Z,2023-10-27 11:55:55Z\n".to_owned(),
            sun: "12.0,22.0,302.0,0,2023-10-17 11:55:55Z,2023-10-27 11:55:55Z\n".to_owned(),
            best_fit: "13.0,23.0,303.0,5\n14.0,24.0,304.0,6\n".to_owned(),
        }
    }

    #[test]
    fn sets_up_all_four_layers() {
        let config = VisualizationConfig::default();
        let specs = config.dataset_specs().unwrap();
        let mut session = HeadlessSession::new(
            Utc.with_ymd_and_hms(2023, 10, 17, 11, 55, 55).unwrap(),
            0.0,
        );

        let setup = setup_layers(&mut session, &specs, &make_texts()).unwrap();
        assert_eq!(setup.time_series_layers.len(), 3);
        assert_eq!(session.layer_count(), 4);
        assert_eq!(setup.best_fit_rows.len(), 2);
        assert_eq!(setup.best_fit_rows.first().unwrap().phase, Some(5));

        // The best-fit layer is readable back through the host.
        assert_eq!(session.layer_rows(setup.best_fit_layer).unwrap().len(), 2);
    }

    #[test]
    fn missing_best_fit_spec_is_a_setup_error() {
        let config = VisualizationConfig::default();
        let specs: Vec<_> = config
            .dataset_specs()
            .unwrap()
            .into_iter()
            .filter(|spec| spec.kind != DatasetKind::BestFit)
            .collect();
        let mut session = HeadlessSession::new(
            Utc.with_ymd_and_hms(2023, 10, 17, 11, 55, 55).unwrap(),
            0.0,
        );

        let result = setup_layers(&mut session, &specs, &make_texts());
        assert!(matches!(result, Err(DriverError::Setup { .. })));
    }
}
