//! Startup dataset loading.
//!
//! The four dataset files are read concurrently; the frame loop never
//! starts until every read has resolved. A failed read is fatal -- there
//! is no retry, no partial animation (the driver is useless without its
//! data).

use std::path::PathBuf;

use radwave_core::config::DataConfig;
use radwave_types::DatasetKind;
use tracing::info;

use crate::error::DriverError;

/// Raw text of the four datasets, keyed by kind.
#[derive(Debug)]
pub struct DatasetTexts {
    /// Dust dataset text.
    pub dust: String,
    /// Cluster dataset text.
    pub cluster: String,
    /// Sun dataset text.
    pub sun: String,
    /// Best-fit dataset text.
    pub best_fit: String,
}

impl DatasetTexts {
    /// The loaded text for a dataset.
    pub fn text_for(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Dust => &self.dust,
            DatasetKind::Cluster => &self.cluster,
            DatasetKind::Sun => &self.sun,
            DatasetKind::BestFit => &self.best_fit,
        }
    }
}

/// Read all four dataset files concurrently.
///
/// # Errors
///
/// Returns [`DriverError::Data`] naming the first file that failed to
/// read. Any failure aborts startup.
pub async fn load_dataset_texts(data: &DataConfig) -> Result<DatasetTexts, DriverError> {
    let (dust, cluster, sun, best_fit) = futures::try_join!(
        read_dataset(data.path_for(DatasetKind::Dust)),
        read_dataset(data.path_for(DatasetKind::Cluster)),
        read_dataset(data.path_for(DatasetKind::Sun)),
        read_dataset(data.path_for(DatasetKind::BestFit)),
    )?;
    Ok(DatasetTexts {
        dust,
        cluster,
        sun,
        best_fit,
    })
}

/// Read one dataset file.
async fn read_dataset(path: PathBuf) -> Result<String, DriverError> {
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| DriverError::Data {
            path: path.display().to_string(),
            source,
        })?;
    info!(path = %path.display(), bytes = text.len(), "dataset loaded");
    Ok(text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_data_dir() -> PathBuf {
        std::env::temp_dir().join(format!("radwave-fetch-{}", uuid::Uuid::new_v4()))
    }

    fn config_for(dir: &std::path::Path) -> DataConfig {
        DataConfig {
            dir: dir.display().to_string(),
            dust_file: "dust.csv".to_owned(),
            cluster_file: "cluster.csv".to_owned(),
            sun_file: "sun.csv".to_owned(),
            best_fit_file: "best_fit.csv".to_owned(),
        }
    }

    #[tokio::test]
    async fn loads_all_four_files() {
        let dir = scratch_data_dir();
        std::fs::create_dir_all(&dir).unwrap();
        for (name, body) in [
            ("dust.csv", "1,2,3\n"),
            ("cluster.csv", "4,5,6\n"),
            ("sun.csv", "7,8,9\n"),
            ("best_fit.csv", "10,11,12,0\n"),
        ] {
            std::fs::write(dir.join(name), body).unwrap();
        }

        let texts = load_dataset_texts(&config_for(&dir)).await.unwrap();
        assert_eq!(texts.text_for(DatasetKind::Dust), "1,2,3\n");
        assert_eq!(texts.text_for(DatasetKind::BestFit), "10,11,12,0\n");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_fatal() {
        let dir = scratch_data_dir();
        std::fs::create_dir_all(&dir).unwrap();
        // Only three of the four files exist.
        for name in ["dust.csv", "cluster.csv", "sun.csv"] {
            std::fs::write(dir.join(name), "1,2,3\n").unwrap();
        }

        let result = load_dataset_texts(&config_for(&dir)).await;
        assert!(matches!(result, Err(DriverError::Data { .. })));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
