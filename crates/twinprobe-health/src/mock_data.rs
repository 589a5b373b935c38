//! Fixture-file presence probe for plugins serving mock data.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::probe::{BoxFuture, HealthProbe, ProbeResult};

pub const DATA_DIR: &str = "Data";
pub const METADATA_FILE: &str = "mock-metadata.json";
pub const SUBMODEL_DATA_FILE: &str = "mock-submodel-data.json";

/// Healthy iff both mock data files exist under `<content_root>/Data`.
pub struct MockDataProbe {
    content_root: PathBuf,
}

impl MockDataProbe {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    /// `<content_root>/Data`.
    pub fn data_dir(&self) -> PathBuf {
        self.content_root.join(DATA_DIR)
    }

    async fn evaluate(&self) -> ProbeResult {
        let dir = self.data_dir();
        let metadata = file_exists(&dir.join(METADATA_FILE)).await;
        let data = file_exists(&dir.join(SUBMODEL_DATA_FILE)).await;

        if metadata && data {
            ProbeResult::healthy_with("Mock data files are available.")
        } else {
            warn!(dir = %dir.display(), metadata, data, "mock data files missing");
            ProbeResult::unhealthy("Mock data files are missing.")
        }
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

impl HealthProbe for MockDataProbe {
    fn name(&self) -> &str {
        "mock-data"
    }

    fn check_health(&self, _cancel: CancellationToken) -> BoxFuture<'_, ProbeResult> {
        Box::pin(self.evaluate())
    }
}
