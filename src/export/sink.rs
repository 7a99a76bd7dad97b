//! Artifact delivery.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{Artifact, ExportError};

/// Where a finished artifact goes.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn deliver(&self, artifact: &Artifact) -> Result<(), ExportError>;
}

/// Writes artifacts into a directory under their own file name.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, artifact: &Artifact) -> PathBuf {
        self.dir.join(&artifact.file_name)
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn deliver(&self, artifact: &Artifact) -> Result<(), ExportError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(artifact);
        tokio::fs::write(&path, &artifact.bytes).await?;
        tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "Artifact written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;

    #[tokio::test]
    async fn test_directory_sink_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));
        let artifact = Artifact::new(ExportFormat::Zip, vec![1, 2, 3]);
        sink.deliver(&artifact).await.unwrap();

        let path = dir.path().join("out/tarjeta_identificacion_estudiante.png");
        let written = std::fs::read(path).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }
}
