use std::path::PathBuf;

use async_trait::async_trait;

use super::ImageSource;
use crate::error::{PoetryError, PoetryResult};

/// Reads an image the user picked from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ImageSource for FileSource {
    async fn grab(&mut self) -> PoetryResult<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            PoetryError::io("reading image file", e).with_path(self.path.display().to_string())
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
