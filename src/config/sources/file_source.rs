//! A config file on disk.

use std::io;
use std::path::{Path, PathBuf};

use super::{sha256_hex, Format};
use crate::config::model::Config;
use crate::config::validation::validate;
use crate::config::ConfigVersion;
use crate::error::EdgeIpError;

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: Format,
}

impl FileSource {
    /// Fails with [`EdgeIpError::UnsupportedFormat`] when the extension is
    /// not one of the formats compiled in. The file itself is not touched.
    pub fn new(path: PathBuf) -> Result<Self, EdgeIpError> {
        let format = Format::of(&path)?;
        Ok(Self { path, format })
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, parse, and validate the file. The version is the SHA-256 of
    /// the raw bytes, so reformatting the file changes it.
    pub async fn load(&self) -> Result<(Config, ConfigVersion), EdgeIpError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => EdgeIpError::ConfigFileNotFound {
                    path: self.path.clone(),
                },
                _ => EdgeIpError::Io(e),
            })?;

        let config = self
            .format
            .parse(&content, &self.path.display().to_string())?;
        validate(&config).map_err(|errors| EdgeIpError::ConfigValidation { errors })?;

        Ok((config, ConfigVersion::Hash(sha256_hex(content.as_bytes()))))
    }
}
