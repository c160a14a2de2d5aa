//! Config files: format detection, parsing, and discovery.
//!
//! The format is picked from the file extension; each one sits behind its
//! own cargo feature (`yaml`, `json`, `toml`). [`resolve`] finds the file to
//! load and [`FileSource`] loads it.

pub mod file_source;

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

pub use file_source::FileSource;

use crate::config::model::Config;
use crate::error::EdgeIpError;

/// Files looked up in the working directory when no path is given.
pub const CANDIDATES: [&str; 4] = ["edgeip.yaml", "edgeip.yml", "edgeip.json", "edgeip.toml"];

/// A config file format compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "json")]
    Json,
    #[cfg(feature = "toml")]
    Toml,
}

impl Format {
    pub fn from_extension(ext: &str) -> Result<Self, EdgeIpError> {
        match ext {
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Ok(Self::Yaml),
            #[cfg(feature = "json")]
            "json" => Ok(Self::Json),
            #[cfg(feature = "toml")]
            "toml" => Ok(Self::Toml),
            other => Err(EdgeIpError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn of(path: &Path) -> Result<Self, EdgeIpError> {
        Self::from_extension(path.extension().and_then(|e| e.to_str()).unwrap_or(""))
    }

    /// Deserialize `content`; `origin` names the input in parse errors.
    pub fn parse(self, content: &str, origin: &str) -> Result<Config, EdgeIpError> {
        let parsed: Result<Config, Box<dyn std::error::Error + Send + Sync>> = match self {
            #[cfg(feature = "yaml")]
            Self::Yaml => serde_yml::from_str(content).map_err(Into::into),
            #[cfg(feature = "json")]
            Self::Json => serde_json::from_str(content).map_err(Into::into),
            #[cfg(feature = "toml")]
            Self::Toml => toml::from_str(content).map_err(Into::into),
        };
        parsed.map_err(|source| EdgeIpError::ConfigParse {
            path: origin.to_string(),
            source,
        })
    }
}

/// Parse config text whose format is given by a file extension.
pub fn parse_config_str(ext: &str, content: &str, origin: &str) -> Result<Config, EdgeIpError> {
    Format::from_extension(ext)?.parse(content, origin)
}

/// Lowercase hex SHA-256 of the raw file, used as the config version.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Use `explicit` if given, otherwise the first [`CANDIDATES`] entry that
/// exists in the working directory.
pub async fn resolve(explicit: Option<&Path>) -> Result<FileSource, EdgeIpError> {
    if let Some(path) = explicit {
        return FileSource::new(path.to_path_buf());
    }

    for name in CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return FileSource::new(path);
        }
    }

    Err(EdgeIpError::NoConfigSource {
        hint: "Pass --config <file>, or run 'edgeip init' to write ./edgeip.yaml.".into(),
    })
}
