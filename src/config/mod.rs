//! Configuration loading and validation.
//!
//! Defines the [`ConfigVersion`] digest used to identify a loaded config.
//! Submodules provide the data model, validation logic, and the
//! file-based sources.

pub mod model;
pub mod sources;
pub mod validation;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Hash(String),
}

impl ConfigVersion {
    /// First eight characters of the digest, for display.
    #[must_use]
    pub fn short(&self) -> &str {
        match self {
            Self::Hash(h) => h.get(..8).unwrap_or(h),
        }
    }
}
