//! Unified error types for edgeip.
//!
//! Defines [`EdgeIpError`] (the main crate error enum),
//! [`ValidationError`] for config validation failures, and [`SinkError`]
//! for response sink capability failures. All use `thiserror` or a
//! hand-written `Display`. Error messages include contextual hints to
//! guide the user toward a fix.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}: {}", self.location, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EdgeIpError {
    #[error("No config file found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}' (expected yaml, yml, json or toml)")]
    UnsupportedFormat(String),

    #[error("Upstream '{url}' is not a usable URL: {source}")]
    InvalidUpstream {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Upstream request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Upstream timed out after {0}ms")]
    UpstreamTimeout(u64),

    #[error("{} already exists (pass --force to overwrite)", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Failures of optional [`ResponseSink`](crate::middleware::sink::ResponseSink)
/// capabilities.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("{sink} does not support connection takeover")]
    HijackUnsupported { sink: &'static str },

    #[error("connection has already been taken over")]
    AlreadyHijacked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_render_one_per_line() {
        let err = EdgeIpError::ConfigValidation {
            errors: vec![
                ValidationError {
                    location: "(root)".into(),
                    field: "upstream".into(),
                    message: "upstream cannot be empty".into(),
                    suggestion: None,
                },
                ValidationError {
                    location: "middlewares[0]".into(),
                    field: "name".into(),
                    message: "name cannot be empty".into(),
                    suggestion: Some("e.g. 'cloudflare'".into()),
                },
            ],
        };

        let rendered = err.to_string();
        assert!(rendered.contains("  (root): upstream: upstream cannot be empty\n"));
        assert!(rendered.ends_with("middlewares[0]: name: name cannot be empty (e.g. 'cloudflare')"));
    }

    #[test]
    fn invalid_upstream_names_the_url() {
        let source = url::Url::parse("::nope").unwrap_err();
        let err = EdgeIpError::InvalidUpstream {
            url: "::nope".into(),
            source,
        };
        assert!(err.to_string().starts_with("Upstream '::nope' is not a usable URL"));
    }

    #[test]
    fn hijack_unsupported_mentions_sink() {
        let err = SinkError::HijackUnsupported { sink: "my::Sink" };
        assert_eq!(err.to_string(), "my::Sink does not support connection takeover");
    }
}
