//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors: an unusable upstream URL, a zero timeout, and empty or
//! duplicate middleware names, and middlewares with no plugin selected.
//! Every problem is collected, each with an optional suggestion.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;

/// Validate the upstream base URL. Returns `Ok(())` or a human-readable error.
pub fn validate_upstream_url(url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err("upstream cannot be empty".into());
    }
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else if parsed.host_str().is_none() {
                Err(format!("'{url}' has no host"))
            } else if parsed.query().is_some() || parsed.fragment().is_some() {
                Err("upstream must not carry a query or fragment".into())
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(msg) = validate_upstream_url(&config.upstream) {
        let suggestion = (!config.upstream.is_empty() && !config.upstream.contains("://"))
            .then(|| format!("did you mean 'http://{}'?", config.upstream));
        errors.push(ValidationError {
            location: "(root)".into(),
            field: "upstream".into(),
            message: msg,
            suggestion,
        });
    }

    if config.defaults.timeout == 0 {
        errors.push(ValidationError {
            location: "(root)".into(),
            field: "defaults.timeout".into(),
            message: "timeout must be greater than 0".into(),
            suggestion: Some("the default is 5000".into()),
        });
    }

    let mut seen_names = std::collections::HashSet::new();

    for (i, middleware) in config.middlewares.iter().enumerate() {
        let location = format!("middlewares[{i}]");

        if middleware.name.trim().is_empty() {
            errors.push(ValidationError {
                location: location.clone(),
                field: "name".into(),
                message: "name cannot be empty".into(),
                suggestion: Some("e.g. 'cloudflare'".into()),
            });
        } else if !seen_names.insert(middleware.name.as_str()) {
            errors.push(ValidationError {
                location: location.clone(),
                field: "name".into(),
                message: format!("duplicate middleware name '{}'", middleware.name),
                suggestion: None,
            });
        }

        if middleware.plugin.kind().is_none() {
            errors.push(ValidationError {
                location,
                field: "plugin".into(),
                message: "no plugin selected".into(),
                suggestion: Some("e.g. 'rename_headers: {}'".into()),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// One-line description of a valid config, printed by `edgeip run --check`.
#[must_use]
pub fn summarize(config: &Config) -> String {
    let chain: Vec<String> = config
        .middlewares
        .iter()
        .map(|m| format!("{} ({})", m.name, m.plugin.kind().unwrap_or("none")))
        .collect();
    let chain = if chain.is_empty() {
        "no middlewares".to_string()
    } else {
        chain.join(" -> ")
    };
    format!(
        "{chain} -> {} (timeout {}ms)",
        config.upstream, config.defaults.timeout
    )
}
