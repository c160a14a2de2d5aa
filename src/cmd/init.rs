//! `edgeip init`: write a starter config.
//!
//! The minimal template sets the upstream and one `rename_headers`
//! instance; `--full` also spells out every default.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::EdgeIpError;

pub fn execute(args: &InitArgs) -> Result<(), EdgeIpError> {
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| args.format.default_path());

    write_template(&path, template(args.format, args.full), args.force)?;
    println!(
        "Wrote {} ({} template). Start with: edgeip run -c {}",
        path.display(),
        if args.full { "full" } else { "minimal" },
        path.display()
    );
    Ok(())
}

/// Create `path` with `content`. An existing file is only replaced when
/// `force` is set.
fn write_template(path: &Path, content: &str, force: bool) -> Result<(), EdgeIpError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options.open(path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => EdgeIpError::FileExists {
            path: path.to_path_buf(),
        },
        _ => EdgeIpError::Io(e),
    })?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

#[must_use]
pub const fn template(format: ConfigFormat, full: bool) -> &'static str {
    match (format, full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    }
}

const YAML_MINIMAL: &str = r#"# edgeip config

upstream: "http://localhost:8080"

middlewares:
  - name: cloudflare
    plugin:
      rename_headers: {}
"#;

const YAML_FULL: &str = r#"# edgeip config
#
# All values shown are defaults. Modify as needed.

# Base URL every request is forwarded to. The request path and query are
# appended to its path.
upstream: "http://localhost:8080"

defaults:
  timeout: 5000              # Upstream timeout in ms
  proxy_headers: true        # Add X-Forwarded-*, X-Real-IP, Via headers
  strip_hop_by_hop: true     # Strip Connection, TE, etc.

# Middleware chain, applied in order (the first entry sees the request first).
middlewares:
  # Copies CF-Connecting-IP over X-Forwarded-For when the edge set it.
  # Takes no options.
  - name: cloudflare
    plugin:
      rename_headers: {}
"#;

const JSON_MINIMAL: &str = r#"{
  "upstream": "http://localhost:8080",
  "middlewares": [
    { "name": "cloudflare", "plugin": { "rename_headers": {} } }
  ]
}
"#;

const JSON_FULL: &str = r#"{
  "upstream": "http://localhost:8080",
  "defaults": {
    "timeout": 5000,
    "proxy_headers": true,
    "strip_hop_by_hop": true
  },
  "middlewares": [
    { "name": "cloudflare", "plugin": { "rename_headers": {} } }
  ]
}
"#;

const TOML_MINIMAL: &str = r#"# edgeip config

upstream = "http://localhost:8080"

[[middlewares]]
name = "cloudflare"

[middlewares.plugin.rename_headers]
"#;

const TOML_FULL: &str = r#"# edgeip config
#
# All values shown are defaults. Modify as needed.

# Base URL every request is forwarded to.
upstream = "http://localhost:8080"

[defaults]
timeout = 5000            # Upstream timeout in ms
proxy_headers = true      # Add X-Forwarded-*, X-Real-IP, Via headers
strip_hop_by_hop = true   # Strip Connection, TE, etc.

# Middleware chain, applied in order.
[[middlewares]]
name = "cloudflare"

# Copies CF-Connecting-IP over X-Forwarded-For. Takes no options.
[middlewares.plugin.rename_headers]
"#;
