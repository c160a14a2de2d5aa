//! Tracing subscriber setup.
//!
//! Events go to stdout, pretty printed on a terminal and as JSON lines
//! everywhere else. `--pretty` and `--json` override the guess.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn select(pretty: bool, json: bool) -> Self {
        Self::from_flags(pretty, json, std::io::stdout().is_terminal())
    }

    const fn from_flags(pretty: bool, json: bool, terminal: bool) -> Self {
        match (pretty, json) {
            (_, true) => Self::Json,
            (true, false) => Self::Pretty,
            (false, false) if terminal => Self::Pretty,
            (false, false) => Self::Json,
        }
    }
}

/// The pooled upstream client is chatty below `warn`; it never logs more
/// verbosely than that, and never more verbosely than `level`.
fn filter(level: Level) -> Targets {
    Targets::new()
        .with_default(level)
        .with_target("hyper_util", level.min(Level::WARN))
}

/// Install the global subscriber. Call once, before the first event.
pub fn init(level: Level, format: LogFormat) {
    let output: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => fmt::layer().json().with_target(false).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter(level)))
        .init();
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn explicit_flags_win_over_the_terminal_check() {
        assert_eq!(LogFormat::from_flags(false, true, true), LogFormat::Json);
        assert_eq!(LogFormat::from_flags(true, false, false), LogFormat::Pretty);
    }

    #[test]
    fn terminal_decides_without_flags() {
        assert_eq!(LogFormat::from_flags(false, false, true), LogFormat::Pretty);
        assert_eq!(LogFormat::from_flags(false, false, false), LogFormat::Json);
    }

    #[test]
    fn client_logs_are_capped_at_warn() {
        let targets = filter(Level::DEBUG);
        assert!(targets.would_enable("hyper_util::client", &Level::WARN));
        assert!(!targets.would_enable("hyper_util::client", &Level::INFO));
        assert!(targets.would_enable("edgeip::proxy", &Level::DEBUG));
    }

    #[test]
    fn quieter_levels_apply_to_the_client_too() {
        let targets = filter(Level::ERROR);
        assert!(!targets.would_enable("hyper_util::client", &Level::WARN));
        assert_eq!(targets.default_level(), Some(LevelFilter::ERROR));
    }
}
