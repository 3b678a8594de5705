#![forbid(unsafe_code)]

//! Structured logging.
//!
//! All crates log through `tracing` with stable targets:
//!
//! | Target | Emitted by |
//! |--------|-----------|
//! | `taskdeck.dnd` | drag controller, collision resolver |
//! | `taskdeck.board` | membership index, board CRUD flows |
//! | `taskdeck.persist` | optimistic mutation coordinator, persistence calls |
//!
//! The macros are re-exported so downstream crates need no direct `tracing`
//! dependency for plain events. With the `tracing-subscriber` feature,
//! [`init`] installs a global subscriber built from a [`LogConfig`].

pub use tracing::{debug, debug_span, error, info, info_span, trace, warn};

/// Target used by the drag controller and collision resolver.
pub const TARGET_DND: &str = "taskdeck.dnd";
/// Target used by the membership index and board CRUD flows.
pub const TARGET_BOARD: &str = "taskdeck.board";
/// Target used by the mutation coordinator.
pub const TARGET_PERSIST: &str = "taskdeck.persist";

#[cfg(feature = "tracing-subscriber")]
pub use subscriber::{InitError, init, init_with_directive};

#[cfg(feature = "tracing-subscriber")]
mod subscriber {
    use crate::config::{LogConfig, LogFormat};
    use tracing_subscriber::EnvFilter;

    /// Failure to install the global subscriber.
    #[derive(Debug)]
    pub enum InitError {
        /// The filter directive did not parse.
        Filter(tracing_subscriber::filter::ParseError),
        /// A global subscriber was already installed.
        AlreadySet(String),
    }

    impl std::fmt::Display for InitError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Filter(e) => write!(f, "invalid log filter: {e}"),
                Self::AlreadySet(msg) => write!(f, "subscriber already installed: {msg}"),
            }
        }
    }

    impl std::error::Error for InitError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Self::Filter(e) => Some(e),
                Self::AlreadySet(_) => None,
            }
        }
    }

    /// Install a global subscriber according to `config`. `TASKDECK_LOG`
    /// takes precedence over the configured filter.
    pub fn init(config: &LogConfig) -> Result<(), InitError> {
        init_with_directive(&config.directive(), config.format)
    }

    /// Install a global subscriber with an explicit filter directive. The
    /// environment is not consulted.
    pub fn init_with_directive(directive: &str, format: LogFormat) -> Result<(), InitError> {
        let filter = EnvFilter::try_new(directive).map_err(InitError::Filter)?;
        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        let result = match format {
            LogFormat::Json => builder.json().with_current_span(true).try_init(),
            LogFormat::Pretty => builder.with_target(true).try_init(),
        };
        result.map_err(|e| InitError::AlreadySet(e.to_string()))
    }
}
