//! # Structured Logging
//!
//! Subscriber setup for the binary and span macros used while migrating.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Create a tracing span for one schema's migration.
///
/// ```rust,ignore
/// let span = schema_span!(schema.name, schema.migrations_path);
/// ```
#[macro_export]
macro_rules! schema_span {
    ($schema:expr, $path:expr) => {
        tracing::info_span!(
            "schema_migration",
            schema = %$schema,
            migrations_path = %$path
        )
    };
    ($schema:expr, $path:expr, $($field:tt)*) => {
        tracing::info_span!(
            "schema_migration",
            schema = %$schema,
            migrations_path = %$path,
            $($field)*
        )
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Default to `debug` instead of `info` when `RUST_LOG` is unset
    pub verbose: bool,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the verbosity flag. A subscriber that is already
/// installed is left in place.
pub fn init_logging(options: LoggingOptions) {
    let default_level = if options.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = FmtSubscriber::builder().with_env_filter(filter).with_target(false);
    let installed = if options.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if installed.is_err() {
        // Subscriber already set elsewhere (e.g. integration tests); ignore.
    }
}
