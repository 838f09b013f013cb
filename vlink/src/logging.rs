//! vlink-flavored presets for the [`tracing`] framework.

use tracing::metadata::LevelFilter;
use tracing_subscriber::{filter::filter_fn, prelude::*};

/// Builder of `vlink`-flavor tracing configuration.
#[derive(Debug, Clone)]
pub struct Builder {
    verbose: bool,
    color: bool,
}
impl Builder {
    /// Creates a new [`Builder`] instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether console output is verbose.
    pub fn verbose(&mut self, val: bool) -> &mut Self {
        self.verbose = val;
        self
    }

    /// Initializes the logger.
    pub fn init(&mut self) {
        let level_filter = if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };
        let verbose = self.verbose;

        let stdio_layer = tracing_subscriber::fmt::layer()
            .without_time()
            .with_ansi(self.color)
            .with_file(false)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter_fn(move |metadata| {
                verbose || metadata.target().starts_with("vlink")
            }))
            .with_filter(level_filter);

        tracing_subscriber::registry().with(stdio_layer).init();
    }
}
impl Default for Builder {
    fn default() -> Self {
        Self {
            verbose: false,
            color: true,
        }
    }
}
