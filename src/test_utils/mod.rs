//! Test utilities for snipkit
//!
//! Helpers shared by unit tests and the integration suite: logging set-up, sample
//! snippet definitions and temporary snippet directories.
//!
//! # Example
//!
//! ```rust,no_run
//! use snipkit::test_utils::{SnippetFixture, TestEnvironment};
//!
//! let env = TestEnvironment::new().unwrap();
//! env.add_snippet_file("rust.toml", &SnippetFixture::arrow().content).unwrap();
//! assert!(env.snippet_path("rust.toml").exists());
//! ```

pub mod environment;
pub mod fixtures;

pub use environment::TestEnvironment;
pub use fixtures::{SnippetFixture, arrow_definition, choice_definition, concat_lines};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. It uses `level` if given, else `RUST_LOG`; with
/// neither, tests run without logging.
///
/// ```bash
/// RUST_LOG=snipkit=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
