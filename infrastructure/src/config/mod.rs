//! Configuration file loading for votemute
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `VOTEMUTE_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./votemute.toml` or `./.votemute.toml`
//! 4. Global: `$XDG_CONFIG_HOME/votemute/config.toml`
//! 5. Default values

mod file_config;
mod issue;
mod loader;

pub use file_config::{
    DEFAULT_RANDOM_API_URL, FileConfig, FileLoggingConfig, FileRouletteConfig, FileVoteConfig,
    RandomSourceKind,
};
pub use issue::{ConfigIssue, ConfigIssueCode, ConfigValidationError, Severity};
pub use loader::ConfigLoader;
