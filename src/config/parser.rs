//! Generic TOML parsing with file path context.
//!
//! ```rust,no_run
//! use snipkit::config::parse_config;
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Deserialize)]
//! struct Extra {
//!     name: String,
//! }
//!
//! # fn example() -> anyhow::Result<()> {
//! let extra: Extra = parse_config(Path::new("extra.toml"))?;
//! println!("{}", extra.name);
//! # Ok(())
//! # }
//! ```
//!
//! Errors carry both the operation and the path:
//!
//! ```text
//! Failed to parse config file: /path/to/config.toml
//! Caused by:
//!     invalid type: integer `1`, expected a string
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Read and deserialize a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, serde::Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_parse_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sample.toml");
        std::fs::write(&path, "name = \"demo\"\ncount = 3\n").unwrap();

        let sample: Sample = parse_config(&path).unwrap();
        assert_eq!(sample.name, "demo");
        assert_eq!(sample.count, 3);
    }

    #[test]
    fn test_parse_config_reports_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("broken.toml");
        std::fs::write(&path, "name = [").unwrap();

        let err = parse_config::<Sample>(&path).unwrap_err();
        assert!(format!("{err}").contains("broken.toml"));
    }

    #[test]
    fn test_parse_config_missing_file() {
        let temp = tempdir().unwrap();
        let err = parse_config::<Sample>(&temp.path().join("missing.toml")).unwrap_err();
        assert!(format!("{err}").contains("Failed to read config file"));
    }
}
