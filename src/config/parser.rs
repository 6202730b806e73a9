//! Reading configuration documents from disk.
//!
//! Failures carry the file path as context:
//!
//! ```text
//! Failed to parse config file: /path/to/context.toml
//! Caused by:
//!     unknown field `scpoe`, expected one of `name`, `type`, ...
//! ```

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::model::ContextConfig;

/// Parse a TOML file into any deserializable type.
///
/// # Errors
///
/// Fails when the file cannot be read ("Failed to read config file") or does
/// not deserialize into `T` ("Failed to parse config file").
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

/// Parse a context configuration file.
///
/// ```rust,no_run
/// use wirebox::config::parse_context_config;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = parse_context_config(Path::new("context.toml"))?;
/// println!("{} builder(s)", config.builder.len());
/// # Ok(())
/// # }
/// ```
pub fn parse_context_config(path: &Path) -> Result<ContextConfig> {
    parse_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_context_config() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("context.toml");
        std::fs::write(
            &config_path,
            r#"
            [[builder]]
            name = "printer"
            type = "demo.Printer"
            "#,
        )
        .unwrap();

        let config = parse_context_config(&config_path).unwrap();
        assert_eq!(config.builder[0].name, "printer");
        assert_eq!(config.builder[0].type_name, "demo.Printer");
    }

    #[test]
    fn test_parse_config_errors_name_the_file() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("invalid.toml");
        std::fs::write(&config_path, "invalid = toml {").unwrap();

        let error = parse_context_config(&config_path).unwrap_err();
        assert!(error.to_string().starts_with("Failed to parse config file"));

        let missing = temp.path().join("missing.toml");
        let error = parse_context_config(&missing).unwrap_err();
        assert!(error.to_string().starts_with("Failed to read config file"));
    }
}
