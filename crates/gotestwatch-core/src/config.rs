use crate::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File looked up at the module root when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = "gotestwatch.toml";

/// Which notifier events count as a file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeFilter {
    /// Only "closed after writing" notifications. Linux inotify only.
    CloseWrite,
    /// Any create or content modification.
    Write,
}

impl Default for ChangeFilter {
    fn default() -> Self {
        if cfg!(target_os = "linux") {
            ChangeFilter::CloseWrite
        } else {
            ChangeFilter::Write
        }
    }
}

impl std::str::FromStr for ChangeFilter {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "close-write" => Ok(ChangeFilter::CloseWrite),
            "write" => Ok(ChangeFilter::Write),
            other => Err(WatchError::Config(format!(
                "unknown change filter '{}', expected 'close-write' or 'write'",
                other
            ))),
        }
    }
}

/// Watcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet window closing a batch of changes (default: 200ms)
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Notifier events treated as changes
    #[serde(default)]
    pub change_filter: ChangeFilter,

    /// Go toolchain binary (default: "go")
    #[serde(default = "default_go_binary")]
    pub go_binary: String,

    /// Extra flags for `go test`, placed before the package list
    #[serde(default)]
    pub test_args: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
            change_filter: ChangeFilter::default(),
            go_binary: default_go_binary(),
            test_args: Vec::new(),
        }
    }
}

impl WatchConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: WatchConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `gotestwatch.toml` from the module root, falling back to defaults
    /// when the file does not exist.
    pub fn load(module_root: &Path) -> Result<Self> {
        let path = module_root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!("Loading configuration from {:?}", path);
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(WatchError::Config(
                "debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.go_binary.trim().is_empty() {
            return Err(WatchError::Config("go_binary must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce() -> u64 {
    200
}
fn default_go_binary() -> String {
    "go".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = WatchConfig::default();
        assert_eq!(config.debounce_ms, 200);
        assert_eq!(config.go_binary, "go");
        assert!(config.test_args.is_empty());
        assert_eq!(config.quiet_window(), Duration::from_millis(200));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WatchConfig::from_toml_str(
            r#"
            debounce_ms = 50
            change_filter = "write"
            test_args = ["-count=1", "-race"]
            "#,
        )
        .unwrap();
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.change_filter, ChangeFilter::Write);
        assert_eq!(config.go_binary, "go");
        assert_eq!(config.test_args, vec!["-count=1", "-race"]);
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let err = WatchConfig::from_toml_str("debounce_ms = 0").unwrap_err();
        assert!(matches!(err, WatchError::Config(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = WatchConfig::from_toml_str("debounce = 10").unwrap_err();
        assert!(matches!(err, WatchError::ConfigParse(_)));
    }

    #[test]
    fn test_change_filter_from_str() {
        assert_eq!(
            "close-write".parse::<ChangeFilter>().unwrap(),
            ChangeFilter::CloseWrite
        );
        assert_eq!("write".parse::<ChangeFilter>().unwrap(), ChangeFilter::Write);
        assert!("modify".parse::<ChangeFilter>().is_err());
    }

    #[test]
    fn test_load_from_module_root() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(WatchConfig::load(tmp.path()).unwrap(), WatchConfig::default());

        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "go_binary = \"go1.22\"\n").unwrap();
        let config = WatchConfig::load(tmp.path()).unwrap();
        assert_eq!(config.go_binary, "go1.22");
        assert_eq!(config.debounce_ms, 200);
    }
}
