//! Configuration loading for `shipshape.toml`.
//!
//! The file lives at the project root and every section is optional; a
//! missing file yields the defaults. Provider options are an opaque string
//! map passed through to the owning provider untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecosystem::EcosystemKind;
use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "shipshape.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    #[serde(default = "default_true")]
    pub auto_push: bool,
    #[serde(default)]
    pub parallel_steps: bool,
    /// How deep detection recurses below the root; 0 checks the root only.
    #[serde(default)]
    pub detect_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    #[serde(default = "default_step_seconds")]
    pub step_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

fn default_step_seconds() -> u64 {
    300
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            auto_push: true,
            parallel_steps: false,
            detect_depth: 0,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { step_seconds: 300 }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            options: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load `shipshape.toml` from `root`, falling back to defaults when the
    /// file does not exist. A present-but-malformed file is an error; silent
    /// fallback would mask typos.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Configuration for one provider, defaulted when the section is absent.
    pub fn provider(&self, kind: EcosystemKind) -> ProviderConfig {
        self.providers
            .get(kind.config_key())
            .cloned()
            .unwrap_or_default()
    }

    pub fn provider_enabled(&self, kind: EcosystemKind) -> bool {
        self.provider(kind).enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::load(temp.path()).unwrap();

        assert!(config.workflow.auto_push);
        assert!(!config.workflow.parallel_steps);
        assert_eq!(config.timeouts.step_seconds, 300);
        assert!(config.provider_enabled(EcosystemKind::Rust));
    }

    #[test]
    fn parses_full_config() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            r#"
[workflow]
auto_push = false
parallel_steps = true
detect_depth = 2

[timeouts]
step_seconds = 120

[providers.rust]
enabled = false

[providers.python.options]
test_args = "-x"
"#,
        )
        .unwrap();

        let config = Config::load(temp.path()).unwrap();
        assert!(!config.workflow.auto_push);
        assert!(config.workflow.parallel_steps);
        assert_eq!(config.workflow.detect_depth, 2);
        assert_eq!(config.timeouts.step_seconds, 120);
        assert!(!config.provider_enabled(EcosystemKind::Rust));
        assert!(config.provider_enabled(EcosystemKind::Python));
        assert_eq!(
            config.provider(EcosystemKind::Python).options.get("test_args"),
            Some(&"-x".to_string())
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "[workflow\nbroken").unwrap();

        let err = Config::load(temp.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "[workflow]\nauto_posh = true\n").unwrap();

        assert!(Config::load(temp.path()).is_err());
    }
}
