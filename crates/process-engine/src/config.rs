//! Modeler configuration
//!
//! Stored as JSON. Every field has a default, so a partial file (or no
//! file at all) yields a usable configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bottleneck::BottleneckPolicy;
use crate::error::{ProcessEngineError, Result};
use crate::undo::DEFAULT_MAX_SNAPSHOTS;
use crate::validation::RuleConfig;

/// File name used by `load_from_dir` / `save_to_dir`
pub const CONFIG_FILE_NAME: &str = "process-engine.json";

/// Full modeler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelerConfig {
    /// Rule severities, in execution order
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub bottleneck_policy: BottleneckPolicy,
    /// Re-run validation after every committed change
    #[serde(default = "default_auto_validate")]
    pub auto_validate: bool,
    /// Depth of the undo history
    #[serde(default = "default_max_undo")]
    pub max_undo_snapshots: usize,
}

fn default_auto_validate() -> bool {
    true
}

fn default_max_undo() -> usize {
    DEFAULT_MAX_SNAPSHOTS
}

impl Default for ModelerConfig {
    fn default() -> Self {
        Self {
            rules: RuleConfig::default(),
            bottleneck_policy: BottleneckPolicy::default(),
            auto_validate: default_auto_validate(),
            max_undo_snapshots: default_max_undo(),
        }
    }
}

impl ModelerConfig {
    /// Parse a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ProcessEngineError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults if it is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load `process-engine.json` from a directory
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(CONFIG_FILE_NAME))
    }

    /// Save configuration to a file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        log::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Save `process-engine.json` into a directory
    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        self.save(&dir.join(CONFIG_FILE_NAME))
    }

    fn check(&self) -> Result<()> {
        if self.max_undo_snapshots == 0 {
            return Err(ProcessEngineError::Config(
                "maxUndoSnapshots must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::rule_ids;
    use crate::validation::Severity;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ModelerConfig::from_json(r#"{"bottleneckPolicy": "above_average"}"#).unwrap();

        assert_eq!(config.bottleneck_policy, BottleneckPolicy::AboveAverage);
        assert!(config.auto_validate);
        assert_eq!(config.max_undo_snapshots, DEFAULT_MAX_SNAPSHOTS);
        assert_eq!(config.rules, RuleConfig::default());
    }

    #[test]
    fn test_rules_override() {
        let config = ModelerConfig::from_json(
            r#"{"rules": {"no-orphan-elements": "warning", "start-event-required": "off"}}"#,
        )
        .unwrap();

        assert_eq!(config.rules.len(), 2);
        assert_eq!(
            config.rules.severity_of(rule_ids::NO_ORPHAN_ELEMENTS),
            Some(Severity::Warning)
        );
        assert_eq!(config.rules.severity_of(rule_ids::END_EVENT_REQUIRED), None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ModelerConfig::from_json(r#"{"maxUndoSnapshots": 0}"#).is_err());
        assert!(ModelerConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelerConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config, ModelerConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("widget");

        let mut config = ModelerConfig::default();
        config.auto_validate = false;
        config.bottleneck_policy = BottleneckPolicy::AboveAverage;
        config.save_to_dir(&nested).unwrap();

        let loaded = ModelerConfig::load_from_dir(&nested).unwrap();
        assert_eq!(loaded, config);
    }
}
