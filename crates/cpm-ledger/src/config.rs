//! # Project Configuration
//!
//! The total project value and the milestone threshold are loaded once per
//! process and handed to every computation explicitly. Nothing in the ledger
//! reads them from ambient state.
//!
//! On disk the configuration is YAML (or JSON, by extension):
//!
//! ```yaml
//! name: Maple Street Duplex
//! total_project_value: "110,000.00"
//! milestone_threshold: "70"
//! ```
//!
//! `project_id` may be omitted. [`ProjectConfig::load_pinned`] then assigns
//! one and writes it back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use cpm_core::{Money, Percentage, ProjectId};

use crate::error::LedgerError;

/// Threshold used when a configuration does not name one.
pub const DEFAULT_MILESTONE_THRESHOLD: Percentage = Percentage::from_basis_points(7_000);

fn default_threshold() -> Percentage {
    DEFAULT_MILESTONE_THRESHOLD
}

/// Fixed parameters of a project's completion accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "ProjectId::new")]
    pub project_id: ProjectId,
    pub name: String,
    /// Denominator of the completed-work percentage.
    ///
    /// Zero (unset) is accepted and yields 0% completion.
    #[serde(default, with = "cpm_core::money::decimal")]
    pub total_project_value: Money,
    /// CWP required before any draw may be scheduled.
    #[serde(default = "default_threshold")]
    pub milestone_threshold: Percentage,
}

impl ProjectConfig {
    /// Build and validate a configuration.
    pub fn new(
        name: impl Into<String>,
        total_project_value: Money,
        milestone_threshold: Percentage,
    ) -> Result<Self, LedgerError> {
        let config = Self {
            project_id: ProjectId::new(),
            name: name.into(),
            total_project_value,
            milestone_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::InvalidConfig {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.total_project_value.is_negative() {
            return Err(LedgerError::InvalidConfig {
                field: "total_project_value",
                reason: format!("must not be negative, got {}", self.total_project_value),
            });
        }
        if self.milestone_threshold <= Percentage::ZERO {
            return Err(LedgerError::InvalidConfig {
                field: "milestone_threshold",
                reason: "must be greater than 0%".to_string(),
            });
        }
        Ok(())
    }

    /// Load from a `.json`, `.yaml` or `.yml` file and validate.
    ///
    /// A file without `project_id` gets a fresh id on every call; use
    /// [`ProjectConfig::load_pinned`] where records outlive the process.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        Self::read(path).map(|(config, _)| config)
    }

    /// Load like [`ProjectConfig::load`], and if the file has no
    /// `project_id`, write the assigned one back so later loads agree.
    pub fn load_pinned(path: &Path) -> Result<Self, LedgerError> {
        let (config, has_id) = Self::read(path)?;
        if !has_id {
            config.save(path)?;
            tracing::info!(
                path = %path.display(),
                project_id = %config.project_id,
                "assigned project id"
            );
        }
        Ok(config)
    }

    /// Parse and validate; the flag says whether the file named an id.
    fn read(path: &Path) -> Result<(Self, bool), LedgerError> {
        let text = std::fs::read_to_string(path).map_err(|source| LedgerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_err = |message: String| LedgerError::ConfigParse {
            path: path.to_path_buf(),
            message,
        };
        let (config, stored): (Self, StoredId) = if is_json(path) {
            (
                serde_json::from_str(&text).map_err(|e| parse_err(e.to_string()))?,
                serde_json::from_str(&text).map_err(|e| parse_err(e.to_string()))?,
            )
        } else {
            (
                serde_yaml::from_str(&text).map_err(|e| parse_err(e.to_string()))?,
                serde_yaml::from_str(&text).map_err(|e| parse_err(e.to_string()))?,
            )
        };
        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            project_id = %config.project_id,
            total = %config.total_project_value,
            threshold = %config.milestone_threshold,
            "loaded project configuration"
        );
        Ok((config, stored.project_id.is_some()))
    }

    /// Write to `path`, choosing the format by extension.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let text = if is_json(path) {
            serde_json::to_string_pretty(self).map_err(|e| LedgerError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::to_string(self).map_err(|e| LedgerError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };
        std::fs::write(path, text).map_err(|source| LedgerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Whether a configuration file names its project id.
#[derive(Deserialize)]
struct StoredId {
    #[serde(default)]
    project_id: Option<ProjectId>,
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_with_defaults() {
        let config: ProjectConfig = serde_yaml::from_str("name: Duplex\n").unwrap();
        assert_eq!(config.total_project_value, Money::ZERO);
        assert_eq!(config.milestone_threshold, DEFAULT_MILESTONE_THRESHOLD);
        config.validate().unwrap();
    }

    #[test]
    fn yaml_full() {
        let yaml = "name: Maple Street\ntotal_project_value: \"110,000.00\"\nmilestone_threshold: 62.5\n";
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.total_project_value.cents(), 11_000_000);
        assert_eq!(config.milestone_threshold.basis_points(), 6_250);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let bad_total = ProjectConfig::new("x", Money::from_cents(-1), DEFAULT_MILESTONE_THRESHOLD);
        assert!(matches!(
            bad_total,
            Err(LedgerError::InvalidConfig { field: "total_project_value", .. })
        ));
        let bad_threshold = ProjectConfig::new("x", Money::ZERO, Percentage::ZERO);
        assert!(matches!(
            bad_threshold,
            Err(LedgerError::InvalidConfig { field: "milestone_threshold", .. })
        ));
        let bad_name = ProjectConfig::new(" ", Money::ZERO, DEFAULT_MILESTONE_THRESHOLD);
        assert!(matches!(bad_name, Err(LedgerError::InvalidConfig { field: "name", .. })));
    }

    #[test]
    fn save_and_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yaml");
        let config = ProjectConfig::new(
            "Maple Street",
            Money::from_cents(11_000_000),
            Percentage::from_basis_points(7_000),
        )
        .unwrap();
        config.save(&path).unwrap();
        assert_eq!(ProjectConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        let config =
            ProjectConfig::new("Annex", Money::from_cents(500), DEFAULT_MILESTONE_THRESHOLD).unwrap();
        config.save(&path).unwrap();
        assert_eq!(ProjectConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, LedgerError::ConfigIo { .. }));
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yaml");
        std::fs::write(&path, "name: [unterminated").unwrap();
        assert!(matches!(
            ProjectConfig::load(&path),
            Err(LedgerError::ConfigParse { .. })
        ));
    }

    const DOCUMENTED: &str = "name: Maple Street Duplex\n\
                              total_project_value: \"110,000.00\"\n\
                              milestone_threshold: \"70\"\n";

    #[test]
    fn load_pinned_keeps_an_assigned_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yaml");
        std::fs::write(&path, DOCUMENTED).unwrap();

        let first = ProjectConfig::load_pinned(&path).unwrap();
        let second = ProjectConfig::load_pinned(&path).unwrap();
        assert_eq!(first.project_id, second.project_id);
        assert_eq!(ProjectConfig::load(&path).unwrap(), first);
        assert!(std::fs::read_to_string(&path).unwrap().contains("project_id"));
    }

    #[test]
    fn load_pinned_leaves_files_with_an_id_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        let config =
            ProjectConfig::new("Annex", Money::from_cents(500), DEFAULT_MILESTONE_THRESHOLD).unwrap();
        config.save(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        assert_eq!(ProjectConfig::load_pinned(&path).unwrap(), config);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn yaml_accepts_unquoted_decimal_total() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yaml");
        std::fs::write(
            &path,
            "name: Maple Street\ntotal_project_value: 110000.50\nmilestone_threshold: 70\n",
        )
        .unwrap();
        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.total_project_value, Money::from_cents(11_000_050));
    }
}
