//! # Service Configuration
//!
//! Read once at startup from the environment:
//!
//! | Variable             | Meaning                                   | Default |
//! |----------------------|-------------------------------------------|---------|
//! | `PORT`               | TCP port to bind                          | 8080    |
//! | `CPM_PROJECT_CONFIG` | Path to the project YAML/JSON file        | none    |
//!
//! Without a project file the service runs an unconfigured project whose
//! total value is zero, so every completion reads 0% until one is supplied.

use std::path::PathBuf;

use cpm_core::{Money, ProjectId};
use cpm_ledger::{LedgerError, ProjectConfig, DEFAULT_MILESTONE_THRESHOLD};

pub const DEFAULT_PORT: u16 = 8080;
pub const PORT_VAR: &str = "PORT";
pub const PROJECT_CONFIG_VAR: &str = "CPM_PROJECT_CONFIG";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub project: ProjectConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            project: unconfigured_project(),
        }
    }
}

impl AppConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, LedgerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LedgerError> {
        let port = match lookup(PORT_VAR) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "ignoring unparseable {PORT_VAR}, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let project = match lookup(PROJECT_CONFIG_VAR).filter(|p| !p.trim().is_empty()) {
            Some(path) => ProjectConfig::load(&PathBuf::from(path))?,
            None => {
                tracing::warn!(
                    "{PROJECT_CONFIG_VAR} not set; total project value is 0 and completion will read 0%"
                );
                unconfigured_project()
            }
        };

        tracing::info!(
            project = %project.name,
            total = %project.total_project_value,
            threshold = %project.milestone_threshold,
            "project configured"
        );
        Ok(Self { port, project })
    }
}

fn unconfigured_project() -> ProjectConfig {
    ProjectConfig {
        project_id: ProjectId::new(),
        name: "Unconfigured project".to_string(),
        total_project_value: Money::ZERO,
        milestone_threshold: DEFAULT_MILESTONE_THRESHOLD,
    }
}
