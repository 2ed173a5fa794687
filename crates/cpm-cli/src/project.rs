//! # Project Directory
//!
//! The CLI keeps a project's state as plain files:
//!
//! ```text
//! <project-dir>/
//!   project.yaml        configuration (name, total value, milestone)
//!   .cpm/tasks.json     task records, in creation order
//!   .cpm/draws.json     the draw register
//! ```
//!
//! State files are replaced by writing a sibling temp file and renaming it
//! over the old one, so an interrupted command leaves the previous state.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use cpm_core::{DrawId, DrawNumber, TaskId};
use cpm_ledger::{DrawRegister, ProjectConfig};
use cpm_state::{Draw, Task};

pub const CONFIG_FILE: &str = "project.yaml";
pub const STATE_DIR: &str = ".cpm";
pub const TASKS_FILE: &str = "tasks.json";
pub const DRAWS_FILE: &str = "draws.json";

/// A project directory on disk.
#[derive(Debug, Clone)]
pub struct ProjectDir {
    root: PathBuf,
}

impl ProjectDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.state_dir().join(TASKS_FILE)
    }

    pub fn draws_path(&self) -> PathBuf {
        self.state_dir().join(DRAWS_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        self.config_path().is_file()
    }

    pub fn load_config(&self) -> Result<ProjectConfig> {
        if !self.is_initialized() {
            bail!(
                "no project in {} (run `cpm init` first)",
                self.root.display()
            );
        }
        ProjectConfig::load_pinned(&self.config_path())
            .context("failed to load project configuration")
    }

    pub fn save_config(&self, config: &ProjectConfig) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        config
            .save(&self.config_path())
            .context("failed to write project configuration")
    }

    /// Stored tasks, or none if nothing has been recorded yet.
    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        let path = self.tasks_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("corrupt task file {}", path.display()))
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string_pretty(tasks)?;
        self.write_state(&self.tasks_path(), &json)
    }

    /// The stored draw register, checked against the configured project.
    pub fn load_draws(&self, config: &ProjectConfig) -> Result<DrawRegister> {
        let path = self.draws_path();
        if !path.exists() {
            return Ok(DrawRegister::new(config.project_id));
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let stored: DrawRegister = serde_json::from_str(&text)
            .with_context(|| format!("corrupt draw file {}", path.display()))?;
        DrawRegister::from_draws(
            config.project_id,
            stored.list().to_vec(),
            Some(stored.next_number()),
        )
        .with_context(|| format!("draw file {} does not match this project", path.display()))
    }

    pub fn save_draws(&self, register: &DrawRegister) -> Result<()> {
        let json = serde_json::to_string_pretty(register)?;
        self.write_state(&self.draws_path(), &json)
    }

    fn write_state(&self, path: &Path, contents: &str) -> Result<()> {
        let dir = self.state_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        tracing::debug!(path = %path.display(), "state saved");
        Ok(())
    }
}

/// Find a task by full id (bare or `task:` prefixed) or a unique id prefix.
pub fn resolve_task(tasks: &[Task], needle: &str) -> Result<TaskId> {
    if let Ok(id) = needle.parse::<TaskId>() {
        return Ok(id);
    }
    let prefix = needle.trim().trim_start_matches("task:").to_ascii_lowercase();
    unique_match(
        tasks
            .iter()
            .filter(|t| !prefix.is_empty() && t.id.as_uuid().to_string().starts_with(&prefix))
            .map(|t| t.id),
        "task",
        needle,
    )
}

/// Find a draw by number (`3` or `#3`), full id, or a unique id prefix.
///
/// A bare number is tried as a draw number first, then as an id prefix.
pub fn resolve_draw(draws: &[Draw], needle: &str) -> Result<DrawId> {
    let trimmed = needle.trim();
    if let Some(number) = trimmed.strip_prefix('#') {
        let n: u32 = number
            .parse()
            .with_context(|| format!("invalid draw number {needle:?}"))?;
        return draw_numbered(draws, n).with_context(|| format!("no draw #{n}"));
    }
    if let Ok(n) = trimmed.parse::<u32>() {
        if let Some(id) = draw_numbered(draws, n) {
            return Ok(id);
        }
    }
    if let Ok(id) = trimmed.parse::<DrawId>() {
        return Ok(id);
    }
    let prefix = trimmed.trim_start_matches("draw:").to_ascii_lowercase();
    unique_match(
        draws
            .iter()
            .filter(|d| !prefix.is_empty() && d.id.as_uuid().to_string().starts_with(&prefix))
            .map(|d| d.id),
        "draw",
        needle,
    )
}

fn draw_numbered(draws: &[Draw], n: u32) -> Option<DrawId> {
    draws
        .iter()
        .find(|d| d.draw_number == DrawNumber(n))
        .map(|d| d.id)
}

fn unique_match<T>(mut matches: impl Iterator<Item = T>, kind: &str, needle: &str) -> Result<T> {
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => bail!("no {kind} matches {needle:?}"),
        (Some(_), Some(_)) => bail!("{needle:?} matches more than one {kind}; use more characters"),
    }
}

/// First eight characters of an id, for tables.
pub fn short_id(uuid: &impl ToString) -> String {
    uuid.to_string().chars().take(8).collect()
}
