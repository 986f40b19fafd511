//! Project configuration read from `.kanban-md/config.toml`.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use git2::Repository;
pub use kanban_md_core::TaskHeaderStyle;
use serde::Deserialize;

const CONFIG_DIR: &str = ".kanban-md";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable that overrides `board.task_header`.
pub const ENV_TASK_HEADER: &str = "KANBAN_MD_TASK_HEADER";
/// Suffix that marks a Markdown file as a board.
pub const DEFAULT_FILE_SUFFIX: &str = ".kanban.md";
/// Time external reloads stay suppressed after the last successful write.
pub const DEFAULT_RELOAD_GRACE_MS: u64 = 100;

/// Top-level project configuration loaded from `.kanban-md/config.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Board document settings.
    #[serde(default)]
    pub board: BoardConfig,
}

impl ProjectConfig {
    /// Load configuration from the workspace root reachable from `cwd_or_repo`.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or validated.
    pub fn load(cwd_or_repo: impl AsRef<Path>) -> Result<Self> {
        Self::from_workdir(workspace_root(cwd_or_repo))
    }

    /// Load configuration from a known workspace root.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or validated.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let mut fetch = |key: &'static str| env::var(key).ok();
        Self::from_workdir_with_env(workdir, &mut fetch)
    }

    fn from_workdir_with_env(
        workdir: impl AsRef<Path>,
        fetch: &mut impl FnMut(&'static str) -> Option<String>,
    ) -> Result<Self> {
        let config_path = workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        if let Some(value) = fetch(ENV_TASK_HEADER).filter(|value| !value.trim().is_empty()) {
            config.board.task_header = value
                .parse()
                .with_context(|| format!("invalid {ENV_TASK_HEADER}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.board.ensure_valid_suffix()
    }
}

/// `[board]` block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BoardConfig {
    /// Header style used when documents are written.
    pub task_header: TaskHeaderStyle,
    /// Grace period in milliseconds, see [`BoardConfig::reload_grace`].
    pub reload_grace_ms: u64,
    /// File name suffix of board documents.
    pub file_suffix: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            task_header: TaskHeaderStyle::default(),
            reload_grace_ms: DEFAULT_RELOAD_GRACE_MS,
            file_suffix: DEFAULT_FILE_SUFFIX.to_owned(),
        }
    }
}

impl BoardConfig {
    /// How long external changes are ignored after the save queue drains.
    #[must_use]
    pub const fn reload_grace(&self) -> Duration {
        Duration::from_millis(self.reload_grace_ms)
    }

    fn ensure_valid_suffix(&self) -> Result<()> {
        if self.file_suffix.is_empty() {
            bail!("board.file_suffix must not be empty");
        }
        if !self.file_suffix.ends_with(".md") {
            bail!(
                "board.file_suffix '{}' must end with .md",
                self.file_suffix
            );
        }
        Ok(())
    }
}

/// Directory holding `.kanban-md/` and the board files.
///
/// Inside a Git repository this is the work tree root; elsewhere it is the
/// given directory itself.
pub fn workspace_root(cwd_or_repo: impl AsRef<Path>) -> PathBuf {
    let start = cwd_or_repo.as_ref();
    Repository::discover(start)
        .ok()
        .and_then(|repo| repo_workdir(&repo).ok())
        .unwrap_or_else(|| start.to_path_buf())
}

fn repo_workdir(repo: &Repository) -> Result<PathBuf> {
    if let Some(workdir) = repo.workdir() {
        return Ok(workdir.to_path_buf());
    }
    // Bare repositories have no work tree; use the directory containing the repository.
    repo.path()
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("failed to resolve repository root"))
}
