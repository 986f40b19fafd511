//! Board files on disk: discovery, naming and creation.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kanban_md_core::NEW_BOARD_TEMPLATE;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Rejected board name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardNameError {
    /// Nothing left after trimming and removing the extension.
    #[error("board name must not be empty")]
    Empty,
    /// The name would escape the target directory.
    #[error("board name '{0}' must not contain path separators")]
    PathSeparator(String),
}

/// Turn a user-supplied board name into a file name ending in `suffix`.
///
/// A trailing `.kanban.md` or `.md` is dropped before the suffix is added, so
/// `"sprint"`, `"sprint.md"` and `"sprint.kanban.md"` all name the same file.
///
/// # Errors
/// Returns [`BoardNameError`] for blank names and names containing `/` or `\`.
pub fn board_file_name(name: &str, suffix: &str) -> Result<String, BoardNameError> {
    let trimmed = name.trim();
    let stem = trimmed
        .strip_suffix(suffix)
        .or_else(|| trimmed.strip_suffix(".kanban.md"))
        .or_else(|| trimmed.strip_suffix(".md"))
        .unwrap_or(trimmed)
        .trim();

    if stem.is_empty() {
        return Err(BoardNameError::Empty);
    }
    if stem.contains(['/', '\\']) {
        return Err(BoardNameError::PathSeparator(stem.to_owned()));
    }
    Ok(format!("{stem}{suffix}"))
}

/// Create `dir/<name><suffix>` containing the new-board template.
///
/// # Errors
/// Fails on an invalid name, when the file already exists, or on I/O errors.
pub fn create_board(dir: impl AsRef<Path>, name: &str, suffix: &str) -> Result<PathBuf> {
    let file_name = board_file_name(name, suffix)?;
    let path = dir.as_ref().join(file_name);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(NEW_BOARD_TEMPLATE.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    debug!(path = %path.display(), "board created");
    Ok(path)
}

/// Every file under `root` whose name ends in `suffix`, sorted by file name.
///
/// VCS, dependency and build directories are not descended into.
///
/// # Errors
/// Returns an error when `root` or one of its subdirectories cannot be read.
pub fn find_boards(root: impl AsRef<Path>, suffix: &str) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut boards = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

    for entry in walker {
        let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(suffix) {
            boards.push(entry.into_path());
        }
    }

    boards.sort_by_cached_key(|path| {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        (name, path.clone())
    });
    Ok(boards)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SUFFIX: &str = ".kanban.md";

    #[test]
    fn file_names_drop_known_extensions() {
        for input in ["sprint", " sprint ", "sprint.md", "sprint.kanban.md"] {
            assert_eq!(board_file_name(input, SUFFIX), Ok("sprint.kanban.md".to_owned()));
        }
    }

    #[test]
    fn bad_names_are_rejected() {
        assert_eq!(board_file_name("   ", SUFFIX), Err(BoardNameError::Empty));
        assert_eq!(board_file_name(".kanban.md", SUFFIX), Err(BoardNameError::Empty));
        assert_eq!(
            board_file_name("../escape", SUFFIX),
            Err(BoardNameError::PathSeparator("../escape".into()))
        );
        assert!(board_file_name("a\\b", SUFFIX).is_err());
    }

    #[test]
    fn custom_suffix_is_applied() {
        assert_eq!(board_file_name("plan.board.md", ".board.md"), Ok("plan.board.md".to_owned()));
        assert_eq!(board_file_name("plan", ".board.md"), Ok("plan.board.md".to_owned()));
    }

    #[test]
    fn create_board_writes_template_once() -> Result<()> {
        let temp = TempDir::new()?;
        let path = create_board(temp.path(), "Roadmap", SUFFIX)?;
        assert_eq!(path, temp.path().join("Roadmap.kanban.md"));
        assert_eq!(fs::read_to_string(&path)?, NEW_BOARD_TEMPLATE);

        let Err(err) = create_board(temp.path(), "Roadmap.md", SUFFIX) else {
            panic!("second create must fail");
        };
        assert!(err.to_string().contains("failed to create"));
        Ok(())
    }

    #[test]
    fn find_boards_skips_vendor_dirs_and_sorts() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        for dir in ["docs", "node_modules/pkg", ".git", "target/debug"] {
            fs::create_dir_all(root.join(dir))?;
        }
        for file in [
            "zeta.kanban.md",
            "docs/Alpha.kanban.md",
            "docs/notes.md",
            "node_modules/pkg/hidden.kanban.md",
            ".git/stale.kanban.md",
            "target/debug/built.kanban.md",
        ] {
            fs::write(root.join(file), "# x\n")?;
        }

        let found = find_boards(root, SUFFIX)?;
        assert_eq!(
            found,
            vec![root.join("docs/Alpha.kanban.md"), root.join("zeta.kanban.md")]
        );
        Ok(())
    }
}
