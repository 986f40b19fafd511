use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::id::{ColumnId, TaskId};

/// Title used for the placeholder board shown when a document fails to load.
pub const ERROR_BOARD_TITLE: &str = "Error Loading Board";

/// Root value: a title plus ordered columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Board title; empty when the document has none.
    pub title: String,
    /// Columns in display and serialization order.
    pub columns: Vec<Column>,
}

impl Board {
    /// Placeholder installed when parsing fails.
    #[must_use]
    pub fn error_board() -> Self {
        Self {
            title: ERROR_BOARD_TITLE.to_owned(),
            columns: Vec::new(),
        }
    }
}

/// Named, ordered bucket of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Session-local identifier.
    pub id: ColumnId,
    /// Header text without the archive marker.
    pub title: String,
    /// Tasks in order.
    pub tasks: Vec<Task>,
    /// Whether the column carries the `[Archived]` marker.
    #[serde(default)]
    pub archived: bool,
}

impl Column {
    /// Create an empty, non-archived column.
    pub fn new(id: ColumnId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            tasks: Vec::new(),
            archived: false,
        }
    }
}

/// A unit of work with optional metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Session-local identifier.
    pub id: TaskId,
    /// Header text.
    pub title: String,
    /// Trimmed, non-empty description body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags in insertion order; duplicates allowed.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Optional workload estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<Workload>,
    /// Free-form due date, never validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Whether the card should start expanded, when stated explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_expanded: Option<bool>,
    /// Checklist; `Some(vec![])` is distinct from `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Step>>,
}

impl Task {
    /// Create a task with a title and no metadata.
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            tags: Vec::new(),
            priority: None,
            workload: None,
            due_date: None,
            default_expanded: None,
            steps: None,
        }
    }

    /// Store `text` as the description, trimmed; blank text clears it.
    pub fn set_description(&mut self, text: &str) {
        self.description = normalize_description(text);
    }
}

/// Trim a description body, mapping blank input to `None`.
#[must_use]
pub fn normalize_description(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Fold a title onto one line and trim it, mapping blank input to `None`.
///
/// Headers are single lines, so line breaks become spaces.
#[must_use]
pub fn normalize_title(text: &str) -> Option<String> {
    let folded = text
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!folded.is_empty()).then_some(folded)
}

/// Checkbox sub-item of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step label.
    pub text: String,
    /// Whether the box is ticked.
    pub completed: bool,
}

impl Step {
    /// Create a step.
    pub fn new(text: impl Into<String>, completed: bool) -> Self {
        Self {
            text: text.into(),
            completed,
        }
    }
}

/// Error returned when a keyword is not one of the accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct UnknownKeyword {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// `low`
    Low,
    /// `medium`
    Medium,
    /// `high`
    High,
}

impl Priority {
    /// Textual form used in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(UnknownKeyword {
                kind: "priority",
                value: other.to_owned(),
                expected: "low, medium, high",
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effort estimate of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Workload {
    /// `Easy`
    Easy,
    /// `Normal`
    Normal,
    /// `Hard`
    Hard,
    /// `Extreme`
    Extreme,
}

impl Workload {
    /// Textual form used in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
            Self::Extreme => "Extreme",
        }
    }
}

impl FromStr for Workload {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Self::Easy),
            "Normal" => Ok(Self::Normal),
            "Hard" => Ok(Self::Hard),
            "Extreme" => Ok(Self::Extreme),
            other => Err(UnknownKeyword {
                kind: "workload",
                value: other.to_owned(),
                expected: "Easy, Normal, Hard, Extreme",
            }),
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How task headers are written by the serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskHeaderStyle {
    /// `### Title` followed by a blank line.
    #[default]
    Title,
    /// `- Title` with no blank line.
    List,
}

impl TaskHeaderStyle {
    /// Configuration spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::List => "list",
        }
    }
}

impl FromStr for TaskHeaderStyle {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "title" => Ok(Self::Title),
            "list" => Ok(Self::List),
            other => Err(UnknownKeyword {
                kind: "task header style",
                value: other.to_owned(),
                expected: "title, list",
            }),
        }
    }
}

impl fmt::Display for TaskHeaderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
