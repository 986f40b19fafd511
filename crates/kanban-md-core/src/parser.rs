//! Line-oriented scanner that reads a Markdown outline into a [`Board`].
//!
//! The scanner makes a single forward pass over the document. A line that does
//! not fit the open task is not swallowed: the task is closed and the same line
//! is classified again, which lets headers interrupt a task without a blank line.

use regex::Regex;
use std::sync::LazyLock;

use crate::id::{ColumnId, IdGenerator, TaskId, UuidIds};
use crate::model::{normalize_description, Board, Column, Step, Task};

const FENCE: &str = "```";

#[allow(clippy::expect_used)]
static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+- (due|tags|priority|workload|steps|defaultExpanded):\s*(.*)$")
        .expect("property pattern is valid")
});

#[allow(clippy::expect_used)]
static PROPERTY_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*- (due|tags|priority|workload|steps|defaultExpanded):")
        .expect("property key pattern is valid")
});

#[allow(clippy::expect_used)]
static STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s{6,}- \[([ x])\]\s*(.*)$").expect("step pattern is valid")
});

#[allow(clippy::expect_used)]
static INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#([A-Za-z0-9_\-@$%✓]+)").expect("tag pattern is valid")
});

/// Failure raised when the scanner reaches a state it should never be in.
///
/// Every input text is accepted, so this only surfaces a defect in the
/// scanner itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The same line was scheduled for reprocessing twice in a row.
    ///
    /// A retry is only requested after the open task was closed, and a line
    /// seen without an open task always advances, so this cannot happen
    /// unless that invariant is broken.
    #[error("scanner stalled on line {line}: the line was reprocessed without progress")]
    Stalled {
        /// 1-based line number.
        line: usize,
    },
}

/// Parse `text` using fresh UUID identifiers.
///
/// # Errors
/// Returns [`ParseError`] only when the scanner detects an internal defect.
pub fn parse(text: &str) -> Result<Board, ParseError> {
    parse_with(text, &mut UuidIds)
}

/// Parse `text`, drawing column and task identifiers from `ids`.
///
/// # Errors
/// Returns [`ParseError`] only when the scanner detects an internal defect.
pub fn parse_with<G: IdGenerator>(text: &str, ids: &mut G) -> Result<Board, ParseError> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let mut scanner = Scanner::new(ids);
    let mut index = 0;
    let mut retried = None;
    while let Some(line) = lines.get(index) {
        match scanner.scan(line) {
            Flow::Next => index += 1,
            Flow::Again => {
                debug_assert_ne!(retried, Some(index), "line retried without an open task");
                if retried == Some(index) {
                    return Err(ParseError::Stalled { line: index + 1 });
                }
                retried = Some(index);
            }
        }
    }
    Ok(scanner.finish())
}

/// What the driver loop does after a line was classified.
enum Flow {
    Next,
    Again,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Header seen; tags, properties and steps may follow.
    Properties,
    /// A description fence was closed; another fence continues the body.
    Description,
    /// Inside a description fence; lines are content.
    Fenced,
}

struct OpenTask {
    task: Task,
    scope: Scope,
}

struct Scanner<'g, G> {
    ids: &'g mut G,
    board: Board,
    column: Option<Column>,
    open: Option<OpenTask>,
}

impl<'g, G: IdGenerator> Scanner<'g, G> {
    fn new(ids: &'g mut G) -> Self {
        Self {
            ids,
            board: Board::default(),
            column: None,
            open: None,
        }
    }

    fn scan(&mut self, line: &str) -> Flow {
        let trimmed = line.trim();

        if let Some(open) = self.open.as_mut() {
            if trimmed.starts_with(FENCE) {
                match open.scope {
                    Scope::Description => {
                        open.scope = Scope::Fenced;
                        return Flow::Next;
                    }
                    Scope::Fenced if trimmed == FENCE => {
                        open.scope = Scope::Description;
                        return Flow::Next;
                    }
                    _ => {}
                }
            }
            if open.scope == Scope::Fenced {
                append_description(&mut open.task, strip_indent(line));
                return Flow::Next;
            }
        }

        if self.board.title.is_empty() {
            if let Some(rest) = trimmed.strip_prefix("# ") {
                self.board.title = rest.trim().to_owned();
                self.finalize_task();
                return Flow::Next;
            }
        }

        if let Some(rest) = trimmed.strip_prefix("## ") {
            self.open_column(rest);
            return Flow::Next;
        }

        if let Some(title) = task_header(line, trimmed) {
            self.finalize_task();
            if self.column.is_some() {
                self.open = Some(OpenTask {
                    task: Task::new(TaskId::generate(&mut *self.ids), title),
                    scope: Scope::Properties,
                });
            }
            return Flow::Next;
        }

        if let Some(open) = self.open.as_mut() {
            if open.scope == Scope::Properties {
                let task = &mut open.task;
                if apply_inline_tags(trimmed, task)
                    || apply_property(line, task)
                    || apply_step(line, task)
                {
                    return Flow::Next;
                }
                if opens_fence(line, trimmed) {
                    open.scope = Scope::Fenced;
                    return Flow::Next;
                }
            }
        }

        if trimmed.is_empty() {
            return Flow::Next;
        }

        if self.open.is_some() {
            self.finalize_task();
            return Flow::Again;
        }
        Flow::Next
    }

    fn open_column(&mut self, header: &str) {
        self.finalize_task();
        if let Some(column) = self.column.take() {
            self.board.columns.push(column);
        }

        let mut title = header.trim();
        let mut archived = false;
        if let Some(rest) = title.strip_suffix("[Archived]") {
            title = rest.trim();
            archived = true;
        }

        let mut column = Column::new(ColumnId::generate(&mut *self.ids), title);
        column.archived = archived;
        self.column = Some(column);
    }

    fn finalize_task(&mut self) {
        let Some(OpenTask { mut task, .. }) = self.open.take() else {
            return;
        };
        task.description = task.description.as_deref().and_then(normalize_description);
        if let Some(column) = self.column.as_mut() {
            column.tasks.push(task);
        }
    }

    fn finish(mut self) -> Board {
        self.finalize_task();
        if let Some(column) = self.column.take() {
            self.board.columns.push(column);
        }
        self.board
    }
}

/// Title of a task header line, if `line` is one.
///
/// A header with nothing after the marker does not open a task.
pub(crate) fn task_header(line: &str, trimmed: &str) -> Option<String> {
    let title = if let Some(rest) = trimmed.strip_prefix("### ") {
        rest.trim()
    } else {
        // Only unindented bullets start tasks; indented ones are properties or steps.
        let rest = line.strip_prefix("- ")?;
        if PROPERTY_KEY.is_match(trimmed) {
            return None;
        }
        let rest = rest.trim();
        rest.strip_prefix("[ ] ")
            .or_else(|| rest.strip_prefix("[x] "))
            .map_or(rest, str::trim)
    };
    (!title.is_empty()).then(|| title.to_owned())
}

fn apply_inline_tags(trimmed: &str, task: &mut Task) -> bool {
    if !trimmed.starts_with('#') {
        return false;
    }
    let before = task.tags.len();
    task.tags.extend(
        INLINE_TAG
            .captures_iter(trimmed)
            .filter_map(|caps| caps.get(1))
            .map(|tag| tag.as_str().to_owned()),
    );
    task.tags.len() > before
}

fn apply_property(line: &str, task: &mut Task) -> bool {
    let Some(caps) = PROPERTY.captures(line) else {
        return false;
    };
    let key = caps.get(1).map_or("", |m| m.as_str());
    let value = caps.get(2).map_or("", |m| m.as_str()).trim();

    match key {
        "due" => {
            if !value.is_empty() {
                task.due_date = Some(value.to_owned());
            }
        }
        "tags" => task.tags.extend(bracketed_list(value)),
        "priority" => {
            if let Ok(priority) = value.parse() {
                task.priority = Some(priority);
            }
        }
        "workload" => {
            if let Ok(workload) = value.parse() {
                task.workload = Some(workload);
            }
        }
        "defaultExpanded" => task.default_expanded = Some(value.eq_ignore_ascii_case("true")),
        "steps" => task.steps = Some(Vec::new()),
        _ => {}
    }
    true
}

/// Items of a `[a, b, c]` list; anything outside the outermost brackets is ignored.
fn bracketed_list(value: &str) -> Vec<String> {
    let (Some(start), Some(end)) = (value.find('['), value.rfind(']')) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }
    value[start + 1..end]
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

fn apply_step(line: &str, task: &mut Task) -> bool {
    let Some(steps) = task.steps.as_mut() else {
        return false;
    };
    let Some(caps) = STEP.captures(line) else {
        return false;
    };
    let completed = caps.get(1).is_some_and(|m| m.as_str() == "x");
    let text = caps.get(2).map_or("", |m| m.as_str()).trim();
    steps.push(Step::new(text, completed));
    true
}

fn opens_fence(line: &str, trimmed: &str) -> bool {
    line.starts_with(char::is_whitespace) && trimmed.starts_with(FENCE)
}

fn append_description(task: &mut Task, line: &str) {
    match task.description.as_mut() {
        Some(body) => {
            body.push('\n');
            body.push_str(line);
        }
        None => task.description = Some(line.to_owned()),
    }
}

/// Drop at most four leading spaces or tabs, keeping deeper indentation.
fn strip_indent(line: &str) -> &str {
    let mut rest = line;
    for _ in 0..4 {
        match rest.strip_prefix(|c: char| c == ' ' || c == '\t') {
            Some(next) => rest = next,
            None => break,
        }
    }
    rest
}
