//! Render a [`Board`] back into the Markdown outline dialect.

use std::fmt;

use crate::model::{Board, Task, TaskHeaderStyle};
use crate::parser::task_header;

const ARCHIVED_MARKER: &str = " [Archived]";

/// Generate the canonical document for `board`.
///
/// Optional fields that are absent produce no output, so this never fails.
#[must_use]
pub fn generate(board: &Board, style: TaskHeaderStyle) -> String {
    Document { board, style }.to_string()
}

struct Document<'a> {
    board: &'a Board,
    style: TaskHeaderStyle,
}

impl fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.board.title.is_empty() {
            write!(f, "# {}\n\n", self.board.title)?;
        }

        for column in &self.board.columns {
            let marker = if column.archived { ARCHIVED_MARKER } else { "" };
            write!(f, "## {}{marker}\n\n", column.title)?;

            for task in &column.tasks {
                write_header(f, task, self.style)?;
                write_properties(f, task)?;
                write_description(f, task)?;
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}

fn write_header(f: &mut fmt::Formatter<'_>, task: &Task, style: TaskHeaderStyle) -> fmt::Result {
    if style == TaskHeaderStyle::List {
        let bullet = format!("- {}", task.title);
        // Titles such as `due: friday` or `[x] done` read back differently as bullets.
        if task_header(&bullet, bullet.trim()).as_deref() == Some(task.title.as_str()) {
            return writeln!(f, "{bullet}");
        }
    }
    write!(f, "### {}\n\n", task.title)
}

fn write_properties(f: &mut fmt::Formatter<'_>, task: &Task) -> fmt::Result {
    if let Some(due) = task.due_date.as_deref().filter(|due| !due.is_empty()) {
        writeln!(f, "  - due: {due}")?;
    }
    if !task.tags.is_empty() {
        writeln!(f, "  - tags: [{}]", task.tags.join(", "))?;
    }
    if let Some(priority) = task.priority {
        writeln!(f, "  - priority: {priority}")?;
    }
    if let Some(workload) = task.workload {
        writeln!(f, "  - workload: {workload}")?;
    }
    if let Some(expanded) = task.default_expanded {
        writeln!(f, "  - defaultExpanded: {expanded}")?;
    }
    // An empty list is still written so `steps: Some(vec![])` survives a reload.
    if let Some(steps) = &task.steps {
        f.write_str("  - steps:\n")?;
        for step in steps {
            let mark = if step.completed { 'x' } else { ' ' };
            writeln!(f, "      - [{mark}] {}", step.text)?;
        }
    }
    Ok(())
}

fn write_description(f: &mut fmt::Formatter<'_>, task: &Task) -> fmt::Result {
    let Some(body) = task.description.as_deref().map(str::trim) else {
        return Ok(());
    };
    if body.is_empty() {
        return Ok(());
    }
    f.write_str("    ```md\n")?;
    for line in body.split('\n') {
        writeln!(f, "    {line}")?;
    }
    f.write_str("    ```\n")
}
