use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use kanban_md_app::{BoardConfig, BoardSession, FileSink, SaveQueue, create_board, find_boards};
use kanban_md_core::{
    Board, BoardOp, Column, FieldPatch, Step, Task, TaskDraft, TaskHeaderStyle, TaskPatch, generate,
    parse,
};

use crate::{ColumnCommand, Command, ShowFormat, StepCommand, TaskCommand, TaskField, TaskFields};

/// Resolved workspace root plus its board settings.
pub struct Workspace {
    pub root: PathBuf,
    pub board: BoardConfig,
}

pub fn run(command: Command, workspace: &Workspace) -> Result<()> {
    match command {
        Command::New { name, dir } => {
            let dir = dir.unwrap_or_else(|| workspace.root.clone());
            let path = create_board(&dir, &name, &workspace.board.file_suffix)?;
            println!("created board: {}", path.display());
        }
        Command::Ls => {
            let boards = find_boards(&workspace.root, &workspace.board.file_suffix)?;
            if boards.is_empty() {
                println!("No boards found");
                return Ok(());
            }
            for path in boards {
                let shown = path.strip_prefix(&workspace.root).unwrap_or(&path);
                println!("{}", shown.display());
            }
        }
        Command::Show { file, format } => {
            let board = read_board(&file)?;
            match format {
                ShowFormat::Text => print!("{}", render_board(&board)),
                ShowFormat::Json => println!("{}", serde_json::to_string_pretty(&board)?),
            }
        }
        Command::Fmt { file, style, check } => {
            let style = style.map_or(workspace.board.task_header, Into::into);
            format_file(&file, style, check)?;
        }
        Command::Column { cmd } => run_column(cmd, workspace)?,
        Command::Task { cmd } => run_task(cmd, workspace)?,
        Command::Step { cmd } => run_step(cmd, workspace)?,
    }

    Ok(())
}

fn run_column(command: ColumnCommand, workspace: &Workspace) -> Result<()> {
    match command {
        ColumnCommand::Add { file, title } => {
            mutate(workspace, &file, |_| Ok(BoardOp::AddColumn { title }))
        }
        ColumnCommand::Move { file, from, to } => mutate(workspace, &file, |board| {
            column_at(board, from)?;
            column_at(board, to)?;
            Ok(BoardOp::MoveColumn { from, to })
        }),
        ColumnCommand::Archive {
            file,
            column,
            restore,
        } => mutate(workspace, &file, |board| {
            Ok(BoardOp::ToggleColumnArchive {
                column: column_at(board, column)?.id.clone(),
                archived: !restore,
            })
        }),
    }
}

fn run_task(command: TaskCommand, workspace: &Workspace) -> Result<()> {
    match command {
        TaskCommand::Add {
            file,
            column,
            title,
            fields,
        } => mutate(workspace, &file, |board| {
            Ok(BoardOp::AddTask {
                column: column_at(board, column)?.id.clone(),
                draft: fields.into_draft(title),
            })
        }),
        TaskCommand::Move {
            file,
            column,
            task,
            to_column,
            index,
        } => mutate(workspace, &file, |board| {
            let (from, moved) = task_at(board, column, task)?;
            let to = column_at(board, to_column)?;
            Ok(BoardOp::MoveTask {
                task: moved.id.clone(),
                from: from.id.clone(),
                to: to.id.clone(),
                index: index.unwrap_or(usize::MAX),
            })
        }),
        TaskCommand::Reorder {
            file,
            column,
            from,
            to,
        } => mutate(workspace, &file, |board| {
            task_at(board, column, from)?;
            Ok(BoardOp::ReorderTask {
                column: column_at(board, column)?.id.clone(),
                from,
                to,
            })
        }),
        TaskCommand::Edit {
            file,
            column,
            task,
            title,
            fields,
            clear,
            replace,
        } => mutate(workspace, &file, |board| {
            let (owner, target) = task_at(board, column, task)?;
            if replace {
                let title = title.unwrap_or_else(|| target.title.clone());
                return Ok(BoardOp::EditTask {
                    task: target.id.clone(),
                    column: owner.id.clone(),
                    draft: fields.into_draft(title),
                });
            }
            let patch = fields.into_patch(title, &clear);
            if patch.is_empty() {
                bail!("nothing to change; pass at least one field or --clear");
            }
            Ok(BoardOp::UpdateTask {
                task: target.id.clone(),
                patch,
            })
        }),
        TaskCommand::Delete { file, column, task } => mutate(workspace, &file, |board| {
            let (owner, target) = task_at(board, column, task)?;
            Ok(BoardOp::DeleteTask {
                task: target.id.clone(),
                column: owner.id.clone(),
            })
        }),
    }
}

fn run_step(command: StepCommand, workspace: &Workspace) -> Result<()> {
    match command {
        StepCommand::Toggle {
            file,
            column,
            task,
            step,
            undone,
        } => mutate(workspace, &file, |board| {
            let (owner, target) = task_at(board, column, task)?;
            let count = target.steps.as_ref().map_or(0, Vec::len);
            if step >= count {
                bail!("no step at index {step} (task has {count})");
            }
            Ok(BoardOp::UpdateTaskStep {
                task: target.id.clone(),
                column: owner.id.clone(),
                step,
                completed: !undone,
            })
        }),
        StepCommand::Reorder {
            file,
            column,
            task,
            order,
        } => mutate(workspace, &file, |board| {
            let (owner, target) = task_at(board, column, task)?;
            Ok(BoardOp::ReorderTaskSteps {
                task: target.id.clone(),
                column: owner.id.clone(),
                order,
            })
        }),
    }
}

/// Load `file` into a session, apply the operation built by `build` and wait for the write.
fn mutate(
    workspace: &Workspace,
    file: &Path,
    build: impl FnOnce(&Board) -> Result<BoardOp>,
) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let runtime = tokio::runtime::Runtime::new()?;
    let name = runtime.block_on(apply_and_save(workspace, file, &text, build))?;
    println!("{name}: updated {}", file.display());
    Ok(())
}

async fn apply_and_save(
    workspace: &Workspace,
    file: &Path,
    text: &str,
    build: impl FnOnce(&Board) -> Result<BoardOp>,
) -> Result<&'static str> {
    let queue = SaveQueue::spawn(FileSink::new(file), workspace.board.reload_grace());
    let mut session = BoardSession::new(workspace.board.task_header, queue);
    session
        .load(text)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    let op = build(session.board())?;
    let name = op.name();
    if !session.apply(op) {
        bail!("{name}: target not found in {}", file.display());
    }

    let (_, stats) = session.shutdown().await;
    if stats.failed > 0 {
        bail!("failed to save {}", file.display());
    }
    Ok(name)
}

fn format_file(file: &Path, style: TaskHeaderStyle, check: bool) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let board = parse(&text).with_context(|| format!("failed to parse {}", file.display()))?;
    let formatted = generate(&board, style);

    if formatted == text {
        println!("{} is already formatted", file.display());
        return Ok(());
    }
    if check {
        bail!("{} is not formatted", file.display());
    }
    fs::write(file, formatted).with_context(|| format!("failed to write {}", file.display()))?;
    println!("formatted {}", file.display());
    Ok(())
}

fn read_board(file: &Path) -> Result<Board> {
    let text = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    parse(&text).with_context(|| format!("failed to parse {}", file.display()))
}

fn column_at(board: &Board, index: usize) -> Result<&Column> {
    board
        .columns
        .get(index)
        .ok_or_else(|| anyhow!("no column at index {index} (board has {})", board.columns.len()))
}

fn task_at(board: &Board, column: usize, task: usize) -> Result<(&Column, &Task)> {
    let owner = column_at(board, column)?;
    let target = owner.tasks.get(task).ok_or_else(|| {
        anyhow!(
            "no task at index {task} in column '{}' (column has {})",
            owner.title,
            owner.tasks.len()
        )
    })?;
    Ok((owner, target))
}

impl TaskFields {
    fn into_draft(self, title: String) -> TaskDraft {
        let steps = (!self.steps.is_empty())
            .then(|| self.steps.into_iter().map(|text| Step::new(text, false)).collect());
        TaskDraft {
            title,
            description: self.description,
            tags: self.tags,
            priority: self.priority,
            workload: self.workload,
            due_date: self.due,
            default_expanded: self.expanded,
            steps,
        }
    }

    fn into_patch(self, title: Option<String>, clear: &[TaskField]) -> TaskPatch {
        let cleared = |field: TaskField| clear.contains(&field);
        let steps = (!self.steps.is_empty())
            .then(|| self.steps.into_iter().map(|text| Step::new(text, false)).collect());

        TaskPatch {
            title,
            description: field_patch(self.description, cleared(TaskField::Description)),
            tags: if cleared(TaskField::Tags) {
                Some(Vec::new())
            } else {
                (!self.tags.is_empty()).then_some(self.tags)
            },
            priority: field_patch(self.priority, cleared(TaskField::Priority)),
            workload: field_patch(self.workload, cleared(TaskField::Workload)),
            due_date: field_patch(self.due, cleared(TaskField::Due)),
            default_expanded: field_patch(self.expanded, cleared(TaskField::Expanded)),
            steps: field_patch(steps, cleared(TaskField::Steps)),
        }
    }
}

fn field_patch<T>(value: Option<T>, clear: bool) -> Option<FieldPatch<T>> {
    if clear {
        return Some(FieldPatch::Clear);
    }
    value.map(FieldPatch::Set)
}

/// Human-readable summary of a board, with the indices the mutation commands expect.
fn render_board(board: &Board) -> String {
    let mut out = String::new();
    if !board.title.is_empty() {
        out.push_str(&format!("{}\n", board.title));
    }
    for (c, column) in board.columns.iter().enumerate() {
        let archived = if column.archived { " [archived]" } else { "" };
        out.push_str(&format!(
            "\n[{c}] {}{archived} ({} tasks)\n",
            column.title,
            column.tasks.len()
        ));
        for (t, task) in column.tasks.iter().enumerate() {
            out.push_str(&format!("  [{t}] {}{}\n", task.title, task_badges(task)));
        }
    }
    out
}

fn task_badges(task: &Task) -> String {
    let mut badges = Vec::new();
    if let Some(priority) = task.priority {
        badges.push(format!("!{priority}"));
    }
    if let Some(workload) = task.workload {
        badges.push(format!("~{workload}"));
    }
    if let Some(due) = &task.due_date {
        badges.push(format!("due {due}"));
    }
    badges.extend(task.tags.iter().map(|tag| format!("#{tag}")));
    if let Some(steps) = &task.steps {
        let done = steps.iter().filter(|step| step.completed).count();
        badges.push(format!("{done}/{} steps", steps.len()));
    }
    if badges.is_empty() {
        String::new()
    } else {
        format!("  {}", badges.join(" "))
    }
}
