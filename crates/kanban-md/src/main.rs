//! CLI entry point for kanban-md.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use kanban_md_app::ProjectConfig;
use kanban_md_core::{Priority, TaskHeaderStyle, Workload};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Kanban boards kept as plain Markdown files.
#[derive(Parser, Debug)]
#[command(
    name = "kanban-md",
    version,
    about = "kanban-md: kanban boards stored as Markdown outlines (*.kanban.md)"
)]
struct Cli {
    /// Path to the workspace or any subdir (defaults to current).
    #[arg(long)]
    repo: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new board file from the starter template.
    New {
        /// Board name; `.kanban.md` is appended.
        name: String,
        /// Directory to create the board in (defaults to the workspace root).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List board files under the workspace root.
    Ls,

    /// Print a board.
    Show {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: ShowFormat,
    },

    /// Rewrite a board in canonical form.
    Fmt {
        file: PathBuf,
        /// Header style (defaults to the configured one).
        #[arg(long, value_enum)]
        style: Option<HeaderStyle>,
        /// Only report whether the file would change.
        #[arg(long)]
        check: bool,
    },

    /// Column operations.
    Column {
        #[command(subcommand)]
        cmd: ColumnCommand,
    },

    /// Task operations.
    Task {
        #[command(subcommand)]
        cmd: TaskCommand,
    },

    /// Step (checklist) operations.
    Step {
        #[command(subcommand)]
        cmd: StepCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ColumnCommand {
    /// Append an empty column.
    Add { file: PathBuf, title: String },
    /// Move the column at `from` to position `to`.
    Move { file: PathBuf, from: usize, to: usize },
    /// Mark a column archived (or restore it with `--restore`).
    Archive {
        file: PathBuf,
        column: usize,
        #[arg(long)]
        restore: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Append a task to a column.
    Add {
        file: PathBuf,
        column: usize,
        title: String,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Move a task to another column.
    Move {
        file: PathBuf,
        column: usize,
        task: usize,
        to_column: usize,
        /// Position in the target column (defaults to the end).
        #[arg(long)]
        index: Option<usize>,
    },
    /// Move a task within its column.
    Reorder {
        file: PathBuf,
        column: usize,
        from: usize,
        to: usize,
    },
    /// Change task fields; unspecified fields are kept.
    Edit {
        file: PathBuf,
        column: usize,
        task: usize,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
        /// Remove a field.
        #[arg(long = "clear", value_enum)]
        clear: Vec<TaskField>,
        /// Replace the whole task with the given fields instead of patching it.
        #[arg(long, conflicts_with = "clear")]
        replace: bool,
    },
    /// Remove a task.
    Delete {
        file: PathBuf,
        column: usize,
        task: usize,
    },
}

#[derive(Subcommand, Debug)]
enum StepCommand {
    /// Tick a step (or untick it with `--undone`).
    Toggle {
        file: PathBuf,
        column: usize,
        task: usize,
        step: usize,
        #[arg(long)]
        undone: bool,
    },
    /// Rebuild the checklist from old positions; positions left out are dropped.
    Reorder {
        file: PathBuf,
        column: usize,
        task: usize,
        #[arg(required = true, value_delimiter = ',')]
        order: Vec<usize>,
    },
}

/// Optional task fields shared by `task add` and `task edit`.
#[derive(Args, Debug, Default)]
struct TaskFields {
    #[arg(long)]
    description: Option<String>,
    #[arg(short = 't', long = "tag")]
    tags: Vec<String>,
    /// low, medium or high.
    #[arg(long)]
    priority: Option<Priority>,
    /// Easy, Normal, Hard or Extreme.
    #[arg(long)]
    workload: Option<Workload>,
    #[arg(long)]
    due: Option<String>,
    #[arg(long)]
    expanded: Option<bool>,
    /// Checklist entry; repeat for more.
    #[arg(short = 's', long = "step")]
    steps: Vec<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum TaskField {
    Description,
    Tags,
    Priority,
    Workload,
    Due,
    Expanded,
    Steps,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ShowFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum HeaderStyle {
    Title,
    List,
}

impl From<HeaderStyle> for TaskHeaderStyle {
    fn from(style: HeaderStyle) -> Self {
        match style {
            HeaderStyle::Title => Self::Title,
            HeaderStyle::List => Self::List,
        }
    }
}

fn main() -> Result<()> {
    let Cli { repo, cmd } = Cli::parse();
    install_tracing();

    let repo_path = repo.unwrap_or_else(|| ".".to_owned());
    execute_command(&repo_path, cmd)
}

fn execute_command(repo_path: &str, command: Command) -> Result<()> {
    let root = kanban_md_app::workspace_root(repo_path);
    let config = ProjectConfig::from_workdir(&root)?;
    let workspace = commands::Workspace {
        root,
        board: config.board,
    };
    commands::run(command, &workspace)
}

fn install_tracing() {
    // RUST_LOG is honoured; defaults to INFO. Logs go to stderr so stdout stays parseable.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
