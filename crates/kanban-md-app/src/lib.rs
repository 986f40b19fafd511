//! Application layer for kanban-md.
//!
//! Configuration, persistence of board documents through a FIFO save queue,
//! the board session tying them together, and board-file discovery. Shared by
//! the CLI and any other front end.

pub mod config;
pub mod save_queue;
pub mod session;
pub mod sink;
pub mod workspace;

// Re-exports for convenience
pub use config::{BoardConfig, ProjectConfig, TaskHeaderStyle, workspace_root};
pub use save_queue::{SaveQueue, SaveStats};
pub use session::{BoardSession, ReloadOutcome};
pub use sink::{DocumentSink, FileSink, SinkError};
pub use workspace::{BoardNameError, board_file_name, create_board, find_boards};
