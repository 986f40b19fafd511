//! Board model and Markdown codec for kanban-md.
//!
//! A board is a plain Markdown outline: `#` for the title, `##` for columns and
//! `###` (or `- `) for tasks. [`parse`] reads such a document into a [`Board`],
//! [`generate`] writes it back, and the methods on [`Board`] edit it in place.

/// Identifier types and generators.
pub mod id;
/// Board, column, task and step types.
pub mod model;
/// Board mutations.
pub mod ops;
/// Markdown to board.
pub mod parser;
/// Full and partial task edits.
pub mod patch;
/// Board to Markdown.
pub mod serializer;
/// Initial content for new board files.
pub mod template;

mod fingerprint;

pub use crate::id::{ColumnId, IdGenerator, SequentialIds, TaskId, UuidIds};
pub use crate::model::{
    Board, Column, ERROR_BOARD_TITLE, Priority, Step, Task, TaskHeaderStyle, UnknownKeyword,
    Workload,
};
pub use crate::ops::{BoardOp, DEFAULT_COLUMN_TITLE, DEFAULT_TASK_TITLE};
pub use crate::parser::{ParseError, parse, parse_with};
pub use crate::patch::{FieldPatch, TaskDraft, TaskPatch};
pub use crate::serializer::generate;
pub use crate::template::NEW_BOARD_TEMPLATE;
