//! In-place board mutations.
//!
//! Every operation returns whether it found its target. A miss (unknown id,
//! out-of-range index) leaves the board untouched; it is never an error.

use crate::id::{ColumnId, IdGenerator, TaskId};
use crate::model::{normalize_title, Board, Column, Task};
use crate::patch::{TaskDraft, TaskPatch};

/// Title given to tasks added without one.
pub const DEFAULT_TASK_TITLE: &str = "New Task";
/// Title given to columns added without one.
pub const DEFAULT_COLUMN_TITLE: &str = "New Column";

/// One board mutation, as requested by a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardOp {
    /// Move a task to `index` of another (or the same) column.
    MoveTask {
        /// Task to move.
        task: TaskId,
        /// Column currently holding the task.
        from: ColumnId,
        /// Destination column.
        to: ColumnId,
        /// Position in the destination, counted without the moved task.
        index: usize,
    },
    /// Move the task at `from` to `to` within one column.
    ReorderTask {
        /// Column to reorder.
        column: ColumnId,
        /// Current position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// Append a new task.
    AddTask {
        /// Destination column.
        column: ColumnId,
        /// Initial fields.
        draft: TaskDraft,
    },
    /// Replace every field of a task except its id.
    EditTask {
        /// Task to edit.
        task: TaskId,
        /// Column holding the task.
        column: ColumnId,
        /// New fields.
        draft: TaskDraft,
    },
    /// Partially update a task wherever it lives.
    UpdateTask {
        /// Task to update.
        task: TaskId,
        /// Fields to change.
        patch: TaskPatch,
    },
    /// Remove a task.
    DeleteTask {
        /// Task to remove.
        task: TaskId,
        /// Column holding the task.
        column: ColumnId,
    },
    /// Tick or untick one step.
    UpdateTaskStep {
        /// Task owning the step.
        task: TaskId,
        /// Column holding the task.
        column: ColumnId,
        /// Step position.
        step: usize,
        /// New state.
        completed: bool,
    },
    /// Rebuild the step list from a list of old positions.
    ReorderTaskSteps {
        /// Task owning the steps.
        task: TaskId,
        /// Column holding the task.
        column: ColumnId,
        /// Old positions in their new order; omitted positions are dropped.
        order: Vec<usize>,
    },
    /// Append an empty column.
    AddColumn {
        /// Column title.
        title: String,
    },
    /// Move a column to another position.
    MoveColumn {
        /// Current position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// Set or clear the archived flag.
    ToggleColumnArchive {
        /// Column to change.
        column: ColumnId,
        /// New flag value.
        archived: bool,
    },
}

impl BoardOp {
    /// Short name of the operation, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MoveTask { .. } => "moveTask",
            Self::ReorderTask { .. } => "reorderTask",
            Self::AddTask { .. } => "addTask",
            Self::EditTask { .. } => "editTask",
            Self::UpdateTask { .. } => "updateTask",
            Self::DeleteTask { .. } => "deleteTask",
            Self::UpdateTaskStep { .. } => "updateTaskStep",
            Self::ReorderTaskSteps { .. } => "reorderTaskSteps",
            Self::AddColumn { .. } => "addColumn",
            Self::MoveColumn { .. } => "moveColumn",
            Self::ToggleColumnArchive { .. } => "toggleColumnArchive",
        }
    }
}

impl Board {
    /// Apply `op`, drawing fresh ids from `ids` for insertions.
    ///
    /// Returns whether the operation found its target.
    pub fn apply(&mut self, op: BoardOp, ids: &mut impl IdGenerator) -> bool {
        match op {
            BoardOp::MoveTask {
                task,
                from,
                to,
                index,
            } => self.move_task(&task, &from, &to, index),
            BoardOp::ReorderTask { column, from, to } => self.reorder_task(&column, from, to),
            BoardOp::AddTask { column, draft } => self.add_task(&column, draft, ids).is_some(),
            BoardOp::EditTask {
                task,
                column,
                draft,
            } => self.edit_task(&task, &column, draft),
            BoardOp::UpdateTask { task, patch } => self.update_task(&task, patch),
            BoardOp::DeleteTask { task, column } => self.delete_task(&task, &column),
            BoardOp::UpdateTaskStep {
                task,
                column,
                step,
                completed,
            } => self.update_task_step(&task, &column, step, completed),
            BoardOp::ReorderTaskSteps {
                task,
                column,
                order,
            } => self.reorder_task_steps(&task, &column, &order),
            BoardOp::AddColumn { title } => {
                self.add_column(title, ids);
                true
            }
            BoardOp::MoveColumn { from, to } => self.move_column(from, to),
            BoardOp::ToggleColumnArchive { column, archived } => {
                self.toggle_column_archive(&column, archived)
            }
        }
    }

    /// Look up a column by id.
    #[must_use]
    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|column| column.id == *id)
    }

    /// Look up a column by id, mutably.
    pub fn column_mut(&mut self, id: &ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|column| column.id == *id)
    }

    /// Look up a task inside a specific column.
    #[must_use]
    pub fn find_task(&self, column: &ColumnId, task: &TaskId) -> Option<&Task> {
        self.column(column)?.tasks.iter().find(|t| t.id == *task)
    }

    /// Find the column id and position of a task anywhere on the board.
    #[must_use]
    pub fn locate_task(&self, task: &TaskId) -> Option<(ColumnId, usize)> {
        self.columns.iter().find_map(|column| {
            column
                .tasks
                .iter()
                .position(|t| t.id == *task)
                .map(|index| (column.id.clone(), index))
        })
    }

    fn find_task_mut(&mut self, column: &ColumnId, task: &TaskId) -> Option<&mut Task> {
        self.column_mut(column)?
            .tasks
            .iter_mut()
            .find(|t| t.id == *task)
    }

    fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|column| column.id == *id)
    }

    /// Move `task` from column `from` to `index` in column `to`.
    ///
    /// When both columns are the same, `index` counts positions after the task
    /// has been taken out. Indices past the end append.
    pub fn move_task(&mut self, task: &TaskId, from: &ColumnId, to: &ColumnId, index: usize) -> bool {
        let (Some(source), Some(target)) = (self.column_index(from), self.column_index(to)) else {
            return false;
        };
        let Some(position) = self.columns[source].tasks.iter().position(|t| t.id == *task) else {
            return false;
        };

        let moved = self.columns[source].tasks.remove(position);
        let tasks = &mut self.columns[target].tasks;
        tasks.insert(index.min(tasks.len()), moved);
        true
    }

    /// Move the task at `from` to `to` within one column.
    pub fn reorder_task(&mut self, column: &ColumnId, from: usize, to: usize) -> bool {
        let Some(column) = self.column_mut(column) else {
            return false;
        };
        if from >= column.tasks.len() {
            return false;
        }
        let moved = column.tasks.remove(from);
        column.tasks.insert(to.min(column.tasks.len()), moved);
        true
    }

    /// Append a task built from `draft` and return its fresh id.
    ///
    /// A blank title becomes [`DEFAULT_TASK_TITLE`].
    pub fn add_task(
        &mut self,
        column: &ColumnId,
        draft: TaskDraft,
        ids: &mut impl IdGenerator,
    ) -> Option<TaskId> {
        let column = self.column_mut(column)?;
        let id = TaskId::generate(ids);
        let mut task = Task::new(id.clone(), DEFAULT_TASK_TITLE);
        draft.write_into(&mut task);
        column.tasks.push(task);
        Some(id)
    }

    /// Replace every field of `task` except its id.
    ///
    /// A blank title in `draft` keeps the current title.
    pub fn edit_task(&mut self, task: &TaskId, column: &ColumnId, draft: TaskDraft) -> bool {
        let Some(task) = self.find_task_mut(column, task) else {
            return false;
        };
        draft.write_into(task);
        true
    }

    /// Apply a partial update to `task`, searching every column.
    pub fn update_task(&mut self, task: &TaskId, patch: TaskPatch) -> bool {
        let Some(found) = self
            .columns
            .iter_mut()
            .flat_map(|column| column.tasks.iter_mut())
            .find(|t| t.id == *task)
        else {
            return false;
        };
        patch.apply_to(found);
        true
    }

    /// Remove `task` from `column`.
    pub fn delete_task(&mut self, task: &TaskId, column: &ColumnId) -> bool {
        let Some(column) = self.column_mut(column) else {
            return false;
        };
        let Some(position) = column.tasks.iter().position(|t| t.id == *task) else {
            return false;
        };
        column.tasks.remove(position);
        true
    }

    /// Set the completion flag of one step.
    pub fn update_task_step(
        &mut self,
        task: &TaskId,
        column: &ColumnId,
        step: usize,
        completed: bool,
    ) -> bool {
        let Some(step) = self
            .find_task_mut(column, task)
            .and_then(|task| task.steps.as_mut())
            .and_then(|steps| steps.get_mut(step))
        else {
            return false;
        };
        step.completed = completed;
        true
    }

    /// Rebuild the step list by picking old positions in `order`.
    ///
    /// Positions past the end are skipped, so leaving a position out of
    /// `order` deletes that step.
    pub fn reorder_task_steps(&mut self, task: &TaskId, column: &ColumnId, order: &[usize]) -> bool {
        let Some(steps) = self
            .find_task_mut(column, task)
            .and_then(|task| task.steps.as_mut())
        else {
            return false;
        };
        let reordered: Vec<_> = order
            .iter()
            .filter_map(|&index| steps.get(index).cloned())
            .collect();
        *steps = reordered;
        true
    }

    /// Append an empty column and return its fresh id.
    ///
    /// The title is folded onto one line; a blank one becomes [`DEFAULT_COLUMN_TITLE`].
    pub fn add_column(&mut self, title: impl Into<String>, ids: &mut impl IdGenerator) -> ColumnId {
        let title = normalize_title(&title.into()).unwrap_or_else(|| DEFAULT_COLUMN_TITLE.to_owned());
        let id = ColumnId::generate(ids);
        self.columns.push(Column::new(id.clone(), title));
        id
    }

    /// Move the column at `from` to `to`; indices past the end append.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.columns.len() {
            return false;
        }
        let moved = self.columns.remove(from);
        self.columns.insert(to.min(self.columns.len()), moved);
        true
    }

    /// Set the archived flag of a column.
    pub fn toggle_column_archive(&mut self, column: &ColumnId, archived: bool) -> bool {
        let Some(column) = self.column_mut(column) else {
            return false;
        };
        column.archived = archived;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SequentialIds;
    use crate::model::{Priority, Step};
    use crate::patch::FieldPatch;

    fn task(id: &str) -> Task {
        Task::new(TaskId::from(id), id.to_uppercase())
    }

    fn column(id: &str, tasks: &[&str]) -> Column {
        let mut column = Column::new(ColumnId::from(id), id.to_uppercase());
        column.tasks = tasks.iter().map(|id| task(id)).collect();
        column
    }

    fn board() -> Board {
        Board {
            title: "B".into(),
            columns: vec![column("a", &["t1", "t2"]), column("b", &["t3"])],
        }
    }

    fn task_ids(board: &Board, column: usize) -> Vec<&str> {
        board.columns[column]
            .tasks
            .iter()
            .map(|t| t.id.as_str())
            .collect()
    }

    fn with_steps(mut board: Board) -> Board {
        board.columns[0].tasks[0].steps = Some(vec![
            Step::new("s0", false),
            Step::new("s1", false),
            Step::new("s2", false),
        ]);
        board
    }

    #[test]
    fn move_task_between_columns() {
        let mut board = board();
        assert!(board.move_task(&"t1".into(), &"a".into(), &"b".into(), 0));
        assert_eq!(task_ids(&board, 0), vec!["t2"]);
        assert_eq!(task_ids(&board, 1), vec!["t1", "t3"]);
    }

    #[test]
    fn move_task_within_column_counts_without_the_task() {
        let mut board = board();
        assert!(board.move_task(&"t1".into(), &"a".into(), &"a".into(), 1));
        assert_eq!(task_ids(&board, 0), vec!["t2", "t1"]);
    }

    #[test]
    fn move_task_past_end_appends() {
        let mut board = board();
        assert!(board.move_task(&"t2".into(), &"a".into(), &"b".into(), 99));
        assert_eq!(task_ids(&board, 1), vec!["t3", "t2"]);
    }

    #[test]
    fn move_task_misses_are_no_ops() {
        let mut board = board();
        assert!(!board.move_task(&"t3".into(), &"a".into(), &"b".into(), 0));
        assert!(!board.move_task(&"t1".into(), &"a".into(), &"zz".into(), 0));
        assert!(!board.move_task(&"t1".into(), &"zz".into(), &"b".into(), 0));
        assert_eq!(board, self::board());
    }

    #[test]
    fn reorder_task_moves_within_column() {
        let mut board = board();
        assert!(board.reorder_task(&"a".into(), 0, 1));
        assert_eq!(task_ids(&board, 0), vec!["t2", "t1"]);
        assert!(!board.reorder_task(&"a".into(), 5, 0));
        assert!(!board.reorder_task(&"zz".into(), 0, 0));
    }

    #[test]
    fn add_task_uses_fresh_id_and_defaults() {
        let mut board = board();
        let mut ids = SequentialIds::new("new");
        let Some(id) = board.add_task(&"b".into(), TaskDraft::default(), &mut ids) else {
            panic!("column b exists");
        };
        assert_eq!(id.as_str(), "new-1");
        let added = &board.columns[1].tasks[1];
        assert_eq!(added.title, DEFAULT_TASK_TITLE);
        assert_eq!(added.steps, None);
        assert!(added.tags.is_empty());

        assert!(board.add_task(&"zz".into(), TaskDraft::titled("x"), &mut ids).is_none());
    }

    #[test]
    fn edit_task_keeps_id() {
        let mut board = board();
        let draft = TaskDraft {
            priority: Some(Priority::High),
            ..TaskDraft::titled("Edited")
        };
        assert!(board.edit_task(&"t3".into(), &"b".into(), draft.clone()));
        let edited = &board.columns[1].tasks[0];
        assert_eq!(edited.id.as_str(), "t3");
        assert_eq!(edited.title, "Edited");
        assert_eq!(edited.priority, Some(Priority::High));

        assert!(!board.edit_task(&"t3".into(), &"a".into(), draft));
    }

    #[test]
    fn update_task_searches_all_columns() {
        let mut board = board();
        let patch = TaskPatch {
            due_date: Some(FieldPatch::Set("soon".into())),
            ..TaskPatch::default()
        };
        assert!(board.update_task(&"t3".into(), patch.clone()));
        assert_eq!(board.columns[1].tasks[0].due_date.as_deref(), Some("soon"));
        assert!(!board.update_task(&"nope".into(), patch));
    }

    #[test]
    fn delete_task_splices() {
        let mut board = board();
        assert!(board.delete_task(&"t1".into(), &"a".into()));
        assert_eq!(task_ids(&board, 0), vec!["t2"]);
        assert!(!board.delete_task(&"t1".into(), &"a".into()));
    }

    #[test]
    fn update_task_step_respects_bounds() {
        let mut board = with_steps(board());
        assert!(board.update_task_step(&"t1".into(), &"a".into(), 2, true));
        let steps = board.columns[0].tasks[0].steps.clone().unwrap_or_default();
        assert!(steps[2].completed);

        let before = board.clone();
        assert!(!board.update_task_step(&"t1".into(), &"a".into(), 3, true));
        assert!(!board.update_task_step(&"t2".into(), &"a".into(), 0, true));
        assert!(!board.update_task_step(&"unknown".into(), &"a".into(), 0, true));
        assert_eq!(board, before);
    }

    #[test]
    fn reorder_task_steps_drops_omitted_indices() {
        let mut board = with_steps(board());
        assert!(board.reorder_task_steps(&"t1".into(), &"a".into(), &[2, 0, 7]));
        let texts: Vec<String> = board.columns[0].tasks[0]
            .steps
            .iter()
            .flatten()
            .map(|step| step.text.clone())
            .collect();
        assert_eq!(texts, vec!["s2", "s0"]);
    }

    #[test]
    fn reorder_task_steps_without_steps_is_no_op() {
        let mut board = board();
        assert!(!board.reorder_task_steps(&"t1".into(), &"a".into(), &[0]));
        assert_eq!(board.columns[0].tasks[0].steps, None);
    }

    #[test]
    fn add_and_move_columns() {
        let mut board = board();
        let mut ids = SequentialIds::new("col");
        let id = board.add_column("Later", &mut ids);
        assert_eq!(id.as_str(), "col-1");
        assert!(board.columns[2].tasks.is_empty());
        assert!(!board.columns[2].archived);

        assert!(board.move_column(2, 0));
        let order: Vec<&str> = board.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["col-1", "a", "b"]);

        assert!(!board.move_column(1, 1));
        assert!(!board.move_column(9, 0));
    }

    #[test]
    fn add_column_never_writes_a_blank_header() {
        let mut board = board();
        let mut ids = SequentialIds::new("col");
        board.add_column("  ", &mut ids);
        board.add_column("Ready\nfor review", &mut ids);
        assert_eq!(board.columns[2].title, DEFAULT_COLUMN_TITLE);
        assert_eq!(board.columns[3].title, "Ready for review");
    }

    #[test]
    fn edit_task_with_blank_title_keeps_the_old_one() {
        let mut board = board();
        assert!(board.edit_task(&"t1".into(), &"a".into(), TaskDraft::titled("")));
        assert_eq!(board.columns[0].tasks[0].title, "T1");

        assert!(board.edit_task(&"t1".into(), &"a".into(), TaskDraft::titled("two\nlines")));
        assert_eq!(board.columns[0].tasks[0].title, "two lines");
    }

    #[test]
    fn update_task_ignores_blank_title() {
        let mut board = board();
        let patch = TaskPatch {
            title: Some(" \n".into()),
            ..TaskPatch::default()
        };
        assert!(board.update_task(&"t2".into(), patch));
        assert_eq!(board.columns[0].tasks[1].title, "T2");
    }

    #[test]
    fn toggle_archive_sets_flag() {
        let mut board = board();
        assert!(board.toggle_column_archive(&"b".into(), true));
        assert!(board.columns[1].archived);
        assert!(!board.toggle_column_archive(&"zz".into(), true));
    }

    #[test]
    fn apply_dispatches_operations() {
        let mut board = board();
        let mut ids = SequentialIds::new("x");
        assert!(board.apply(
            BoardOp::AddTask {
                column: "a".into(),
                draft: TaskDraft::titled("Added"),
            },
            &mut ids,
        ));
        assert!(board.apply(BoardOp::AddColumn { title: "C".into() }, &mut ids));
        assert!(!board.apply(
            BoardOp::DeleteTask {
                task: "missing".into(),
                column: "a".into(),
            },
            &mut ids,
        ));
        assert_eq!(task_ids(&board, 0), vec!["t1", "t2", "x-1"]);
        assert_eq!(board.columns[2].id.as_str(), "x-2");
    }

    #[test]
    fn lookups_find_tasks() {
        let board = board();
        assert_eq!(board.locate_task(&"t3".into()), Some(("b".into(), 0)));
        assert!(board.locate_task(&"nope".into()).is_none());
        assert!(board.find_task(&"a".into(), &"t2".into()).is_some());
        assert!(board.find_task(&"b".into(), &"t2".into()).is_none());
    }
}
