//! One open board document.
//!
//! The session owns the in-memory [`Board`], applies operations to it and hands
//! every resulting document to the [`SaveQueue`].

use kanban_md_core::{
    Board, BoardOp, IdGenerator, ParseError, TaskHeaderStyle, UuidIds, generate, parse_with,
};
use tracing::{debug, warn};

use crate::save_queue::{SaveQueue, SaveStats};

/// Result of [`BoardSession::external_change`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A write of ours is pending or just finished, so the change was ours.
    Ignored,
    /// The board was replaced by the new text.
    Reloaded,
    /// The text did not parse; the error board is installed.
    Failed(ParseError),
}

/// Board state plus its persistence pipeline.
#[derive(Debug)]
pub struct BoardSession<G = UuidIds> {
    board: Board,
    ids: G,
    style: TaskHeaderStyle,
    queue: SaveQueue,
    announced: Option<String>,
}

impl BoardSession<UuidIds> {
    /// Empty session writing through `queue` with `style` headers.
    pub fn new(style: TaskHeaderStyle, queue: SaveQueue) -> Self {
        Self::with_ids(UuidIds, style, queue)
    }
}

impl<G: IdGenerator> BoardSession<G> {
    /// Empty session drawing ids from `ids`.
    pub fn with_ids(ids: G, style: TaskHeaderStyle, queue: SaveQueue) -> Self {
        Self {
            board: Board::default(),
            ids,
            style,
            queue,
            announced: None,
        }
    }

    /// Replace the board with the parsed `text`.
    ///
    /// # Errors
    /// On a parse failure the error board is installed and the error is
    /// returned so the caller can tell the user.
    pub fn load(&mut self, text: &str) -> Result<(), ParseError> {
        match parse_with(text, &mut self.ids) {
            Ok(board) => {
                debug!(columns = board.columns.len(), "board loaded");
                self.board = board;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to parse board document");
                self.board = Board::error_board();
                Err(err)
            }
        }
    }

    /// Current board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Header style used for writes.
    #[must_use]
    pub const fn style(&self) -> TaskHeaderStyle {
        self.style
    }

    /// Apply `op` and queue the regenerated document when it changed anything.
    pub fn apply(&mut self, op: BoardOp) -> bool {
        let name = op.name();
        let applied = self.board.apply(op, &mut self.ids);
        if applied {
            debug!(op = name, "operation applied");
            self.queue.enqueue(generate(&self.board, self.style));
        } else {
            debug!(op = name, "operation target not found");
        }
        applied
    }

    /// React to the document being changed outside the session.
    pub fn external_change(&mut self, text: &str) -> ReloadOutcome {
        if self.queue.is_saving() {
            debug!("ignoring external change while saving");
            return ReloadOutcome::Ignored;
        }
        match self.load(text) {
            Ok(()) => ReloadOutcome::Reloaded,
            Err(err) => ReloadOutcome::Failed(err),
        }
    }

    /// The board, if its structure differs from the last one handed out.
    ///
    /// `force` hands it out regardless, e.g. for a view that was just opened.
    pub fn take_update(&mut self, force: bool) -> Option<&Board> {
        let fingerprint = self.board.fingerprint();
        if !force && self.announced.as_deref() == Some(fingerprint.as_str()) {
            return None;
        }
        self.announced = Some(fingerprint);
        Some(&self.board)
    }

    /// Whether writes of this session are pending or just finished.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.queue.is_saving()
    }

    /// Wait for every queued write.
    pub async fn flush(&self) {
        self.queue.flush().await;
    }

    /// Drain the queue and return the final board with the write counters.
    pub async fn shutdown(self) -> (Board, SaveStats) {
        let stats = self.queue.shutdown().await;
        (self.board, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{DocumentSink, SinkError};
    use kanban_md_core::{ColumnId, ERROR_BOARD_TITLE, SequentialIds, TaskDraft, TaskId};
    use std::future::Future;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MemorySink {
        writes: Arc<Mutex<Vec<String>>>,
    }

    impl DocumentSink for MemorySink {
        fn write(&self, text: String) -> impl Future<Output = Result<(), SinkError>> + Send {
            let writes = Arc::clone(&self.writes);
            async move {
                writes.lock().await.push(text);
                Ok(())
            }
        }
    }

    const DOC: &str = "# Board\n\n## To Do\n\n### Task A\n\n## Done\n\n";

    fn session(sink: &MemorySink, grace: Duration) -> BoardSession<SequentialIds> {
        let queue = SaveQueue::spawn(sink.clone(), grace);
        let mut session = BoardSession::with_ids(SequentialIds::new("s"), TaskHeaderStyle::Title, queue);
        session
            .load(DOC)
            .unwrap_or_else(|err| panic!("fixture must parse: {err}"));
        session
    }

    #[tokio::test]
    async fn applied_operations_are_written() {
        let sink = MemorySink::default();
        let mut session = session(&sink, Duration::ZERO);
        // Parsing drew s-1 (To Do), s-2 (Task A) and s-3 (Done).
        let moved = session.apply(BoardOp::MoveTask {
            task: TaskId::from("s-2"),
            from: ColumnId::from("s-1"),
            to: ColumnId::from("s-3"),
            index: 0,
        });
        assert!(moved);
        session.flush().await;

        let writes = sink.writes.lock().await.clone();
        assert_eq!(writes, vec!["# Board\n\n## To Do\n\n## Done\n\n### Task A\n\n"]);
    }

    #[tokio::test]
    async fn missed_operations_are_not_written() {
        let sink = MemorySink::default();
        let mut session = session(&sink, Duration::ZERO);
        assert!(!session.apply(BoardOp::DeleteTask {
            task: TaskId::from("nope"),
            column: ColumnId::from("s-1"),
        }));
        let (board, stats) = session.shutdown().await;
        assert_eq!(stats, SaveStats::default());
        assert_eq!(board.columns[0].tasks.len(), 1);
        assert!(sink.writes.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn external_changes_are_ignored_while_saving() {
        let sink = MemorySink::default();
        let mut session = session(&sink, Duration::from_millis(100));
        assert!(session.apply(BoardOp::AddTask {
            column: ColumnId::from("s-1"),
            draft: TaskDraft::titled("New"),
        }));

        assert_eq!(session.external_change("# Other\n"), ReloadOutcome::Ignored);
        session.flush().await;
        assert_eq!(session.external_change("# Other\n"), ReloadOutcome::Ignored);

        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(session.external_change("# Other\n"), ReloadOutcome::Reloaded);
        assert_eq!(session.board().title, "Other");
    }

    #[tokio::test]
    async fn updates_are_announced_only_on_structural_change() {
        let sink = MemorySink::default();
        let mut session = session(&sink, Duration::ZERO);
        assert!(session.take_update(false).is_some());
        assert!(session.take_update(false).is_none());
        assert!(session.take_update(true).is_some());

        assert!(session.apply(BoardOp::ToggleColumnArchive {
            column: ColumnId::from("s-3"),
            archived: true,
        }));
        let board = session
            .take_update(false)
            .unwrap_or_else(|| panic!("archive flag changes the fingerprint"));
        assert!(board.columns[1].archived);
        assert!(session.take_update(false).is_none());
    }

    #[tokio::test]
    async fn default_session_uses_fresh_uuids() {
        let queue = SaveQueue::spawn(MemorySink::default(), Duration::ZERO);
        let mut session = BoardSession::new(TaskHeaderStyle::List, queue);
        assert_eq!(session.board(), &Board::default());
        session
            .load(DOC)
            .unwrap_or_else(|err| panic!("fixture must parse: {err}"));

        let board = session.board();
        assert_eq!(board.columns.len(), 2);
        assert_ne!(board.columns[0].id, board.columns[1].id);
        assert_ne!(board.columns[0].title, ERROR_BOARD_TITLE);
        assert_eq!(session.style(), TaskHeaderStyle::List);
    }
}
