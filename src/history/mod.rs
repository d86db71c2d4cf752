//! History module: the command journal and the cross-view jump list.
//!
//! - `Journal`: bounded undo/redo stacks over `Command`s, with batching
//! - `Jumplist`: cross-view position history for Ctrl+O/Ctrl+I navigation

pub mod command;
pub mod jumplist;


pub use command::{Command, CursorSnapshot, EditOp};
pub use jumplist::{JumpPosition, Jumplist};

use crate::song::Song;

/// Maximum number of commands to keep in the journal
const MAX_HISTORY_SIZE: usize = 100;

/// Result of an undo/redo: whether anything happened, and where the
/// cursor should be restored to.
#[derive(Debug, Clone, Copy, Default)]
pub struct UndoOutcome {
    pub success: bool,
    pub cursor: Option<CursorSnapshot>,
}

/// Undo/redo journal.
///
/// Two stacks bounded at 100 entries (oldest dropped). Executing a new
/// command clears the redo stack. While a batch is open, executed commands
/// are captured into the batch instead of the undo stack; closing the batch
/// pushes a single `Batch` command.
#[derive(Debug, Default)]
pub struct Journal {
    /// Commands that can be undone (most recent at the end)
    undo_stack: Vec<Command>,
    /// Commands that have been undone and can be redone
    redo_stack: Vec<Command>,
    /// Open batch: description + captured commands
    batch: Option<(String, Vec<Command>)>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a command against the model and record it
    pub fn execute(&mut self, mut cmd: Command, song: &mut Song) {
        cmd.execute(song);

        if let Some((_, captured)) = &mut self.batch {
            captured.push(cmd);
            return;
        }

        self.undo_stack.push(cmd);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_HISTORY_SIZE {
            self.undo_stack.remove(0);
        }
    }

    /// Run `f`, capturing every command it executes into one undo unit
    pub fn batch<F>(&mut self, description: &str, song: &mut Song, f: F)
    where
        F: FnOnce(&mut Journal, &mut Song),
    {
        self.batch = Some((description.to_string(), Vec::new()));
        f(self, song);
        let (description, commands) = self.batch.take().unwrap();
        if commands.is_empty() {
            return;
        }
        // Children already executed inside the batch; push without rerunning
        let cursor = commands.first().and_then(|c| c.cursor);
        let mut cmd = Command::new(EditOp::Batch {
            commands,
            description,
        });
        cmd.cursor = cursor;
        self.undo_stack.push(cmd);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_HISTORY_SIZE {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last command.
    ///
    /// Returns `{success: false}` on an empty stack; the UI shows nothing.
    pub fn undo(&mut self, song: &mut Song) -> UndoOutcome {
        match self.undo_stack.pop() {
            Some(mut cmd) => {
                cmd.undo(song);
                let cursor = cmd.cursor;
                self.redo_stack.push(cmd);
                UndoOutcome {
                    success: true,
                    cursor,
                }
            }
            None => UndoOutcome::default(),
        }
    }

    /// Redo the last undone command
    pub fn redo(&mut self, song: &mut Song) -> UndoOutcome {
        match self.redo_stack.pop() {
            Some(mut cmd) => {
                cmd.execute(song);
                let cursor = cmd.cursor;
                self.undo_stack.push(cmd);
                UndoOutcome {
                    success: true,
                    cursor,
                }
            }
            None => UndoOutcome::default(),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Description of the command that would be undone next
    pub fn last_undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|cmd| cmd.description())
    }

    pub fn last_redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|cmd| cmd.description())
    }
}
