//! Reversible commands and the undo/redo history.

use crate::elements::Element;

/// Maximum number of undo steps to keep.
pub const MAX_UNDO_HISTORY: usize = 100;

/// An element removed by the eraser, with the index it occupied at removal.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedItem {
    pub index: usize,
    pub element: Element,
}

/// A single reversible mutation of the element sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append one element.
    Add(Element),
    /// Remove a batch of elements; `removed` is sorted ascending by index.
    Erase { removed: Vec<RemovedItem> },
}

impl Command {
    /// Build an erase command, sorting the removed items by original index.
    pub fn erase(mut removed: Vec<RemovedItem>) -> Self {
        removed.sort_by_key(|item| item.index);
        Command::Erase { removed }
    }

    /// Short name for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Erase { .. } => "erase",
        }
    }
}

/// Linear undo/redo over commands.
///
/// The history never touches canvas state. The caller applies or reverses
/// the command it gets back from [`History::undo`] / [`History::redo`].
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Applied commands, most recent last.
    done: Vec<Command>,
    /// Commands available for redo, most recent last.
    undone: Vec<Command>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an applied command. Invalidates any pending redo.
    ///
    /// The oldest command is forgotten once [`MAX_UNDO_HISTORY`] is exceeded.
    pub fn push(&mut self, command: Command) {
        self.done.push(command);
        self.undone.clear();

        if self.done.len() > MAX_UNDO_HISTORY {
            self.done.remove(0);
        }
    }

    /// Move the most recent command to the redo stack and return it.
    pub fn undo(&mut self) -> Option<&Command> {
        let command = self.done.pop()?;
        self.undone.push(command);
        self.undone.last()
    }

    /// Move the most recently undone command back and return it.
    pub fn redo(&mut self) -> Option<&Command> {
        let command = self.undone.pop()?;
        self.done.push(command);
        self.done.last()
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// The command the next undo would reverse.
    pub fn peek_undo(&self) -> Option<&Command> {
        self.done.last()
    }

    pub fn undo_len(&self) -> usize {
        self.done.len()
    }

    pub fn redo_len(&self) -> usize {
        self.undone.len()
    }
}
