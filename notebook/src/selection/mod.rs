use tracing::trace;

use crate::block::{BlockId, Direction};
use crate::document::Notebook;

/// Which block, if any, currently has UI focus.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    NoSelection,
    Selected(BlockId),
}

impl SelectionState {
    pub fn selected_id(&self) -> Option<&BlockId> {
        match self {
            SelectionState::NoSelection => None,
            SelectionState::Selected(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Escape,
    Other,
}

/// Inputs the presentation layer forwards to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionInput {
    Select(BlockId),
    Deselect,
    Navigate(Direction),
    /// A pointer press anywhere in the page.
    PointerDown { inside_block: bool },
    /// Focus moved to some element in the page.
    FocusIn { inside_block: bool },
    /// A key press; `in_editor` is set when the target is inside an embedded text editor.
    KeyDown { key: Key, in_editor: bool },
}

/// Selection state machine. Never holds an id that is absent from the
/// notebook it was last driven with.
#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    state: SelectionState,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected_id(&self) -> Option<&BlockId> {
        self.state.selected_id()
    }

    pub fn is_selected(&self, id: &BlockId) -> bool {
        self.selected_id() == Some(id)
    }

    pub fn apply(&mut self, input: SelectionInput, notebook: &Notebook) {
        match input {
            SelectionInput::Select(id) => self.select(id, notebook),
            SelectionInput::Deselect => self.deselect(),
            SelectionInput::Navigate(direction) => self.navigate(direction, notebook),
            SelectionInput::PointerDown { inside_block } | SelectionInput::FocusIn { inside_block } => {
                if !inside_block {
                    self.deselect();
                }
            }
            SelectionInput::KeyDown { key, in_editor } => {
                let has_selection = self.selected_id().is_some();
                match key {
                    Key::ArrowDown if !has_selection => self.navigate(Direction::Down, notebook),
                    Key::Escape if !in_editor => self.deselect(),
                    Key::ArrowUp if has_selection && !in_editor => {
                        self.navigate(Direction::Up, notebook)
                    }
                    Key::ArrowDown if !in_editor => self.navigate(Direction::Down, notebook),
                    _ => {}
                }
            }
        }
    }

    /// Select `id`. Ids not present in the notebook are ignored.
    pub fn select(&mut self, id: BlockId, notebook: &Notebook) {
        if notebook.contains(&id) {
            self.transition(SelectionState::Selected(id));
        }
    }

    pub fn deselect(&mut self) {
        self.transition(SelectionState::NoSelection);
    }

    /// Move the selection to the neighbouring block. With nothing selected,
    /// moving down selects the first block.
    pub fn navigate(&mut self, direction: Direction, notebook: &Notebook) {
        let target = match (&self.state, direction) {
            (SelectionState::NoSelection, Direction::Down) => notebook.first_block_id(),
            (SelectionState::NoSelection, Direction::Up) => None,
            (SelectionState::Selected(id), Direction::Up) => notebook.previous_block_id(id),
            (SelectionState::Selected(id), Direction::Down) => notebook.next_block_id(id),
        };
        if let Some(target) = target.cloned() {
            self.transition(SelectionState::Selected(target));
        }
    }

    /// Select a block that was just inserted or duplicated.
    pub fn block_created(&mut self, id: BlockId) {
        self.transition(SelectionState::Selected(id));
    }

    /// Delete a block, moving the selection to its successor (or predecessor)
    /// if it was the selected one. The fallback is resolved before the removal.
    pub fn delete_block(&mut self, notebook: &mut Notebook, id: &BlockId) -> bool {
        let fallback = notebook
            .next_block_id(id)
            .or_else(|| notebook.previous_block_id(id))
            .cloned();
        let was_selected = self.is_selected(id);
        let deleted = notebook.delete_block_by_id(id);
        if deleted && was_selected {
            self.transition(match fallback {
                Some(fallback) => SelectionState::Selected(fallback),
                None => SelectionState::NoSelection,
            });
        }
        deleted
    }

    /// Clear a selection whose block no longer exists.
    pub fn reconcile(&mut self, notebook: &Notebook) {
        if let SelectionState::Selected(id) = &self.state {
            if !notebook.contains(id) {
                self.deselect();
            }
        }
    }

    fn transition(&mut self, next: SelectionState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "selection changed");
            self.state = next;
        }
    }
}
