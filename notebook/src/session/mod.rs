use serde_json::json;

use crate::block::{Block, BlockId, BlockInitializer, BlockType, Direction};
use crate::document::Notebook;
use crate::events::{EventAction, EventCategory, EventLogger, TracingEventLogger};
use crate::executor::{RunOutcome, RunTicket};
use crate::selection::{SelectionCoordinator, SelectionInput};

type BlocksObserver = Box<dyn FnMut(&[Block])>;

/// An editing session: a notebook plus the selection that follows it.
///
/// Each method corresponds to one user intent from the presentation layer.
/// After any change to the blocks the observer (if any) gets the new slice.
pub struct NotebookSession {
    notebook: Notebook,
    selection: SelectionCoordinator,
    logger: Box<dyn EventLogger>,
    on_blocks_change: Option<BlocksObserver>,
}

impl NotebookSession {
    pub fn new(notebook: Notebook) -> Self {
        Self::with_logger(notebook, TracingEventLogger)
    }

    pub fn with_logger(notebook: Notebook, logger: impl EventLogger + 'static) -> Self {
        logger.log_view_event("ViewSearchNotebook");
        NotebookSession {
            notebook,
            selection: SelectionCoordinator::new(),
            logger: Box::new(logger),
            on_blocks_change: None,
        }
    }

    pub fn on_blocks_change(mut self, observer: impl FnMut(&[Block]) + 'static) -> Self {
        self.on_blocks_change = Some(Box::new(observer));
        self
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    pub fn blocks(&self) -> &[Block] {
        self.notebook.blocks()
    }

    pub fn selection(&self) -> &SelectionCoordinator {
        &self.selection
    }

    pub fn selected_block_id(&self) -> Option<&BlockId> {
        self.selection.selected_id()
    }

    /// Throw the current notebook away and start over from `initializers`.
    /// The dispatcher carries over; the selection is cleared.
    pub fn replace_blocks(&mut self, initializers: impl IntoIterator<Item = BlockInitializer>) {
        let old = std::mem::replace(&mut self.notebook, Notebook::new(Vec::new()));
        self.notebook = Notebook::with_dispatcher(initializers, old.into_dispatcher());
        self.selection.deselect();
        self.notify();
    }

    pub fn run_block(&mut self, id: &BlockId) {
        let Some(block_type) = self.notebook.block(id).map(Block::block_type) else {
            return;
        };
        self.notebook.run_block_by_id(id);
        self.log_block_event("SearchNotebookRunBlock", EventAction::Submit, block_type);
        self.notify();
    }

    /// Begin a run whose execution happens elsewhere; see [`Notebook::start_run`].
    pub fn start_run(&mut self, id: &BlockId) -> Option<RunTicket> {
        let ticket = self.notebook.start_run(id)?;
        self.log_block_event("SearchNotebookRunBlock", EventAction::Submit, ticket.block_type);
        self.notify();
        Some(ticket)
    }

    pub fn complete_run(&mut self, ticket: &RunTicket, outcome: RunOutcome) -> bool {
        let applied = self.notebook.complete_run(ticket, outcome);
        if applied {
            self.notify();
        }
        applied
    }

    pub fn change_block_input(&mut self, id: &BlockId, value: impl Into<String>) {
        if self.notebook.contains(id) {
            self.notebook.set_block_input_by_id(id, value);
            self.notify();
        }
    }

    /// Insert a block, render it right away if it is markdown, and select it.
    pub fn add_block(
        &mut self,
        index: usize,
        block_type: BlockType,
        input: impl Into<String>,
    ) -> BlockId {
        let id = self
            .notebook
            .insert_block_at_index(index, block_type, input)
            .id
            .clone();
        if block_type == BlockType::Markdown {
            self.notebook.run_block_by_id(&id);
        }
        self.selection.block_created(id.clone());
        self.log_block_event("SearchNotebookAddBlock", EventAction::Click, block_type);
        self.notify();
        id
    }

    pub fn delete_block(&mut self, id: &BlockId) {
        let Some(block_type) = self.notebook.block(id).map(Block::block_type) else {
            return;
        };
        self.selection.delete_block(&mut self.notebook, id);
        self.log_block_event("SearchNotebookDeleteBlock", EventAction::Click, block_type);
        self.notify();
    }

    pub fn select_block(&mut self, id: BlockId) {
        self.selection.select(id, &self.notebook);
    }

    /// Move the selection from `id` to its neighbour; stays put at either end.
    pub fn move_block_selection(&mut self, id: &BlockId, direction: Direction) {
        let target = match direction {
            Direction::Up => self.notebook.previous_block_id(id),
            Direction::Down => self.notebook.next_block_id(id),
        }
        .cloned();
        if let Some(target) = target {
            self.selection.select(target, &self.notebook);
        }
    }

    pub fn move_block(&mut self, id: &BlockId, direction: Direction) {
        if self.notebook.move_block_by_id(id, direction) {
            self.notify();
        }
    }

    /// Duplicate a block, select the copy, and render it if it is markdown.
    pub fn duplicate_block(&mut self, id: &BlockId) -> Option<BlockId> {
        let copy = self.notebook.duplicate_block_by_id(id)?;
        let (copy_id, block_type) = (copy.id.clone(), copy.block_type());
        self.selection.block_created(copy_id.clone());
        if block_type == BlockType::Markdown {
            self.notebook.run_block_by_id(&copy_id);
        }
        self.log_block_event("SearchNotebookDuplicateBlock", EventAction::Click, block_type);
        self.notify();
        Some(copy_id)
    }

    /// Feed a raw input event to the selection state machine.
    pub fn handle_input(&mut self, input: SelectionInput) {
        self.selection.apply(input, &self.notebook);
    }

    fn log_block_event(&self, label: &str, action: EventAction, block_type: BlockType) {
        let category = match (action, block_type) {
            (EventAction::Submit, BlockType::Query) => EventCategory::Search,
            _ => EventCategory::Notebook,
        };
        let props = json!({ "type": block_type.as_str() });
        self.logger.log_event(category, action, label, Some(&props));
    }

    fn notify(&mut self) {
        self.selection.reconcile(&self.notebook);
        if let Some(observer) = self.on_blocks_change.as_mut() {
            observer(self.notebook.blocks());
        }
    }
}

impl std::fmt::Debug for NotebookSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotebookSession")
            .field("notebook", &self.notebook)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl From<Notebook> for NotebookSession {
    fn from(notebook: Notebook) -> Self {
        Self::new(notebook)
    }
}
