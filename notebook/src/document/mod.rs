use tracing::{debug, warn};

use crate::block::{Block, BlockId, BlockInitializer, BlockOutput, BlockType, Direction, RunOutput};
use crate::executor::{Dispatcher, RunOutcome, RunTicket, RunValue};

/// An ordered, in-memory collection of blocks.
///
/// All structural operations are keyed by block id and are total: an id that
/// is not present turns the call into a no-op (or a `None` result), because
/// callers routinely hold ids across UI event boundaries after the block is gone.
#[derive(Debug)]
pub struct Notebook {
    blocks: Vec<Block>,
    dispatcher: Dispatcher,
}

impl Notebook {
    /// Build a notebook from id-less initializers, using the default dispatcher.
    pub fn new(initializers: impl IntoIterator<Item = BlockInitializer>) -> Self {
        Self::with_dispatcher(initializers, Dispatcher::default())
    }

    pub fn with_dispatcher(
        initializers: impl IntoIterator<Item = BlockInitializer>,
        dispatcher: Dispatcher,
    ) -> Self {
        let blocks = initializers
            .into_iter()
            .map(|init| Block::new(init.block_type, init.input))
            .collect();
        Notebook { blocks, dispatcher }
    }

    /// Current blocks in order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| &block.id == id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| &block.id == id)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn into_dispatcher(self) -> Dispatcher {
        self.dispatcher
    }

    /// The persisted form of the current blocks.
    pub fn initializers(&self) -> Vec<BlockInitializer> {
        self.blocks.iter().map(Block::to_initializer).collect()
    }

    pub fn first_block_id(&self) -> Option<&BlockId> {
        self.blocks.first().map(|block| &block.id)
    }

    pub fn previous_block_id(&self, id: &BlockId) -> Option<&BlockId> {
        let index = self.index_of(id)?;
        index
            .checked_sub(1)
            .and_then(|prev| self.blocks.get(prev))
            .map(|block| &block.id)
    }

    pub fn next_block_id(&self, id: &BlockId) -> Option<&BlockId> {
        let index = self.index_of(id)?;
        self.blocks.get(index + 1).map(|block| &block.id)
    }

    /// Insert a new block at `index`, clamped to `0..=len`.
    pub fn insert_block_at_index(
        &mut self,
        index: usize,
        block_type: BlockType,
        input: impl Into<String>,
    ) -> &Block {
        let index = index.min(self.blocks.len());
        let block = Block::new(block_type, input.into());
        debug!(block = %block.id, %block_type, index, "inserted block");
        self.blocks.insert(index, block);
        &self.blocks[index]
    }

    /// Replace a block's input. Any earlier output is kept until the next run.
    pub fn set_block_input_by_id(&mut self, id: &BlockId, value: impl Into<String>) {
        if let Some(block) = self.blocks.iter_mut().find(|block| &block.id == id) {
            block.input = value.into();
        }
    }

    /// Run a block to completion on the calling thread.
    pub fn run_block_by_id(&mut self, id: &BlockId) {
        let Some(ticket) = self.start_run(id) else {
            return;
        };
        let outcome = self.dispatcher.execute(&ticket);
        self.complete_run(&ticket, outcome);
    }

    /// Begin a run: bump the block's generation, mark its output pending and
    /// hand back a ticket for whoever executes it.
    pub fn start_run(&mut self, id: &BlockId) -> Option<RunTicket> {
        let block = self.blocks.iter_mut().find(|block| &block.id == id)?;
        block.generation += 1;
        match &mut block.output {
            BlockOutput::Markdown { rendered } => *rendered = Some(RunOutput::Pending),
            BlockOutput::Query { result } => *result = Some(RunOutput::Pending),
        }
        Some(RunTicket {
            block_id: block.id.clone(),
            block_type: block.block_type(),
            generation: block.generation,
            input: block.input.clone(),
        })
    }

    /// Write a run's outcome back. Returns `false` when the result was dropped
    /// because the block is gone or a newer run has started since.
    pub fn complete_run(&mut self, ticket: &RunTicket, outcome: RunOutcome) -> bool {
        let Some(block) = self
            .blocks
            .iter_mut()
            .find(|block| block.id == ticket.block_id)
        else {
            debug!(block = %ticket.block_id, "dropping run result for deleted block");
            return false;
        };
        if block.generation != ticket.generation {
            debug!(
                block = %ticket.block_id,
                stale = ticket.generation,
                current = block.generation,
                "dropping stale run result"
            );
            return false;
        }

        match (&mut block.output, outcome) {
            (BlockOutput::Markdown { rendered }, Ok(RunValue::Rendered(html))) => {
                *rendered = Some(RunOutput::Ready(html));
            }
            (BlockOutput::Query { result }, Ok(RunValue::Results(results))) => {
                *result = Some(RunOutput::Ready(results));
            }
            (BlockOutput::Markdown { rendered }, Err(err)) => {
                warn!(block = %ticket.block_id, error = %err, "markdown block run failed");
                *rendered = Some(RunOutput::Failed(err));
            }
            (BlockOutput::Query { result }, Err(err)) => {
                warn!(block = %ticket.block_id, error = %err, "query block run failed");
                *result = Some(RunOutput::Failed(err));
            }
            (output, Ok(value)) => {
                warn!(
                    block = %ticket.block_id,
                    expected = %output.block_type(),
                    got = %value.block_type(),
                    "dropping run result of the wrong block type"
                );
                return false;
            }
        }
        true
    }

    /// Remove a block. Returns whether anything was removed.
    pub fn delete_block_by_id(&mut self, id: &BlockId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.blocks.remove(index);
        debug!(block = %id, index, "deleted block");
        true
    }

    /// Swap a block with its neighbour. No-op at either end of the notebook.
    pub fn move_block_by_id(&mut self, id: &BlockId, direction: Direction) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|&next| next < self.blocks.len()),
        };
        let Some(target) = target else {
            return false;
        };
        self.blocks.swap(index, target);
        debug!(block = %id, from = index, to = target, "moved block");
        true
    }

    /// Insert a copy of a block (same type and input, fresh id, no output)
    /// directly after it.
    pub fn duplicate_block_by_id(&mut self, id: &BlockId) -> Option<&Block> {
        let index = self.index_of(id)?;
        let source = &self.blocks[index];
        let copy = Block::new(source.block_type(), source.input.clone());
        debug!(source = %id, block = %copy.id, "duplicated block");
        self.blocks.insert(index + 1, copy);
        Some(&self.blocks[index + 1])
    }
}
