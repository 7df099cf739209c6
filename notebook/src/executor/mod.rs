use crate::block::results::SearchResults;
use crate::block::{BlockId, BlockType};
use crate::error::ExecutionError;
use crate::render::CmarkRenderer;

/// Renders markdown input into sanitized HTML.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<String, ExecutionError>;
}

/// Executes a query block's input against a search provider.
pub trait SearchBackend: Send + Sync {
    fn execute(&self, query: &str) -> Result<SearchResults, ExecutionError>;
}

/// Search backend used when none is configured. Every run fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSearch;

impl SearchBackend for UnavailableSearch {
    fn execute(&self, _query: &str) -> Result<SearchResults, ExecutionError> {
        Err(ExecutionError::Unavailable("search".to_string()))
    }
}

/// A captured run request. Carries the generation stamped on the block when
/// the run started so a late completion can be recognized as stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub block_id: BlockId,
    pub block_type: BlockType,
    pub generation: u64,
    pub input: String,
}

/// Successful output of a run, tagged by the block type that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RunValue {
    Rendered(String),
    Results(SearchResults),
}

impl RunValue {
    pub fn block_type(&self) -> BlockType {
        match self {
            RunValue::Rendered(_) => BlockType::Markdown,
            RunValue::Results(_) => BlockType::Query,
        }
    }
}

pub type RunOutcome = Result<RunValue, ExecutionError>;

/// Routes a run to the collaborator for its block type.
pub struct Dispatcher {
    renderer: Box<dyn MarkdownRenderer>,
    search: Box<dyn SearchBackend>,
}

impl Dispatcher {
    pub fn new(renderer: Box<dyn MarkdownRenderer>, search: Box<dyn SearchBackend>) -> Self {
        Dispatcher { renderer, search }
    }

    /// Default renderer with the given search backend.
    pub fn with_search(search: impl SearchBackend + 'static) -> Self {
        Self::new(Box::new(CmarkRenderer::new()), Box::new(search))
    }

    pub fn execute(&self, ticket: &RunTicket) -> RunOutcome {
        match ticket.block_type {
            BlockType::Markdown => self.renderer.render(&ticket.input).map(RunValue::Rendered),
            BlockType::Query => self.search.execute(&ticket.input).map(RunValue::Results),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_search(UnavailableSearch)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
