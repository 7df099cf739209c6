pub mod results;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::results::SearchResults;
use crate::error::ExecutionError;

/// Opaque block identifier, unique within a notebook and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        BlockId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of block kinds. Wire tags are `md` and `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    #[serde(rename = "md")]
    Markdown,
    #[serde(rename = "query")]
    Query,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Markdown => "md",
            BlockType::Query => "query",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction for moving a block or the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// The persisted shape of a block: no id, no output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInitializer {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub input: String,
}

impl BlockInitializer {
    pub fn new(block_type: BlockType, input: impl Into<String>) -> Self {
        BlockInitializer {
            block_type,
            input: input.into(),
        }
    }

    pub fn markdown(input: impl Into<String>) -> Self {
        Self::new(BlockType::Markdown, input)
    }

    pub fn query(input: impl Into<String>) -> Self {
        Self::new(BlockType::Query, input)
    }
}

/// State of a block's output after a run was started.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum RunOutput<T> {
    Pending,
    Ready(T),
    Failed(ExecutionError),
}

impl<T> RunOutput<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            RunOutput::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RunOutput::Pending)
    }
}

/// Type-specific output slot. `None` until the block is first run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum BlockOutput {
    #[serde(rename = "md")]
    Markdown { rendered: Option<RunOutput<String>> },
    #[serde(rename = "query")]
    Query {
        result: Option<RunOutput<SearchResults>>,
    },
}

impl BlockOutput {
    /// An empty output slot for a block of the given type.
    pub fn empty(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Markdown => BlockOutput::Markdown { rendered: None },
            BlockType::Query => BlockOutput::Query { result: None },
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            BlockOutput::Markdown { .. } => BlockType::Markdown,
            BlockOutput::Query { .. } => BlockType::Query,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BlockOutput::Markdown { rendered } => rendered.is_none(),
            BlockOutput::Query { result } => result.is_none(),
        }
    }
}

/// A single markdown or query unit within a notebook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: BlockId,
    pub input: String,
    #[serde(flatten)]
    pub output: BlockOutput,
    /// Bumped every time a run starts; completions carrying an older value are dropped.
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl Block {
    pub(crate) fn new(block_type: BlockType, input: String) -> Self {
        Block {
            id: BlockId::generate(),
            input,
            output: BlockOutput::empty(block_type),
            generation: 0,
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.output.block_type()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rendered HTML of a markdown block, if its last run succeeded.
    pub fn rendered(&self) -> Option<&str> {
        match &self.output {
            BlockOutput::Markdown { rendered } => {
                rendered.as_ref().and_then(|r| r.ready()).map(String::as_str)
            }
            BlockOutput::Query { .. } => None,
        }
    }

    /// Results of a query block, if its last run succeeded.
    pub fn results(&self) -> Option<&SearchResults> {
        match &self.output {
            BlockOutput::Query { result } => result.as_ref().and_then(|r| r.ready()),
            BlockOutput::Markdown { .. } => None,
        }
    }

    /// The failure recorded by the last run, if any.
    pub fn error(&self) -> Option<&ExecutionError> {
        match &self.output {
            BlockOutput::Markdown {
                rendered: Some(RunOutput::Failed(err)),
            }
            | BlockOutput::Query {
                result: Some(RunOutput::Failed(err)),
            } => Some(err),
            _ => None,
        }
    }

    pub fn to_initializer(&self) -> BlockInitializer {
        BlockInitializer::new(self.block_type(), self.input.clone())
    }
}
