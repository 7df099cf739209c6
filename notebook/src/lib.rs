pub mod block;
pub mod document;
pub mod error;
pub mod events;
pub mod executor;
pub mod render;
pub mod selection;
pub mod session;

pub use block::results::{FileMatch, LineMatch, SearchResults};
pub use block::{Block, BlockId, BlockInitializer, BlockOutput, BlockType, Direction, RunOutput};
pub use document::Notebook;
pub use error::ExecutionError;
pub use executor::{Dispatcher, MarkdownRenderer, RunOutcome, RunTicket, RunValue, SearchBackend};
pub use selection::{Key, SelectionCoordinator, SelectionInput, SelectionState};
pub use session::NotebookSession;
