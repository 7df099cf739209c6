use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use notebook::events::{EventAction, EventCategory, EventLogger, NoopEventLogger};
use notebook::{
    BlockInitializer, BlockType, Direction, Key, Notebook, NotebookSession, SelectionInput,
};

#[derive(Clone, Default)]
struct RecordingLogger {
    events: Arc<Mutex<Vec<String>>>,
    categories: Arc<Mutex<Vec<EventCategory>>>,
}

impl EventLogger for RecordingLogger {
    fn log_view_event(&self, name: &str) {
        self.events.lock().unwrap().push(name.to_string());
    }

    fn log_event(
        &self,
        category: EventCategory,
        _action: EventAction,
        label: &str,
        _props: Option<&serde_json::Value>,
    ) {
        self.events.lock().unwrap().push(label.to_string());
        self.categories.lock().unwrap().push(category);
    }
}

fn session(blocks: Vec<BlockInitializer>) -> NotebookSession {
    NotebookSession::with_logger(Notebook::new(blocks), NoopEventLogger)
}

#[test]
fn add_block_selects_and_renders_markdown() {
    let mut session = session(Vec::new());
    let id = session.add_block(0, BlockType::Markdown, "# Title");
    assert_eq!(session.selected_block_id(), Some(&id));
    assert_eq!(
        session.notebook().block(&id).unwrap().rendered(),
        Some("<h1>Title</h1>\n")
    );

    let query = session.add_block(1, BlockType::Query, "foo");
    assert_eq!(session.selected_block_id(), Some(&query));
    assert!(session.notebook().block(&query).unwrap().output.is_empty());
}

#[test]
fn delete_moves_selection_to_fallback() {
    let mut session = session(vec![BlockInitializer::markdown("# A")]);
    let md = session.blocks()[0].id.clone();
    let query = session.add_block(1, BlockType::Query, "foo");

    session.select_block(md.clone());
    session.delete_block(&md);
    assert_eq!(session.blocks().len(), 1);
    assert_eq!(session.selected_block_id(), Some(&query));

    session.delete_block(&query);
    assert!(session.blocks().is_empty());
    assert!(session.selected_block_id().is_none());
}

#[test]
fn duplicate_selects_copy() {
    let mut session = session(vec![BlockInitializer::markdown("*x*")]);
    let source = session.blocks()[0].id.clone();
    let copy = session.duplicate_block(&source).unwrap();
    assert_eq!(session.selected_block_id(), Some(&copy));
    assert_eq!(session.blocks()[1].id, copy);
    assert_eq!(
        session.notebook().block(&copy).unwrap().rendered(),
        Some("<p><em>x</em></p>\n")
    );
}

#[test]
fn move_block_selection_uses_neighbours() {
    let mut session = session(vec![
        BlockInitializer::markdown("a"),
        BlockInitializer::markdown("b"),
    ]);
    let ids: Vec<_> = session.blocks().iter().map(|b| b.id.clone()).collect();
    session.move_block_selection(&ids[0], Direction::Down);
    assert_eq!(session.selected_block_id(), Some(&ids[1]));
    session.move_block_selection(&ids[1], Direction::Down);
    assert_eq!(session.selected_block_id(), Some(&ids[1]));
    session.move_block_selection(&ids[1], Direction::Up);
    assert_eq!(session.selected_block_id(), Some(&ids[0]));
}

#[test]
fn observer_sees_every_mutation() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut session = session(Vec::new()).on_blocks_change(move |blocks| {
        sink.borrow_mut().push(blocks.len());
    });

    let id = session.add_block(0, BlockType::Query, "foo");
    session.change_block_input(&id, "bar");
    session.run_block(&id);
    session.duplicate_block(&id);
    session.move_block(&id, Direction::Down);
    session.delete_block(&id);

    assert_eq!(*seen.borrow(), vec![1, 1, 1, 2, 2, 1]);
}

#[test]
fn keyboard_input_drives_selection() {
    let mut session = session(vec![
        BlockInitializer::markdown("a"),
        BlockInitializer::query("b"),
    ]);
    let ids: Vec<_> = session.blocks().iter().map(|b| b.id.clone()).collect();
    session.handle_input(SelectionInput::KeyDown {
        key: Key::ArrowDown,
        in_editor: false,
    });
    assert_eq!(session.selected_block_id(), Some(&ids[0]));
    session.handle_input(SelectionInput::PointerDown {
        inside_block: false,
    });
    assert!(session.selected_block_id().is_none());
}

#[test]
fn replace_blocks_discards_notebook_and_selection() {
    let mut session = session(vec![BlockInitializer::markdown("a")]);
    let old = session.blocks()[0].id.clone();
    session.select_block(old.clone());

    session.replace_blocks(vec![
        BlockInitializer::query("x"),
        BlockInitializer::query("y"),
    ]);
    assert_eq!(session.blocks().len(), 2);
    assert!(session.notebook().block(&old).is_none());
    assert!(session.selected_block_id().is_none());
}

#[test]
fn events_are_logged() {
    let logger = RecordingLogger::default();
    let mut session =
        NotebookSession::with_logger(Notebook::new(Vec::new()), logger.clone());
    let id = session.add_block(0, BlockType::Query, "foo");
    session.run_block(&id);
    session.delete_block(&id);
    session.delete_block(&id);

    assert_eq!(
        *logger.events.lock().unwrap(),
        vec![
            "ViewSearchNotebook",
            "SearchNotebookAddBlock",
            "SearchNotebookRunBlock",
            "SearchNotebookDeleteBlock",
        ]
    );
}

#[test]
fn query_runs_are_search_events() {
    let logger = RecordingLogger::default();
    let mut session =
        NotebookSession::with_logger(Notebook::new(Vec::new()), logger.clone());
    let md = session.add_block(0, BlockType::Markdown, "# A");
    let query = session.add_block(1, BlockType::Query, "foo");
    session.run_block(&md);
    session.run_block(&query);

    assert_eq!(
        *logger.categories.lock().unwrap(),
        vec![
            EventCategory::Notebook,
            EventCategory::Notebook,
            EventCategory::Notebook,
            EventCategory::Search,
        ]
    );
}
